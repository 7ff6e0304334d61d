//! Diff → message → confirmation → commit.

use git2::{Oid, Repository};
use tracing::{debug, info};

use crate::error::{EzCommitError, Result};
use crate::git;
use crate::openai::MessageGenerator;

/// Longest subject line that does not trigger a warning.
pub const SUBJECT_LIMIT: usize = 50;

/// What the user wants to do with a proposed message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Commit,
    Edit,
    Regenerate,
    Cancel,
}

/// Terminal interaction used by the workflow.
pub trait Prompter {
    fn show_message(&mut self, message: &str);
    fn warn(&mut self, warning: &str);
    fn decide(&mut self) -> Result<Decision>;
    /// Returns the edited message; may be empty.
    fn edit(&mut self, message: &str) -> Result<String>;
    /// Free-text guidance for regeneration; may be empty.
    fn feedback(&mut self) -> Result<String>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Previewed { message: String },
    Committed { oid: Oid, message: String },
    Aborted,
}

/// Warning text when the subject line is missing or too long.
pub fn subject_warning(message: &str) -> Option<String> {
    let subject = message.lines().next().unwrap_or("").trim();
    if subject.is_empty() {
        return Some("The commit message has an empty first line".to_string());
    }
    let len = subject.chars().count();
    (len > SUBJECT_LIMIT).then(|| {
        format!("First line is {} characters (recommended: {} or fewer)", len, SUBJECT_LIMIT)
    })
}

pub struct CommitWorkflow<'a, P: Prompter> {
    repo: &'a Repository,
    generator: &'a MessageGenerator,
    prompter: P,
    preview: bool,
}

impl<'a, P: Prompter> CommitWorkflow<'a, P> {
    pub fn new(repo: &'a Repository, generator: &'a MessageGenerator, prompter: P) -> Self {
        Self { repo, generator, prompter, preview: false }
    }

    /// Stop after showing the message.
    pub fn preview(mut self, preview: bool) -> Self {
        self.preview = preview;
        self
    }

    pub fn into_prompter(self) -> P {
        self.prompter
    }

    pub async fn run(&mut self) -> Result<Outcome> {
        let diff = git::get_diff(self.repo)?;
        debug!(source = %diff.source, "diff fetched");

        let mut message = self.generator.generate(&diff.text).await?;

        loop {
            self.present(&message);
            if self.preview {
                return Ok(Outcome::Previewed { message });
            }

            match self.prompter.decide()? {
                Decision::Commit => {
                    let oid = git::create_commit(self.repo, &message)?;
                    info!(%oid, "committed");
                    return Ok(Outcome::Committed { oid, message });
                }
                Decision::Cancel => return Ok(Outcome::Aborted),
                Decision::Edit => {
                    let edited = self.prompter.edit(&message)?;
                    if edited.trim().is_empty() {
                        return Err(EzCommitError::Editor(
                            "Commit message cannot be empty".to_string(),
                        ));
                    }
                    message = edited.trim().to_string();
                }
                Decision::Regenerate => {
                    let feedback = self.prompter.feedback()?;
                    message = self.generator.regenerate(&diff.text, &message, &feedback).await?;
                }
            }
        }
    }

    fn present(&mut self, message: &str) {
        self.prompter.show_message(message);
        if let Some(warning) = subject_warning(message) {
            self.prompter.warn(&warning);
        }
    }
}
