use std::fmt;

use git2::{DiffFormat, DiffOptions, ErrorCode, IndexAddOption, Oid, Repository, Tree};
use tracing::debug;

use crate::error::{EzCommitError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiffSource {
    Staged,
    Unstaged,
}

impl fmt::Display for DiffSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Staged => f.write_str("staged"),
            Self::Unstaged => f.write_str("unstaged"),
        }
    }
}

/// Snapshot of pending changes taken at one moment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diff {
    pub source: DiffSource,
    pub text: String,
}

impl fmt::Display for Diff {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

/// Discovers the repository from `$GIT_DIR` or the current directory.
pub fn open_repository() -> Result<Repository> {
    Ok(Repository::open_from_env()?)
}

/// Staged changes if there are any, else unstaged changes.
pub fn get_diff(repo: &Repository) -> Result<Diff> {
    let staged = staged_diff(repo)?;
    if !staged.trim().is_empty() {
        debug!(bytes = staged.len(), "using staged diff");
        return Ok(Diff { source: DiffSource::Staged, text: staged });
    }

    let unstaged = unstaged_diff(repo)?;
    if !unstaged.trim().is_empty() {
        debug!(bytes = unstaged.len(), "nothing staged, using unstaged diff");
        return Ok(Diff { source: DiffSource::Unstaged, text: unstaged });
    }

    Err(EzCommitError::EmptyDiff)
}

/// HEAD (or the empty tree on an unborn branch) against the index.
pub fn staged_diff(repo: &Repository) -> Result<String> {
    let head = head_tree(repo)?;
    let diff = repo.diff_tree_to_index(head.as_ref(), None, Some(&mut diff_options()))?;
    render_patch(&diff)
}

/// The index against the working tree. Untracked files are not included.
pub fn unstaged_diff(repo: &Repository) -> Result<String> {
    let diff = repo.diff_index_to_workdir(None, Some(&mut diff_options()))?;
    render_patch(&diff)
}

pub fn has_staged_changes(repo: &Repository) -> Result<bool> {
    let head = head_tree(repo)?;
    let diff = repo.diff_tree_to_index(head.as_ref(), None, None)?;
    Ok(diff.deltas().len() > 0)
}

/// Stages additions, modifications and deletions, like `git add -A`.
pub fn stage_all(repo: &Repository) -> Result<()> {
    let mut index = repo.index()?;
    index.add_all(["*"].iter(), IndexAddOption::DEFAULT, None)?;
    index.update_all(["*"].iter(), None)?;
    index.write()?;
    Ok(())
}

/// Records one commit on HEAD, staging everything first when the index holds
/// no changes.
pub fn create_commit(repo: &Repository, message: &str) -> Result<Oid> {
    if !has_staged_changes(repo)? {
        debug!("nothing staged, staging all changes");
        stage_all(repo)?;
    }

    let mut index = repo.index()?;
    let tree_id = index.write_tree()?;
    let tree = repo.find_tree(tree_id)?;
    let signature = repo.signature()?;

    let parent = match repo.head() {
        Ok(head) => Some(head.peel_to_commit()?),
        Err(e) if is_unborn(&e) => None,
        Err(e) => return Err(e.into()),
    };
    let parents: Vec<&git2::Commit> = parent.iter().collect();

    let oid = repo.commit(Some("HEAD"), &signature, &signature, message, &tree, &parents)?;
    debug!(%oid, "created commit");
    Ok(oid)
}

fn head_tree(repo: &Repository) -> Result<Option<Tree<'_>>> {
    match repo.head() {
        Ok(head) => Ok(Some(head.peel_to_tree()?)),
        Err(e) if is_unborn(&e) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

fn is_unborn(e: &git2::Error) -> bool {
    matches!(e.code(), ErrorCode::UnbornBranch | ErrorCode::NotFound)
}

fn diff_options() -> DiffOptions {
    let mut opts = DiffOptions::new();
    opts.context_lines(3);
    opts.id_abbrev(7);
    opts
}

fn render_patch(diff: &git2::Diff<'_>) -> Result<String> {
    let mut text = String::new();
    diff.print(DiffFormat::Patch, |_delta, _hunk, line| {
        let content = String::from_utf8_lossy(line.content());
        match line.origin() {
            origin @ ('+' | '-' | ' ') => {
                text.push(origin);
                text.push_str(&content);
            }
            _ => text.push_str(&content),
        }
        true
    })?;
    Ok(text)
}
