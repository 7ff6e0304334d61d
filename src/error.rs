use thiserror::Error;

#[derive(Debug, Error)]
pub enum EzCommitError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("No changes detected (staged or unstaged)")]
    EmptyDiff,

    #[error("API error: {0}")]
    Api(String),

    #[error("Git error: {0}")]
    Vcs(#[from] git2::Error),

    #[error("Editor error: {0}")]
    Editor(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl EzCommitError {
    /// Process exit status reported for this error kind.
    pub fn exit_code(&self) -> u8 {
        match self {
            Self::EmptyDiff => 1,
            Self::Vcs(_) => 2,
            Self::Api(_) => 3,
            Self::Config(_) => 4,
            Self::Editor(_) => 5,
            Self::Io(_) => 6,
        }
    }
}

pub type Result<T> = std::result::Result<T, EzCommitError>;
