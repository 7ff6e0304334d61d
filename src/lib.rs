//! Generate git commit messages from pending changes with an
//! OpenAI-compatible chat-completion API.

pub mod config;
pub mod editor;
pub mod error;
pub mod git;
pub mod openai;
pub mod ui;
pub mod utils;
pub mod workflow;

pub use error::{EzCommitError, Result};
