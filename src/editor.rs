//! External editor sessions over temporary files.

use std::io::Write;
use std::path::Path;
use std::process::Command;

use tempfile::NamedTempFile;
use tracing::debug;

use crate::error::{EzCommitError, Result};

/// The editor command line: `$EDITOR`, then `$VISUAL`, then a platform default.
pub fn editor_command() -> String {
    std::env::var("EDITOR")
        .or_else(|_| std::env::var("VISUAL"))
        .ok()
        .filter(|e| !e.trim().is_empty())
        .unwrap_or_else(|| (if cfg!(windows) { "notepad" } else { "vim" }).to_string())
}

/// Opens `path` in the user's editor and waits for it to exit.
pub fn open_file(path: &Path) -> Result<()> {
    let command = editor_command();
    let mut parts = command.split_whitespace();
    let program = parts
        .next()
        .ok_or_else(|| EzCommitError::Editor("No editor configured".to_string()))?;

    debug!(editor = %command, path = %path.display(), "launching editor");

    let status = Command::new(program)
        .args(parts)
        .arg(path)
        .status()
        .map_err(|e| EzCommitError::Editor(format!("Failed to open editor '{}': {}", command, e)))?;

    if !status.success() {
        return Err(EzCommitError::Editor(format!(
            "Editor '{}' exited with {}",
            command, status
        )));
    }
    Ok(())
}

/// Lets the user edit `initial` and returns the trimmed result.
///
/// The temporary file is removed when this returns, including when the editor
/// fails.
pub fn edit_text(initial: &str, suffix: &str) -> Result<String> {
    let mut file = tempfile::Builder::new()
        .prefix("ez-commit-")
        .suffix(suffix)
        .tempfile()
        .map_err(io_error)?;
    file.write_all(initial.as_bytes()).map_err(io_error)?;
    file.flush().map_err(io_error)?;

    open_file(file.path())?;
    read_back(&file)
}

fn read_back(file: &NamedTempFile) -> Result<String> {
    let content = std::fs::read_to_string(file.path()).map_err(io_error)?;
    Ok(content.trim().to_string())
}

fn io_error(e: std::io::Error) -> EzCommitError {
    EzCommitError::Editor(format!("File operation error: {}", e))
}
