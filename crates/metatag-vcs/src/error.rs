//! Content store error types.

use std::path::PathBuf;

/// Errors raised by content store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The directory is not a repository checkout.
    #[error("{path} is not a git repository")]
    NotARepository { path: PathBuf },

    /// A `git` invocation exited unsuccessfully.
    #[error("`git {command}` failed in {path}: {stderr}")]
    CommandFailed {
        command: String,
        path: PathBuf,
        stderr: String,
    },

    /// A `git` invocation succeeded but printed something we cannot interpret.
    #[error("unexpected output from `git {command}`: {detail}")]
    UnexpectedOutput { command: String, detail: String },

    /// I/O error (including failure to spawn `git`).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for content store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
