//! Error types for powny-git

use std::path::PathBuf;

/// Result type for powny-git operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in powny-git operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Git error: {0}")]
    Git(#[from] git2::Error),

    #[error("Filesystem error: {0}")]
    Fs(#[from] powny_fs::Error),

    #[error("{path} is not a git repository")]
    NotARepository { path: PathBuf },

    #[error("Repository at {path} has no working directory")]
    Bare { path: PathBuf },

    #[error("Commit '{id}' not found")]
    CommitNotFound { id: String },
}
