//! Error types for powny-core

use std::path::PathBuf;

use crate::check::RuleLoadError;

/// Result type for powny-core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in powny-core operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The rules path is not a git working directory
    #[error("{path} is not a git repository")]
    NotARepository { path: PathBuf },

    /// The remote advanced since this checkout last synchronized
    #[error(
        "Remote rules changed since last sync (last synced: {}, remote: {remote_version}; changed remotely: {}). Update your checkout or re-run with --force",
        .local_version.as_deref().unwrap_or("never"),
        list_or_none(.remote_changes)
    )]
    SyncConflict {
        local_version: Option<String>,
        remote_version: String,
        remote_changes: Vec<String>,
    },

    /// A push raced with another writer
    #[error(
        "Remote rule set moved during push (expected version {expected}, remote is at {}). Re-run upload to re-check conflicts",
        .actual.as_deref().unwrap_or("an unknown version")
    )]
    VersionConflict {
        expected: String,
        actual: Option<String>,
    },

    /// A single rule failed to load
    #[error(transparent)]
    RuleLoad(#[from] RuleLoadError),

    /// The event payload is not a JSON object
    #[error("Malformed event: {reason}")]
    EventFormat { reason: String },

    /// Network call failed (timeout, connection, non-success status)
    #[error("{operation} {target} failed: {reason}")]
    Transport {
        operation: String,
        target: String,
        reason: String,
    },

    /// Missing or invalid configuration
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// A rule file is not UTF-8 text
    #[error("Rule file {name} is not valid UTF-8")]
    InvalidRuleEncoding { name: String },

    /// Filesystem error from powny-fs
    #[error(transparent)]
    Fs(#[from] powny_fs::Error),

    /// Git error from powny-git
    #[error(transparent)]
    Git(#[from] powny_git::Error),

    /// Standard I/O error
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Whether the operator can resolve this by re-running with fresh state
    /// or `--force`.
    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::SyncConflict { .. } | Self::VersionConflict { .. })
    }

    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }
}

fn list_or_none(names: &[String]) -> String {
    if names.is_empty() {
        "none".to_string()
    } else {
        names.join(", ")
    }
}
