//! Error types for powny-cli

/// Result type for CLI operations
pub type Result<T> = std::result::Result<T, CliError>;

/// Errors that can occur in CLI operations
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    /// Error from powny-core
    #[error(transparent)]
    Core(#[from] powny_core::Error),

    /// Error from powny-fs
    #[error(transparent)]
    Fs(#[from] powny_fs::Error),

    /// YAML rendering error
    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),

    /// Invalid combination of arguments
    #[error("{message}")]
    Usage { message: String },
}

impl From<powny_api::Error> for CliError {
    fn from(err: powny_api::Error) -> Self {
        Self::Core(err.into())
    }
}

impl CliError {
    pub fn usage(message: impl Into<String>) -> Self {
        Self::Usage {
            message: message.into(),
        }
    }
}
