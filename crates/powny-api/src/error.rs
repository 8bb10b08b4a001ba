//! Error types for powny-api

/// Result type for powny-api operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors talking to the remote service
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The request never completed (connect failure, timeout)
    #[error("{operation} {target} failed: {source}")]
    Request {
        operation: &'static str,
        target: String,
        #[source]
        source: reqwest::Error,
    },

    /// The service answered with a non-success status
    #[error("{operation} {target} failed: server returned {status}: {body}")]
    Status {
        operation: &'static str,
        target: String,
        status: u16,
        body: String,
    },

    /// The response body did not have the expected shape
    #[error("{operation} {target} failed: undecodable response: {reason}")]
    Decode {
        operation: &'static str,
        target: String,
        reason: String,
    },

    /// The rule store rejected a push made against a stale version
    #[error("push rejected: expected version {expected}, remote is at {}", .actual.as_deref().unwrap_or("unknown"))]
    Conflict {
        expected: String,
        actual: Option<String>,
    },

    /// An identifier that cannot name a resource in a URL path
    #[error("{operation} failed: {segment:?} is not a valid identifier")]
    InvalidSegment {
        operation: &'static str,
        segment: String,
    },

    /// The client could not be built from the given configuration
    #[error("invalid API configuration: {0}")]
    Config(String),
}

impl From<Error> for powny_core::Error {
    fn from(err: Error) -> Self {
        match err {
            Error::Conflict { expected, actual } => Self::VersionConflict { expected, actual },
            Error::Config(message) => Self::Config { message },
            Error::Request {
                operation,
                target,
                source,
            } => Self::Transport {
                operation: operation.to_string(),
                target,
                reason: describe_request_error(&source),
            },
            Error::Status {
                operation,
                target,
                status,
                body,
            } => Self::Transport {
                operation: operation.to_string(),
                target,
                reason: format!("server returned {status}: {body}"),
            },
            Error::InvalidSegment { operation, segment } => Self::Transport {
                operation: operation.to_string(),
                target: format!("{segment:?}"),
                reason: "not a valid identifier".to_string(),
            },
            Error::Decode {
                operation,
                target,
                reason,
            } => Self::Transport {
                operation: operation.to_string(),
                target,
                reason: format!("undecodable response: {reason}"),
            },
        }
    }
}

fn describe_request_error(err: &reqwest::Error) -> String {
    if err.is_timeout() {
        "timed out".to_string()
    } else if err.is_connect() {
        format!("connection failed: {err}")
    } else {
        err.to_string()
    }
}
