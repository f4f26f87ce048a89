// crates/containership/src/error.rs
// Standardized error types for ContainerShip

use thiserror::Error;

/// Main error type for the ContainerShip library
#[derive(Error, Debug)]
pub enum ContainershipError {
    /// Wrong input identity, rejected before any network call
    #[error("validation error: {0}")]
    Validation(String),

    /// Non-success response from the analysis service
    #[error("transport error: HTTP {status}: {body}")]
    Transport { status: u16, body: String },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("stream failed: {0}")]
    StreamFailed(String),

    #[error("malformed frame: {0}")]
    FrameParse(String),

    #[error("protocol violation: {0}")]
    Protocol(String),

    #[error("index {index} out of range for {len} clauses")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("item {index} failed: {reason}")]
    PerItem { index: usize, reason: String },

    #[error("ingestion cancelled")]
    Cancelled,

    #[error("configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("unknown error: {0}")]
    Other(String),
}

/// Convenience type alias for Result using ContainershipError
pub type Result<T> = std::result::Result<T, ContainershipError>;

impl ContainershipError {
    /// Whether this error ends the current ingestion attempt.
    ///
    /// Frame, protocol and per-item errors are contained by the ingestion
    /// loops and only ever logged.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            ContainershipError::Validation(_)
                | ContainershipError::Transport { .. }
                | ContainershipError::Http(_)
                | ContainershipError::StreamFailed(_)
        )
    }

    /// Convert to user-facing string
    pub fn to_user_string(&self) -> String {
        match self {
            ContainershipError::Transport { status, .. } => {
                format!("analysis service returned HTTP {}", status)
            }
            other => other.to_string(),
        }
    }
}

impl From<String> for ContainershipError {
    fn from(s: String) -> Self {
        ContainershipError::Other(s)
    }
}

impl From<url::ParseError> for ContainershipError {
    fn from(err: url::ParseError) -> Self {
        ContainershipError::Config(format!("invalid URL: {}", err))
    }
}

impl From<tokio::task::JoinError> for ContainershipError {
    fn from(err: tokio::task::JoinError) -> Self {
        if err.is_cancelled() {
            ContainershipError::Cancelled
        } else {
            ContainershipError::Other(err.to_string())
        }
    }
}
