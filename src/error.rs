//! Error types and handling.

use thiserror::Error;

/// Library-wide error type
#[derive(Error, Debug)]
pub enum WatchError {
    /// HTTP request could not be sent or the body could not be read
    #[error("HTTP error: {0}")]
    Transport(#[from] reqwest::Error),

    /// Server answered with a non-success status code
    #[error("Status endpoint returned {status}: {body}")]
    Status { status: u16, body: String },

    /// Response body was not a status report
    #[error("Decode error: {0}")]
    Decode(#[from] serde_json::Error),

    /// URL could not be parsed
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// URL parsed but is not one of our deep links
    #[error("Deep link error: {0}")]
    DeepLink(String),

    /// Configuration error
    #[error("Config error: {0}")]
    Config(String),

    /// File I/O error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Config file serialization error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl WatchError {
    /// Whether a later status check could plausibly succeed
    pub fn is_transient(&self) -> bool {
        match self {
            WatchError::Transport(_) | WatchError::Decode(_) => true,
            WatchError::Status { status, .. } => *status >= 500 || *status == 429,
            _ => false,
        }
    }
}

/// Result type alias using WatchError
pub type Result<T> = std::result::Result<T, WatchError>;
