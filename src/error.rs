// error.rs - Error types for the backend client, storage and configuration
use std::time::Duration;
use thiserror::Error;

/// Generic text shown for every failure that is not a non-success HTTP status.
pub const GENERIC_FAILURE_MESSAGE: &str = "An error occurred. Please try again later.";

#[derive(Error, Debug)]
pub enum ApiError {
    /// Server answered with a non-2xx status
    #[error("Error {status}: {reason}")]
    Status { status: u16, reason: String },
    #[error("{0}")]
    Transport(#[from] reqwest::Error),
    #[error("request timed out after {}s", .0.as_secs())]
    TimedOut(Duration),
    #[error("invalid backend url: {0}")]
    InvalidUrl(String),
}

impl ApiError {
    /// Text for the summary result area. Only status failures carry their
    /// code and reason through to the user.
    pub fn user_message(&self) -> String {
        match self {
            ApiError::Status { .. } => self.to_string(),
            _ => GENERIC_FAILURE_MESSAGE.to_string(),
        }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Status { status, .. } => Some(*status),
            ApiError::Transport(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Storage I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("invalid value '{value}' for {var}")]
    Invalid { var: &'static str, value: String },
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown language tag '{0}'")]
pub struct UnknownLanguage(pub String);
