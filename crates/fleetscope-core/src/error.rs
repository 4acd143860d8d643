//! Error types for Fleetscope.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    // Bus errors
    #[error("Message bus error: {0}")]
    Bus(String),

    #[error("Request on {subject} timed out")]
    Timeout { subject: String },

    #[error("No responders for {subject}")]
    NoResponders { subject: String },

    // Payload errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    // Setup errors
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // Generic
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Whether this is an expected, non-fatal request outcome.
    ///
    /// Timeouts and missing responders leave state untouched and are retried
    /// by the next scheduled pass rather than surfaced.
    pub fn is_transient(&self) -> bool {
        matches!(self, Error::Timeout { .. } | Error::NoResponders { .. })
    }
}

pub type Result<T> = std::result::Result<T, Error>;

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Serialization(err.to_string())
    }
}
