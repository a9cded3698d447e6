//! Error types for the attendance bot Lambda functions.

use thiserror::Error;

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in the attendance bot.
#[derive(Error, Debug)]
pub enum Error {
    /// Caller supplied a value outside the accepted domain (day out of range,
    /// malformed month string, ...)
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// A stored attendance string does not match the month it belongs to
    #[error("Data corruption in {key}: expected {expected} days, found {actual}")]
    DataCorruption {
        key: String,
        expected: usize,
        actual: usize,
    },

    /// Best-effort collaborator (holiday service, profile lookup) failed
    #[error("Upstream unavailable: {0}")]
    UpstreamUnavailable(String),

    /// Key-value store failure
    #[error("Store unavailable: {0}")]
    StoreUnavailable(#[from] sqlx::Error),

    /// AWS SDK error
    #[error("AWS error: {0}")]
    Aws(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

impl Error {
    /// Get HTTP status code for this error.
    pub fn status_code(&self) -> u16 {
        match self {
            Error::InvalidArgument(_) => 400,
            Error::UpstreamUnavailable(_) => 502,
            Error::StoreUnavailable(_) => 503,
            _ => 500,
        }
    }
}
