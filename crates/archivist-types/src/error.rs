//! Shared error types for the archive.

use thiserror::Error;

/// Top-level error type for archive operations.
#[derive(Error, Debug)]
pub enum ArchiveError {
    /// A channel, thread, message or webhook could not be found.
    #[error("{0}")]
    NotFound(String),

    /// Discord answered with a non-success status.
    #[error("Discord API error {status}: {message}")]
    Discord {
        /// HTTP status code.
        status: u16,
        /// Error message from the response body.
        message: String,
    },

    /// Discord rate limited the request.
    #[error("Rate limited by Discord, retry after {retry_after:.1}s")]
    RateLimited {
        /// Seconds to wait before the route accepts requests again.
        retry_after: f64,
    },

    /// A configuration error occurred.
    #[error("Configuration error: {0}")]
    Config(String),

    /// The operation was rejected before reaching Discord.
    #[error("{0}")]
    InvalidInput(String),

    /// The request never produced a response.
    #[error("Network error: {0}")]
    Network(String),

    /// A serialization/deserialization error occurred.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// An I/O error occurred.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<serde_json::Error> for ArchiveError {
    fn from(e: serde_json::Error) -> Self {
        Self::Serialization(e.to_string())
    }
}

/// Alias for Result with ArchiveError.
pub type ArchiveResult<T> = Result<T, ArchiveError>;
