//! Error types for the listings client.

use thiserror::Error;

/// Result type for listings client operations.
pub type Result<T> = std::result::Result<T, ListingsError>;

/// Listings API client errors.
///
/// The client performs no retries of its own; callers inspect the HTTP
/// status on [`ListingsError::Api`] to decide whether a call is worth
/// repeating.
#[derive(Debug, Error)]
pub enum ListingsError {
    /// Non-2xx response from the API.
    #[error("listings API error (HTTP {status}): {message}")]
    Api { status: u16, message: String },

    /// Connection failed, timed out, or the request never completed.
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Response body was not the expected JSON shape.
    #[error("parse error: {0}")]
    Parse(#[from] serde_json::Error),
}

impl ListingsError {
    /// HTTP status of an API-level failure, if this is one.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } => Some(*status),
            _ => None,
        }
    }
}
