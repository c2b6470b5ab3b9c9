//! Error types for the Bitebox API client.

use thiserror::Error;

use crate::storage::StorageError;

/// Errors that can occur when talking to the Bitebox backend.
#[derive(Debug, Error)]
pub enum ApiError {
    /// No response was received (connection refused, DNS, timeout).
    #[error("Network error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The backend answered with a non-2xx status.
    #[error("HTTP {status}: {body}")]
    Http {
        /// Response status code.
        status: u16,
        /// Raw response body text.
        body: String,
    },

    /// The response body did not have the expected shape.
    #[error("Unexpected response: {0}")]
    Decode(String),

    /// JSON parsing failed.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// The call needs a signed-in user and there is none.
    #[error("Not logged in")]
    NotSignedIn,

    /// A lookup against the catalog found nothing.
    #[error("{0} not found")]
    NotFound(&'static str),

    /// Session storage could not be read or written.
    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl ApiError {
    /// HTTP status of the failure, if the backend answered.
    #[must_use]
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::Http { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Whether the backend rejected the credentials.
    #[must_use]
    pub const fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Http { status: 401, .. })
    }

    pub(crate) fn decode(what: impl Into<String>) -> Self {
        Self::Decode(what.into())
    }
}
