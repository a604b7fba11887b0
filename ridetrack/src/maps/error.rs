//! Error types for mapping service calls.

use thiserror::Error;

/// Errors from the mapping service client.
///
/// Provider error text is carried as a diagnostic only; callers branch on
/// the variant, never on the message.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum MapsError {
    /// The API credential is missing or a placeholder.
    #[error("Mapping service not configured: {0}")]
    Config(String),

    /// Transport or HTTP-level failure.
    #[error("Network error: {0}")]
    Network(String),

    /// The provider found nothing for the request.
    #[error("Not found: {0}")]
    NotFound(String),

    /// The response body could not be understood.
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// The provider answered with a non-OK status.
    #[error("Provider returned {status}: {message}")]
    Provider { status: String, message: String },
}

impl MapsError {
    /// Returns true for failures worth retrying later.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Network(_))
    }
}
