//! Error taxonomy for backend queries.

use crate::domain::DomainError;

use super::time::TimeError;

/// Errors from sending an envelope and reading the reply.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// HTTP request failed (network error, timeout, etc.)
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Endpoint answered with a non-success status code
    #[error("endpoint returned status {status}: {body}")]
    Status { status: u16, body: String },

    /// Body is not valid JSON
    #[error("JSON parse error: {message}{}", .body.as_ref().map(|b| format!(" (body: {b})")).unwrap_or_default())]
    Json {
        message: String,
        body: Option<String>,
    },

    /// Recorded response could not be served
    #[error("fixture error: {message}")]
    Fixture { message: String },

    /// The request limiter was shut down while waiting for a permit
    #[error("request limiter closed")]
    Closed(#[from] tokio::sync::AcquireError),
}

/// Errors surfaced by every client operation.
#[derive(Debug, thiserror::Error)]
pub enum HafasError {
    /// Malformed or contradictory caller input. Nothing was sent.
    #[error("invalid options: {message}")]
    Validation { message: String },

    #[error(transparent)]
    Transport(#[from] TransportError),

    /// The backend reported a failure code.
    #[error("backend error {code}: {message}")]
    Protocol { code: String, message: String },

    /// The response is JSON but lacks an expected field.
    #[error("invalid response: {detail}")]
    Shape { detail: String },

    /// The profile does not offer this operation.
    #[error("{operation} is not supported by this profile")]
    Unsupported { operation: &'static str },
}

impl HafasError {
    pub fn validation(message: impl Into<String>) -> Self {
        HafasError::Validation {
            message: message.into(),
        }
    }

    pub fn shape(detail: impl Into<String>) -> Self {
        HafasError::Shape {
            detail: detail.into(),
        }
    }

    /// Only shape errors are worth retrying; see [`crate::hafas::retry`].
    pub fn is_retryable(&self) -> bool {
        matches!(self, HafasError::Shape { .. })
    }
}

/// Domain constructors reject caller-supplied values (coordinates, ids).
impl From<DomainError> for HafasError {
    fn from(err: DomainError) -> Self {
        HafasError::validation(err.to_string())
    }
}

/// Time tokens only come from responses.
impl From<TimeError> for HafasError {
    fn from(err: TimeError) -> Self {
        HafasError::shape(err.to_string())
    }
}
