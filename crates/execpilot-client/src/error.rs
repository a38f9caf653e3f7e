//! Error types for the orchestration client.

use thiserror::Error;

/// Errors that can occur when talking to the orchestration service.
#[derive(Debug, Error)]
pub enum ClientError {
    /// The client could not be constructed.
    #[error("client configuration error: {0}")]
    Configuration(String),

    /// Transport error (connect, timeout, TLS, ...).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Resource not found.
    #[error("not found: {0}")]
    NotFound(String),

    /// The service answered with a non-success status.
    #[error("service returned {status}: {body}")]
    Status { status: u16, body: String },

    /// Response body did not decode into the expected shape.
    #[error("failed to decode response from {path}: {message}")]
    Decode { path: String, message: String },
}

impl ClientError {
    /// Returns true if the error came from the network rather than the service.
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Http(_))
    }
}
