//! Core domain errors.

use thiserror::Error;

/// Core domain errors for execpilot.
#[derive(Debug, Error)]
pub enum CoreError {
    /// A status string outside the known set.
    #[error("Unknown execution status: {0}")]
    UnknownStatus(String),

    /// A definition is missing a required field or has the wrong shape.
    #[error("Invalid definition: {0}")]
    InvalidDefinition(String),

    /// Tool call arguments could not be decoded.
    #[error("Invalid tool arguments: {0}")]
    InvalidArguments(String),

    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
