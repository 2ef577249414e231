//! Error types for record handling.

use thiserror::Error;

/// Result type alias for record operations.
pub type SpecResult<T> = Result<T, SpecError>;

/// Errors that can occur while handling site/server/platform records.
#[derive(Error, Debug)]
pub enum SpecError {
    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Invalid value for {field}: {message}")]
    InvalidRecord { field: String, message: String },

    #[error("Record validation failed: {0}")]
    ValidationFailed(String),

    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),
}
