//! Error types for rendering.

use thiserror::Error;

use crate::template::TemplateKey;

/// Result type alias for render operations.
pub type RenderResult<T> = Result<T, RenderError>;

/// Errors that can occur during template resolution and rendering.
///
/// Missing optional context fields are deliberately not represented here:
/// the engine takes the documented fallback branch (the guarded block is
/// omitted) instead of failing the render.
#[derive(Error, Debug)]
pub enum RenderError {
    #[error("No template registered for {0}")]
    UnknownTemplate(TemplateKey),

    #[error("Cyclic template inclusion: {path}")]
    CyclicInclusion { path: String },

    #[error("Cannot encode field '{field}': {reason}")]
    Encoding { field: &'static str, reason: String },
}
