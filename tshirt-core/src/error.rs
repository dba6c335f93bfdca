//! Error types for design model operations.
//!
//! Editing operations never fail: unknown ids and out-of-range geometry are
//! absorbed as no-ops or clamped values. Errors only arise at the edges,
//! when a scene crosses a serialization boundary.

use thiserror::Error;

/// Result type for design model operations.
pub type CanvasResult<T> = Result<T, CanvasError>;

/// Errors that can occur when loading or saving a scene.
#[derive(Debug, Error)]
pub enum CanvasError {
    /// Scene serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Scene decoded but violates a structural requirement.
    #[error("Invalid scene: {0}")]
    InvalidScene(String),
}
