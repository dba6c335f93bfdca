//! Renderer error types.

use thiserror::Error;

/// Result type for renderer operations.
pub type RenderResult<T> = Result<T, RenderError>;

/// Errors that can occur while loading sources or flattening a design.
#[derive(Debug, Error)]
pub enum RenderError {
    /// An image source could not be fetched or decoded.
    #[error("Failed to load resource: {0}")]
    Resource(String),

    /// The design could not be rasterized or encoded.
    #[error("Export failed: {0}")]
    Export(String),

    /// Reading a source or writing the artifact failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
