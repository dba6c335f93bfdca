//! # T-Shirt Studio Renderer
//!
//! Flattens a design scene into a single PNG.
//!
//! ## Pipeline
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │                 Scene                       │
//! ├─────────────────────────────────────────────┤
//! │ ImageLoader: data: URI │ http(s) │ file     │  (concurrent)
//! ├─────────────────────────────────────────────┤
//! │ SVG intermediate: background, images, text  │
//! ├─────────────────────────────────────────────┤
//! │ usvg → resvg/tiny-skia raster → PNG         │  (blocking)
//! └─────────────────────────────────────────────┘
//! ```

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod error;
pub mod export;
pub mod image;
pub mod loader;

pub use crate::error::{RenderError, RenderResult};
pub use crate::export::{
    DesignArtifact, ExportConfig, PreparedExport, SceneExporter, DOWNLOAD_FILE_NAME,
    MAX_OUTPUT_DIMENSION,
};
pub use crate::image::{
    decode_image, encode_data_uri, parse_data_uri, upload_data_uri, ImageFormat, LoadedImage,
};
pub use crate::loader::{ImageLoader, SourceLoader};
