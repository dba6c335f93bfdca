//! Flattening a design to a PNG artifact.
//!
//! The scene is written out as an SVG intermediate representation and
//! rasterized with resvg/tiny-skia. Image sources are loaded concurrently
//! before the SVG is built; sources that fail to load are left out and the
//! export carries on without them.
//!
//! Paint order is fixed: background, then every image in z-order, then every
//! text element in z-order.

use std::fmt::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock};

use futures::future::join_all;
use tshirt_core::element::ElementKind;
use tshirt_core::{Element, Kind, Scene, CANVAS_SIZE};

use crate::error::{RenderError, RenderResult};
use crate::image::{encode_data_uri, LoadedImage};
use crate::loader::{ImageLoader, SourceLoader};

/// File name offered when a design is downloaded.
pub const DOWNLOAD_FILE_NAME: &str = "tshirt-design.png";

/// Default supersampling factor relative to the on-screen canvas.
pub const DEFAULT_SCALE: f32 = 2.0;

/// Largest raster edge the compositor will allocate, in pixels.
pub const MAX_OUTPUT_DIMENSION: u32 = 8192;

/// Configuration for design export.
#[derive(Debug, Clone)]
pub struct ExportConfig {
    /// Output width in pixels; `None` derives it from the canvas width and `scale`.
    pub size: Option<u32>,
    /// Supersampling factor used when `size` is unset.
    pub scale: f32,
    /// Load the system font database for text rendering.
    pub system_fonts: bool,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            size: None,
            scale: DEFAULT_SCALE,
            system_fonts: true,
        }
    }
}

impl ExportConfig {
    /// Config for a fixed output width.
    #[must_use]
    pub fn with_size(size: u32) -> Self {
        Self {
            size: Some(size),
            ..Self::default()
        }
    }

    /// Output pixel dimensions for a scene; height follows the canvas aspect ratio.
    ///
    /// Neither edge exceeds [`MAX_OUTPUT_DIMENSION`]. A canvas too tall for
    /// the requested width is scaled down as a whole, keeping its aspect ratio.
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss, clippy::cast_precision_loss)]
    pub fn output_dimensions(&self, scene: &Scene) -> (u32, u32) {
        let canvas_w = f64::from(positive_or(scene.width, CANVAS_SIZE));
        let canvas_h = f64::from(positive_or(scene.height, CANVAS_SIZE));
        let max = f64::from(MAX_OUTPUT_DIMENSION);

        let out_w = self
            .size
            .unwrap_or_else(|| (canvas_w * f64::from(self.scale)).round() as u32)
            .clamp(1, MAX_OUTPUT_DIMENSION);
        let out_h = f64::from(out_w) * canvas_h / canvas_w;
        if out_h > max {
            let fitted_w = (max * canvas_w / canvas_h).round() as u32;
            return (fitted_w.max(1), MAX_OUTPUT_DIMENSION);
        }
        (out_w, (out_h.round() as u32).max(1))
    }
}

fn positive_or(value: f32, fallback: f32) -> f32 {
    if value.is_finite() && value > 0.0 {
        value
    } else {
        fallback
    }
}

/// The flattened design.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DesignArtifact {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// PNG-encoded bytes.
    pub png: Vec<u8>,
}

impl DesignArtifact {
    /// The artifact as a `data:image/png;base64,...` URI.
    #[must_use]
    pub fn to_data_uri(&self) -> String {
        encode_data_uri("image/png", &self.png)
    }

    /// Write the artifact into `dir` as [`DOWNLOAD_FILE_NAME`].
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub fn save_download(&self, dir: impl AsRef<Path>) -> RenderResult<PathBuf> {
        let path = dir.as_ref().join(DOWNLOAD_FILE_NAME);
        std::fs::write(&path, &self.png)?;
        tracing::info!("Saved design to {}", path.display());
        Ok(path)
    }
}

/// A scene turned into SVG with all image sources resolved, ready to rasterize.
///
/// Rasterization is CPU-bound; callers on an async runtime should run
/// [`PreparedExport::rasterize`] on a blocking thread.
#[derive(Debug, Clone)]
pub struct PreparedExport {
    svg: String,
    width: u32,
    height: u32,
    system_fonts: bool,
    skipped: usize,
}

impl PreparedExport {
    /// The SVG intermediate document.
    #[must_use]
    pub fn svg(&self) -> &str {
        &self.svg
    }

    /// Output pixel dimensions.
    #[must_use]
    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Number of images left out because their source failed to load.
    #[must_use]
    pub fn skipped_images(&self) -> usize {
        self.skipped
    }

    /// Rasterize the SVG and encode it as PNG.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::Export`] if the SVG cannot be parsed, no
    /// surface can be allocated or PNG encoding fails.
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn rasterize(&self) -> RenderResult<DesignArtifact> {
        let mut opt = usvg::Options::default();
        if self.system_fonts {
            opt.fontdb = system_font_database();
        }

        let tree = usvg::Tree::from_str(&self.svg, &opt)
            .map_err(|e| RenderError::Export(format!("SVG parsing failed: {e}")))?;

        let mut pixmap = tiny_skia::Pixmap::new(self.width, self.height)
            .ok_or_else(|| RenderError::Export("Failed to create pixmap".to_string()))?;

        let size = tree.size();
        let transform = tiny_skia::Transform::from_scale(
            self.width as f32 / size.width(),
            self.height as f32 / size.height(),
        );
        resvg::render(&tree, transform, &mut pixmap.as_mut());

        let png = pixmap
            .encode_png()
            .map_err(|e| RenderError::Export(format!("PNG encoding failed: {e}")))?;

        tracing::info!(
            "Flattened design to {}x{} PNG ({} bytes)",
            self.width,
            self.height,
            png.len()
        );

        Ok(DesignArtifact {
            width: self.width,
            height: self.height,
            png,
        })
    }
}

/// Font database shared by every export in the process.
fn system_font_database() -> Arc<usvg::fontdb::Database> {
    static FONTS: OnceLock<Arc<usvg::fontdb::Database>> = OnceLock::new();
    Arc::clone(FONTS.get_or_init(|| {
        let mut db = usvg::fontdb::Database::new();
        db.load_system_fonts();
        tracing::debug!("Loaded {} system font faces", db.len());
        Arc::new(db)
    }))
}

/// Flattens a [`Scene`] into a [`DesignArtifact`].
#[derive(Clone)]
pub struct SceneExporter {
    config: ExportConfig,
    loader: Arc<dyn ImageLoader>,
}

impl std::fmt::Debug for SceneExporter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SceneExporter")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl SceneExporter {
    /// Create an exporter that resolves sources with [`SourceLoader`].
    #[must_use]
    pub fn new(config: ExportConfig) -> Self {
        Self::with_loader(config, Arc::new(SourceLoader::new()))
    }

    /// Create an exporter with a custom image loader.
    #[must_use]
    pub fn with_loader(config: ExportConfig, loader: Arc<dyn ImageLoader>) -> Self {
        Self { config, loader }
    }

    /// Export configuration.
    #[must_use]
    pub fn config(&self) -> &ExportConfig {
        &self.config
    }

    /// Load every image source and build the SVG intermediate.
    ///
    /// All loads run concurrently and are awaited together; results are
    /// matched back to their elements by position, so completion order never
    /// affects paint order. Dropping the returned future cancels pending loads.
    ///
    /// # Errors
    ///
    /// Currently infallible for well-formed scenes; failed loads are skipped.
    pub async fn prepare(&self, scene: &Scene) -> RenderResult<PreparedExport> {
        let images = scene.paint_order(Kind::Image);
        let sources: Vec<&str> = images
            .iter()
            .map(|element| match &element.content {
                ElementKind::Image { src, .. } => src.as_str(),
                ElementKind::Text { .. } => "",
            })
            .collect();
        let results = join_all(sources.iter().map(|src| self.loader.load(src))).await;

        let mut loaded = Vec::with_capacity(images.len());
        let mut skipped = 0;
        for (element, result) in images.into_iter().zip(results) {
            match result {
                Ok(image) => loaded.push((element, image)),
                Err(e) => {
                    skipped += 1;
                    tracing::warn!("Skipping image {}: {e}", element.id);
                }
            }
        }

        let (width, height) = self.config.output_dimensions(scene);
        let svg = build_svg(scene, &loaded, width, height);
        Ok(PreparedExport {
            svg,
            width,
            height,
            system_fonts: self.config.system_fonts,
            skipped,
        })
    }

    /// Load sources, build the SVG and rasterize it in one step.
    ///
    /// # Errors
    ///
    /// Returns an error if rasterization or encoding fails.
    pub async fn flatten(&self, scene: &Scene) -> RenderResult<DesignArtifact> {
        self.prepare(scene).await?.rasterize()
    }
}

fn build_svg(
    scene: &Scene,
    images: &[(&Element, LoadedImage)],
    out_w: u32,
    out_h: u32,
) -> String {
    let view_w = positive_or(scene.width, CANVAS_SIZE);
    let view_h = positive_or(scene.height, CANVAS_SIZE);

    let embedded: usize = images.iter().map(|(_, image)| image.png.len() * 4 / 3).sum();
    let mut svg = String::with_capacity(4096 + embedded);
    let _ = write!(
        svg,
        "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{out_w}\" height=\"{out_h}\" viewBox=\"0 0 {view_w} {view_h}\">",
    );
    let _ = write!(
        svg,
        "<rect x=\"0\" y=\"0\" width=\"{view_w}\" height=\"{view_h}\" fill=\"{}\"/>",
        escape_xml(&scene.canvas_color),
    );

    for (element, image) in images {
        write_image(&mut svg, element, image);
    }
    for element in scene.paint_order(Kind::Text) {
        write_text(&mut svg, element);
    }

    svg.push_str("</svg>");
    svg
}

fn write_image(svg: &mut String, element: &Element, image: &LoadedImage) {
    let ElementKind::Image {
        width,
        height,
        rotation,
        ..
    } = element.content
    else {
        return;
    };
    let (cx, cy) = element.center();
    let _ = write!(
        svg,
        "<g opacity=\"{}\" transform=\"rotate({rotation} {cx} {cy})\">",
        element.effective_opacity(),
    );
    let _ = write!(
        svg,
        "<image x=\"{}\" y=\"{}\" width=\"{width}\" height=\"{height}\" preserveAspectRatio=\"none\" href=\"{}\"/>",
        element.x,
        element.y,
        image.to_data_uri(),
    );
    svg.push_str("</g>");
}

fn write_text(svg: &mut String, element: &Element) {
    let ElementKind::Text {
        text,
        color,
        font,
        size,
        bold,
        italic,
    } = &element.content
    else {
        return;
    };
    if text.is_empty() {
        return;
    }

    let family = escape_xml(&font.replace('\'', ""));
    let weight = if *bold { "bold" } else { "normal" };
    let style = if *italic { "italic" } else { "normal" };
    let baseline = element.y + size;
    let _ = write!(
        svg,
        "<text x=\"{}\" y=\"{baseline}\" opacity=\"{}\" fill=\"{}\" font-family=\"'{family}', sans-serif\" font-size=\"{size}\" font-weight=\"{weight}\" font-style=\"{style}\" xml:space=\"preserve\">{}</text>",
        element.x,
        element.effective_opacity(),
        escape_xml(color),
        escape_xml(text),
    );
}

/// Escape special XML characters.
fn escape_xml(input: &str) -> String {
    input
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}
