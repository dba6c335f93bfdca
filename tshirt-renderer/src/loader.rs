//! Resolving image element sources into decoded images.

use std::path::{Path, PathBuf};

use async_trait::async_trait;

use crate::error::{RenderError, RenderResult};
use crate::image::{decode_image, parse_data_uri, LoadedImage};

/// Fetches and decodes the source of an image element.
///
/// Implementations must be cheap to call concurrently; the compositor issues
/// one load per image and joins them before drawing.
#[async_trait]
pub trait ImageLoader: Send + Sync {
    /// Load and decode one source.
    async fn load(&self, src: &str) -> RenderResult<LoadedImage>;
}

/// Default loader: `data:` URIs, `http(s)://` URLs and local file paths.
///
/// [`SourceLoader::data_only`] restricts it to `data:` URIs, for sources
/// supplied by untrusted clients.
#[derive(Debug, Clone, Default)]
pub struct SourceLoader {
    base_dir: Option<PathBuf>,
    data_only: bool,
    #[cfg(feature = "remote")]
    client: reqwest::Client,
}

impl SourceLoader {
    /// Create a loader that resolves relative paths against the working directory.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a loader that accepts only `data:` URIs; file paths and URLs
    /// fail as unavailable resources.
    #[must_use]
    pub fn data_only() -> Self {
        Self {
            data_only: true,
            ..Self::default()
        }
    }

    /// Resolve relative file paths against `dir`.
    #[must_use]
    pub fn with_base_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.base_dir = Some(dir.into());
        self
    }

    fn resolve_path(&self, src: &str) -> PathBuf {
        let src = src.strip_prefix("file://").unwrap_or(src);
        let path = Path::new(src);
        match &self.base_dir {
            Some(base) if path.is_relative() => base.join(path),
            _ => path.to_path_buf(),
        }
    }

    #[cfg(feature = "remote")]
    async fn fetch(&self, url: &str) -> RenderResult<Vec<u8>> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(|e| RenderError::Resource(format!("Failed to fetch {url}: {e}")))?;
        let body = response
            .bytes()
            .await
            .map_err(|e| RenderError::Resource(format!("Failed to read {url}: {e}")))?;
        Ok(body.to_vec())
    }

    #[cfg(not(feature = "remote"))]
    #[allow(clippy::unused_async)]
    async fn fetch(&self, url: &str) -> RenderResult<Vec<u8>> {
        Err(RenderError::Resource(format!(
            "Remote sources are disabled: {url}"
        )))
    }
}

#[async_trait]
impl ImageLoader for SourceLoader {
    async fn load(&self, src: &str) -> RenderResult<LoadedImage> {
        let src = src.trim();
        if src.is_empty() {
            return Err(RenderError::Resource("Empty image source".to_string()));
        }

        let bytes = if src.starts_with("data:") {
            parse_data_uri(src)?.data
        } else if self.data_only {
            return Err(RenderError::Resource(
                "Only data URI image sources are accepted".to_string(),
            ));
        } else if src.starts_with("http://") || src.starts_with("https://") {
            self.fetch(src).await?
        } else {
            tokio::fs::read(self.resolve_path(src)).await?
        };

        decode_image(&bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image::encode_data_uri;

    fn png_bytes() -> Vec<u8> {
        let img = ::image::RgbaImage::from_pixel(2, 2, ::image::Rgba([0, 255, 0, 255]));
        let mut out = Vec::new();
        img.write_to(&mut std::io::Cursor::new(&mut out), ::image::ImageFormat::Png)
            .expect("encode png");
        out
    }

    #[tokio::test]
    async fn test_loads_data_uri() {
        let loader = SourceLoader::new();
        let uri = encode_data_uri("image/png", &png_bytes());
        let loaded = loader.load(&uri).await.expect("load");
        assert_eq!((loaded.width, loaded.height), (2, 2));
    }

    #[tokio::test]
    async fn test_loads_relative_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        std::fs::write(dir.path().join("logo.png"), png_bytes()).expect("write");

        let loader = SourceLoader::new().with_base_dir(dir.path());
        let loaded = loader.load("logo.png").await.expect("load");
        assert_eq!(loaded.width, 2);

        let absolute = dir.path().join("logo.png");
        let loaded = SourceLoader::new()
            .load(&format!("file://{}", absolute.display()))
            .await
            .expect("load file uri");
        assert_eq!(loaded.height, 2);
    }

    #[tokio::test]
    async fn test_missing_and_corrupt_sources_fail() {
        let dir = tempfile::tempdir().expect("tempdir");
        std::fs::write(dir.path().join("junk.png"), b"not a png").expect("write");
        let loader = SourceLoader::new().with_base_dir(dir.path());

        assert!(matches!(
            loader.load("missing.png").await,
            Err(RenderError::Io(_))
        ));
        assert!(matches!(
            loader.load("junk.png").await,
            Err(RenderError::Resource(_))
        ));
        assert!(loader.load("   ").await.is_err());
    }

    #[tokio::test]
    async fn test_data_only_refuses_files() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("logo.png");
        std::fs::write(&path, png_bytes()).expect("write");
        let loader = SourceLoader::data_only().with_base_dir(dir.path());

        for src in [
            "logo.png".to_string(),
            path.display().to_string(),
            format!("file://{}", path.display()),
            "http://127.0.0.1:9/logo.png".to_string(),
        ] {
            assert!(
                matches!(loader.load(&src).await, Err(RenderError::Resource(_))),
                "{src} should be refused"
            );
        }

        let uri = encode_data_uri("image/png", &png_bytes());
        assert_eq!(loader.load(&uri).await.expect("load").width, 2);
    }
}
