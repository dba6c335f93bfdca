//! Image decoding and data URI handling.
//!
//! Every source that reaches the compositor goes through [`decode_image`],
//! which verifies the bytes decode and re-encodes them as PNG so the SVG
//! intermediate only ever embeds one format.

use std::io::Cursor;

use base64::Engine;

use crate::error::{RenderError, RenderResult};

/// Image formats recognised for uploads and sources.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFormat {
    /// PNG with alpha support.
    Png,
    /// JPEG (no alpha).
    Jpeg,
    /// GIF (first frame only).
    Gif,
    /// WebP (alpha support).
    WebP,
    /// Unknown/other format.
    Unknown,
}

impl ImageFormat {
    /// Detect format from file extension.
    #[must_use]
    pub fn from_extension(ext: &str) -> Self {
        match ext.to_ascii_lowercase().as_str() {
            "png" => Self::Png,
            "jpg" | "jpeg" => Self::Jpeg,
            "gif" => Self::Gif,
            "webp" => Self::WebP,
            _ => Self::Unknown,
        }
    }

    /// Detect format from MIME type.
    #[must_use]
    pub fn from_mime(mime: &str) -> Self {
        match mime.trim().to_ascii_lowercase().as_str() {
            "image/png" => Self::Png,
            "image/jpeg" | "image/jpg" => Self::Jpeg,
            "image/gif" => Self::Gif,
            "image/webp" => Self::WebP,
            _ => Self::Unknown,
        }
    }

    /// Detect format from magic bytes.
    #[must_use]
    pub fn from_magic_bytes(data: &[u8]) -> Self {
        if data.starts_with(&[0x89, 0x50, 0x4E, 0x47]) {
            Self::Png
        } else if data.starts_with(&[0xFF, 0xD8, 0xFF]) {
            Self::Jpeg
        } else if data.starts_with(b"GIF8") {
            Self::Gif
        } else if data.len() >= 12 && &data[0..4] == b"RIFF" && &data[8..12] == b"WEBP" {
            Self::WebP
        } else {
            Self::Unknown
        }
    }

    /// MIME type used when re-embedding the raw bytes.
    #[must_use]
    pub fn mime(self) -> &'static str {
        match self {
            Self::Png | Self::Unknown => "image/png",
            Self::Jpeg => "image/jpeg",
            Self::Gif => "image/gif",
            Self::WebP => "image/webp",
        }
    }
}

/// A decoded image source, normalised to PNG.
#[derive(Debug, Clone)]
pub struct LoadedImage {
    /// Intrinsic width in pixels.
    pub width: u32,
    /// Intrinsic height in pixels.
    pub height: u32,
    /// Format the source was supplied in.
    pub format: ImageFormat,
    /// PNG re-encoding of the source.
    pub png: Vec<u8>,
}

impl LoadedImage {
    /// The PNG bytes as a `data:image/png;base64,...` URI.
    #[must_use]
    pub fn to_data_uri(&self) -> String {
        encode_data_uri("image/png", &self.png)
    }
}

/// Decode raw image bytes and re-encode them as PNG.
///
/// # Errors
///
/// Returns [`RenderError::Resource`] if the bytes are not a decodable image.
pub fn decode_image(data: &[u8]) -> RenderResult<LoadedImage> {
    let format = ImageFormat::from_magic_bytes(data);
    let decoded = ::image::load_from_memory(data)
        .map_err(|e| RenderError::Resource(format!("Failed to decode image: {e}")))?;

    let mut png = Vec::new();
    decoded
        .write_to(&mut Cursor::new(&mut png), ::image::ImageFormat::Png)
        .map_err(|e| RenderError::Resource(format!("Failed to re-encode image: {e}")))?;

    Ok(LoadedImage {
        width: decoded.width(),
        height: decoded.height(),
        format,
        png,
    })
}

/// A parsed `data:` URI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataUri {
    /// Declared media type, `text/plain` when omitted.
    pub mime: String,
    /// Whether the payload was base64 encoded.
    pub base64: bool,
    /// Decoded payload.
    pub data: Vec<u8>,
}

/// Parse a `data:` URI, decoding base64 or percent-encoded payloads.
///
/// # Errors
///
/// Returns [`RenderError::Resource`] if the URI is malformed.
pub fn parse_data_uri(uri: &str) -> RenderResult<DataUri> {
    let rest = uri
        .strip_prefix("data:")
        .ok_or_else(|| RenderError::Resource("Not a data URI".to_string()))?;
    let (metadata, payload) = rest
        .split_once(',')
        .ok_or_else(|| RenderError::Resource("Invalid data URI: missing comma".to_string()))?;

    let mut params = metadata.split(';');
    let mime = params
        .next()
        .filter(|m| !m.is_empty())
        .unwrap_or("text/plain")
        .to_string();
    let base64 = params.any(|p| p.eq_ignore_ascii_case("base64"));

    let data = if base64 {
        base64::engine::general_purpose::STANDARD
            .decode(payload.trim())
            .map_err(|e| RenderError::Resource(format!("Failed to decode base64: {e}")))?
    } else {
        percent_decode(payload)?
    };

    Ok(DataUri { mime, base64, data })
}

/// Decode an image embedded in a data URI.
///
/// # Errors
///
/// Returns an error if the URI is malformed or the payload is not an image.
pub fn load_image_from_data_uri(uri: &str) -> RenderResult<LoadedImage> {
    decode_image(&parse_data_uri(uri)?.data)
}

/// Build a base64 data URI.
#[must_use]
pub fn encode_data_uri(mime: &str, data: &[u8]) -> String {
    let encoded = base64::engine::general_purpose::STANDARD.encode(data);
    format!("data:{mime};base64,{encoded}")
}

/// Turn uploaded image bytes into a data URI usable as an image element source.
///
/// The bytes must decode; recognised formats keep their original encoding,
/// anything else is re-encoded as PNG.
///
/// # Errors
///
/// Returns [`RenderError::Resource`] if the upload is not a decodable image.
pub fn upload_data_uri(data: &[u8]) -> RenderResult<String> {
    let loaded = decode_image(data)?;
    tracing::debug!(
        "Accepted {:?} upload ({}x{})",
        loaded.format,
        loaded.width,
        loaded.height
    );
    Ok(match loaded.format {
        ImageFormat::Unknown => loaded.to_data_uri(),
        format => encode_data_uri(format.mime(), data),
    })
}

fn percent_decode(input: &str) -> RenderResult<Vec<u8>> {
    let bytes = input.as_bytes();
    let mut result = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' {
            let byte = input
                .get(i + 1..i + 3)
                .and_then(|hex| u8::from_str_radix(hex, 16).ok())
                .ok_or_else(|| RenderError::Resource("Invalid URL encoding".to_string()))?;
            result.push(byte);
            i += 3;
        } else {
            result.push(bytes[i]);
            i += 1;
        }
    }
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// 1x1 red pixel.
    const PNG_BASE64: &str = "iVBORw0KGgoAAAANSUhEUgAAAAEAAAABCAYAAAAfFcSJAAAADUlEQVR42mP8z8DwHwAFBQIAX8jx0gAAAABJRU5ErkJggg==";

    fn jpeg_bytes() -> Vec<u8> {
        let img = ::image::RgbImage::from_pixel(3, 2, ::image::Rgb([0, 128, 255]));
        let mut out = Vec::new();
        img.write_to(&mut Cursor::new(&mut out), ::image::ImageFormat::Jpeg)
            .expect("encode jpeg");
        out
    }

    #[test]
    fn test_format_detection() {
        assert_eq!(ImageFormat::from_extension("PNG"), ImageFormat::Png);
        assert_eq!(ImageFormat::from_extension("jpeg"), ImageFormat::Jpeg);
        assert_eq!(ImageFormat::from_extension("bmp"), ImageFormat::Unknown);
        assert_eq!(ImageFormat::from_mime("image/webp"), ImageFormat::WebP);
        assert_eq!(
            ImageFormat::from_magic_bytes(b"RIFF\x00\x00\x00\x00WEBP"),
            ImageFormat::WebP
        );
        assert_eq!(ImageFormat::from_magic_bytes(b"GIF89a"), ImageFormat::Gif);
        assert_eq!(ImageFormat::from_magic_bytes(&[1, 2]), ImageFormat::Unknown);
    }

    #[test]
    fn test_data_uri_parsing() {
        let uri = format!("data:image/png;base64,{PNG_BASE64}");
        let parsed = parse_data_uri(&uri).expect("parse");
        assert_eq!(parsed.mime, "image/png");
        assert!(parsed.base64);

        let loaded = load_image_from_data_uri(&uri).expect("decode");
        assert_eq!((loaded.width, loaded.height), (1, 1));
        assert_eq!(loaded.format, ImageFormat::Png);
        assert_eq!(ImageFormat::from_magic_bytes(&loaded.png), ImageFormat::Png);
    }

    #[test]
    fn test_percent_encoded_data_uri() {
        let parsed = parse_data_uri("data:,Hello%2C%20W%C3%B6rld").expect("parse");
        assert_eq!(parsed.mime, "text/plain");
        assert!(!parsed.base64);
        assert_eq!(String::from_utf8(parsed.data).expect("utf8"), "Hello, Wörld");

        assert!(parse_data_uri("data:,bad%2").is_err());
        assert!(parse_data_uri("data:,bad%zz").is_err());
    }

    #[test]
    fn test_invalid_data_uri() {
        assert!(load_image_from_data_uri("not a data uri").is_err());
        assert!(load_image_from_data_uri("data:image/png").is_err());
        assert!(load_image_from_data_uri("data:image/png;base64,!!!").is_err());
        // Valid base64, not an image
        assert!(load_image_from_data_uri("data:image/png;base64,aGVsbG8=").is_err());
    }

    #[test]
    fn test_jpeg_is_reencoded_as_png() {
        let loaded = decode_image(&jpeg_bytes()).expect("decode");
        assert_eq!(loaded.format, ImageFormat::Jpeg);
        assert_eq!((loaded.width, loaded.height), (3, 2));
        assert!(loaded.to_data_uri().starts_with("data:image/png;base64,"));
    }

    #[test]
    fn test_upload_keeps_original_encoding() {
        let jpeg = jpeg_bytes();
        let uri = upload_data_uri(&jpeg).expect("upload");
        assert!(uri.starts_with("data:image/jpeg;base64,"));
        assert_eq!(parse_data_uri(&uri).expect("parse").data, jpeg);

        assert!(upload_data_uri(b"definitely not an image").is_err());
    }
}
