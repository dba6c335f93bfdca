//! Input validation for untrusted request bodies.
//!
//! Everything that arrives over HTTP is checked here before it reaches the
//! mailer or the compositor.

use serde::Deserialize;
use thiserror::Error;
use tshirt_core::{DeliveryDetails, DesignSubmission, Scene, SubmissionError, UserDetails};
use tshirt_renderer::{parse_data_uri, ExportConfig, ImageFormat};

/// Maximum size of a submitted design data URI.
pub const MAX_DESIGN_IMAGE_LEN: usize = 16 * 1024 * 1024;
/// Maximum elements per exported scene.
pub const MAX_ELEMENTS_PER_SCENE: usize = 10_000;
/// Maximum text content length in elements.
pub const MAX_TEXT_CONTENT_LEN: usize = 1_048_576; // 1MB
/// Maximum export edge in pixels, either dimension.
pub const MAX_EXPORT_SIZE: u32 = 4096;

/// Validation error types.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// One of the three top-level blocks is absent.
    #[error("Missing required fields")]
    MissingFields,
    /// A required contact or delivery field is blank.
    #[error(transparent)]
    Field(#[from] SubmissionError),
    /// The design image is not a base64 PNG data URI.
    #[error("Invalid design image: {0}")]
    InvalidDesignImage(String),
    /// The design image exceeds the size limit.
    #[error("design image too large (max {MAX_DESIGN_IMAGE_LEN} bytes)")]
    DesignImageTooLarge,
    /// Too many elements in scene.
    #[error("too many elements (max {MAX_ELEMENTS_PER_SCENE})")]
    TooManyElements,
    /// Text content exceeds maximum length.
    #[error("text content too long (max {MAX_TEXT_CONTENT_LEN} bytes)")]
    TextContentTooLong,
    /// The scene would flatten to a raster larger than allowed.
    #[error("export size {width}x{height} exceeds {MAX_EXPORT_SIZE} pixels")]
    ExportTooLarge {
        /// Computed output width.
        width: u32,
        /// Computed output height.
        height: u32,
    },
}

impl ValidationError {
    /// Short label used for metrics.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::MissingFields => "missing_fields",
            Self::Field(_) => "field",
            Self::InvalidDesignImage(_) | Self::DesignImageTooLarge => "design_image",
            Self::TooManyElements | Self::TextContentTooLong | Self::ExportTooLarge { .. } => {
                "scene"
            }
        }
    }
}

/// Body of `POST /api/send-design` as received, before validation.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendDesignRequest {
    /// PNG data URI of the flattened design.
    pub design_image: Option<String>,
    /// Customer contact details.
    pub user_details: Option<UserDetails>,
    /// Delivery address.
    pub delivery_details: Option<DeliveryDetails>,
}

/// A submission that passed validation, with the decoded attachment.
#[derive(Debug, Clone)]
pub struct ValidSubmission {
    /// The submission as received.
    pub submission: DesignSubmission,
    /// PNG bytes decoded from the design image.
    pub png: Vec<u8>,
}

impl SendDesignRequest {
    /// Validate the request and decode its attachment.
    ///
    /// Checks run in order: presence of the three blocks, required fields in
    /// form order, then the design image.
    ///
    /// # Errors
    ///
    /// Returns the first [`ValidationError`] encountered.
    pub fn validate(self) -> Result<ValidSubmission, ValidationError> {
        let (Some(design_image), Some(user_details), Some(delivery_details)) =
            (self.design_image, self.user_details, self.delivery_details)
        else {
            return Err(ValidationError::MissingFields);
        };
        if design_image.trim().is_empty() {
            return Err(ValidationError::MissingFields);
        }

        let submission = DesignSubmission {
            design_image,
            user_details,
            delivery_details,
        };
        submission.validate()?;
        let png = validate_design_image(&submission.design_image)?;
        Ok(ValidSubmission { submission, png })
    }
}

/// Decode a design image data URI into PNG bytes.
///
/// # Errors
///
/// Returns [`ValidationError::DesignImageTooLarge`] over the size limit and
/// [`ValidationError::InvalidDesignImage`] unless the URI is a base64 data URI
/// carrying PNG bytes.
pub fn validate_design_image(uri: &str) -> Result<Vec<u8>, ValidationError> {
    if uri.len() > MAX_DESIGN_IMAGE_LEN {
        return Err(ValidationError::DesignImageTooLarge);
    }
    let parsed =
        parse_data_uri(uri).map_err(|e| ValidationError::InvalidDesignImage(e.to_string()))?;
    if !parsed.base64 {
        return Err(ValidationError::InvalidDesignImage(
            "expected base64 encoding".to_string(),
        ));
    }
    if ImageFormat::from_magic_bytes(&parsed.data) != ImageFormat::Png {
        return Err(ValidationError::InvalidDesignImage(
            "payload is not a PNG".to_string(),
        ));
    }
    Ok(parsed.data)
}

/// Check a scene against the export limits for `config`.
///
/// # Errors
///
/// Returns [`ValidationError::TooManyElements`],
/// [`ValidationError::TextContentTooLong`] or
/// [`ValidationError::ExportTooLarge`] when either output edge would exceed
/// [`MAX_EXPORT_SIZE`].
pub fn validate_scene(scene: &Scene, config: &ExportConfig) -> Result<(), ValidationError> {
    if scene.element_count() > MAX_ELEMENTS_PER_SCENE {
        return Err(ValidationError::TooManyElements);
    }
    let oversized = scene.texts().iter().any(|element| {
        matches!(
            &element.content,
            tshirt_core::ElementKind::Text { text, .. } if text.len() > MAX_TEXT_CONTENT_LEN
        )
    });
    if oversized {
        return Err(ValidationError::TextContentTooLong);
    }
    let (width, height) = config.output_dimensions(scene);
    if width > MAX_EXPORT_SIZE || height > MAX_EXPORT_SIZE {
        return Err(ValidationError::ExportTooLarge { width, height });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tshirt_core::Element;
    use tshirt_renderer::encode_data_uri;

    const PNG_MAGIC: [u8; 8] = [0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A];

    fn request() -> SendDesignRequest {
        serde_json::from_value(serde_json::json!({
            "designImage": encode_data_uri("image/png", &PNG_MAGIC),
            "userDetails": {"name": "Ada", "email": "ada@example.com", "phone": "555"},
            "deliveryDetails": {
                "address": "1 Loop Rd", "city": "Springfield", "state": "IL",
                "postalCode": "62701", "country": "USA"
            }
        }))
        .expect("deserialize")
    }

    #[test]
    fn test_valid_request() {
        let valid = request().validate().expect("valid");
        assert_eq!(valid.png, PNG_MAGIC);
        assert_eq!(valid.submission.user_details.name, "Ada");
    }

    #[test]
    fn test_missing_blocks() {
        let mut req = request();
        req.user_details = None;
        assert!(matches!(req.validate(), Err(ValidationError::MissingFields)));

        let req: SendDesignRequest = serde_json::from_str("{}").expect("deserialize");
        assert!(matches!(req.validate(), Err(ValidationError::MissingFields)));

        let mut req = request();
        req.design_image = Some(String::new());
        assert!(matches!(req.validate(), Err(ValidationError::MissingFields)));
    }

    #[test]
    fn test_blank_field_message() {
        let mut req = request();
        if let Some(delivery) = req.delivery_details.as_mut() {
            delivery.city = " ".to_string();
        }
        let err = req.validate().expect_err("blank city");
        assert_eq!(err.to_string(), "City is required");
        assert_eq!(err.kind(), "field");
    }

    #[test]
    fn test_design_image_checks() {
        assert!(validate_design_image("data:image/png;base64,aGVsbG8=").is_err());
        assert!(validate_design_image("data:image/png,%89PNG").is_err());
        assert!(validate_design_image("https://example.com/a.png").is_err());
        assert_eq!(
            validate_design_image(&encode_data_uri("image/png", &PNG_MAGIC)).expect("png"),
            PNG_MAGIC
        );
    }

    #[test]
    fn test_scene_limits() {
        let config = ExportConfig::default();
        let mut scene = Scene::default();
        scene.add_text();
        assert!(validate_scene(&scene, &config).is_ok());

        scene.add_element(Element::text("x".repeat(MAX_TEXT_CONTENT_LEN + 1)));
        assert!(matches!(
            validate_scene(&scene, &config),
            Err(ValidationError::TextContentTooLong)
        ));
    }

    #[test]
    fn test_export_size_limit() {
        let config = ExportConfig::with_size(768);

        let sliver = Scene::from_json(r##"{"canvasColor":"#fff","width":1,"height":1000000}"##)
            .expect("deserialize");
        let err = validate_scene(&sliver, &config).expect_err("too tall");
        assert!(matches!(
            err,
            ValidationError::ExportTooLarge { height, .. } if height > MAX_EXPORT_SIZE
        ));
        assert_eq!(err.kind(), "scene");

        let portrait = Scene::new(384.0, 768.0);
        assert!(validate_scene(&portrait, &config).is_ok());
        let oversized = ExportConfig::with_size(MAX_EXPORT_SIZE + 1);
        assert!(validate_scene(&Scene::default(), &oversized).is_err());
    }
}
