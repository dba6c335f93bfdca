//! Design elements - the text and image items placed on the canvas.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Smallest font size a text element may have, in pixels.
pub const MIN_FONT_SIZE: f32 = 8.0;

/// Smallest width or height an image element may have, in pixels.
pub const MIN_IMAGE_SIZE: f32 = 50.0;

/// Opacity percentage used when an element has none set.
pub const FULL_OPACITY: u8 = 100;

/// Notional width of a text element's box for clamping and hit testing.
pub const TEXT_BOX_WIDTH: f32 = 50.0;

/// Notional height of a text element's box for clamping and hit testing.
pub const TEXT_BOX_HEIGHT: f32 = 20.0;

/// Font families offered by the editor's font picker.
pub const FONT_CHOICES: [&str; 6] = [
    "Arial",
    "Georgia",
    "Times New Roman",
    "Courier New",
    "Verdana",
    "Comic Sans MS",
];

/// Content of a freshly added text element.
pub const DEFAULT_TEXT: &str = "New Text";
/// Font family of a freshly added text element.
pub const DEFAULT_FONT: &str = "Arial";
/// Fill color of a freshly added text element.
pub const DEFAULT_TEXT_COLOR: &str = "#000000";
/// Font size of a freshly added text element.
pub const DEFAULT_FONT_SIZE: f32 = 24.0;
/// Width and height of a freshly uploaded image element.
pub const DEFAULT_IMAGE_SIZE: f32 = 150.0;
/// Top-left corner of every freshly added element.
pub const DEFAULT_POSITION: (f32, f32) = (100.0, 100.0);

/// Unique identifier for an element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ElementId(Uuid);

impl ElementId {
    /// Create a new unique element ID.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Create from an existing UUID.
    #[must_use]
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

impl Default for ElementId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ElementId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The two element kinds a design can contain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Kind {
    /// A text label.
    Text,
    /// A raster image.
    Image,
}

/// Kind-scoped reference to an element.
///
/// Ids are only unique within their own kind's sequence, so every lookup
/// carries the kind alongside the id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ElementRef {
    /// Which sequence the element lives in.
    pub kind: Kind,
    /// The element's id within that sequence.
    pub id: ElementId,
}

impl ElementRef {
    /// Reference a text element.
    #[must_use]
    pub fn text(id: ElementId) -> Self {
        Self {
            kind: Kind::Text,
            id,
        }
    }

    /// Reference an image element.
    #[must_use]
    pub fn image(id: ElementId) -> Self {
        Self {
            kind: Kind::Image,
            id,
        }
    }
}

impl std::fmt::Display for ElementRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let kind = match self.kind {
            Kind::Text => "text",
            Kind::Image => "image",
        };
        write!(f, "{kind}:{}", self.id)
    }
}

/// Kind-specific content of an element.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ElementKind {
    /// A text label.
    Text {
        /// Text content, may be empty.
        text: String,
        /// Fill color (hex or CSS color name).
        color: String,
        /// Font family name.
        font: String,
        /// Font size in pixels.
        size: f32,
        /// Bold weight.
        #[serde(default)]
        bold: bool,
        /// Italic style.
        #[serde(default)]
        italic: bool,
    },

    /// A raster image.
    Image {
        /// Image source: data URI, URL or file path.
        src: String,
        /// Width in pixels.
        width: f32,
        /// Height in pixels.
        height: f32,
        /// Clockwise rotation in degrees around the box center, in `[0, 360)`.
        #[serde(default)]
        rotation: f32,
    },
}

/// A design element: shared layering fields plus kind-specific content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Element {
    /// Unique identifier within the element's kind.
    #[serde(default)]
    pub id: ElementId,
    /// Left edge in canvas coordinates.
    pub x: f32,
    /// Top edge in canvas coordinates.
    pub y: f32,
    /// Opacity percentage 0-100; `None` means fully opaque.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub opacity: Option<u8>,
    /// Explicit stacking position within the kind; `None` falls back to
    /// the sequence index.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub z_index: Option<i32>,
    /// Locked elements ignore pointer gestures.
    #[serde(default)]
    pub locked: bool,
    /// Kind-specific content.
    #[serde(flatten)]
    pub content: ElementKind,
}

impl Element {
    /// Create an element with the given content at the default position.
    #[must_use]
    pub fn new(content: ElementKind) -> Self {
        Self {
            id: ElementId::new(),
            x: DEFAULT_POSITION.0,
            y: DEFAULT_POSITION.1,
            opacity: None,
            z_index: None,
            locked: false,
            content,
        }
    }

    /// Create a text element with the editor's defaults.
    #[must_use]
    pub fn text(text: impl Into<String>) -> Self {
        Self::new(ElementKind::Text {
            text: text.into(),
            color: DEFAULT_TEXT_COLOR.to_string(),
            font: DEFAULT_FONT.to_string(),
            size: DEFAULT_FONT_SIZE,
            bold: false,
            italic: false,
        })
    }

    /// Create an image element with the editor's defaults.
    #[must_use]
    pub fn image(src: impl Into<String>) -> Self {
        Self::new(ElementKind::Image {
            src: src.into(),
            width: DEFAULT_IMAGE_SIZE,
            height: DEFAULT_IMAGE_SIZE,
            rotation: 0.0,
        })
    }

    /// Set the top-left position.
    #[must_use]
    pub fn at(mut self, x: f32, y: f32) -> Self {
        self.x = x;
        self.y = y;
        self
    }

    /// Set the opacity percentage.
    #[must_use]
    pub fn with_opacity(mut self, opacity: u8) -> Self {
        self.opacity = Some(opacity.min(FULL_OPACITY));
        self
    }

    /// Set an explicit z-index.
    #[must_use]
    pub fn with_z_index(mut self, z_index: i32) -> Self {
        self.z_index = Some(z_index);
        self
    }

    /// Set whether the element is locked.
    #[must_use]
    pub fn with_locked(mut self, locked: bool) -> Self {
        self.locked = locked;
        self
    }

    /// Set the box size of an image element. No effect on text.
    #[must_use]
    pub fn with_size(mut self, w: f32, h: f32) -> Self {
        if let ElementKind::Image { width, height, .. } = &mut self.content {
            *width = w.max(MIN_IMAGE_SIZE);
            *height = h.max(MIN_IMAGE_SIZE);
        }
        self
    }

    /// Set the rotation of an image element. No effect on text.
    #[must_use]
    pub fn with_rotation(mut self, degrees: f32) -> Self {
        if let ElementKind::Image { rotation, .. } = &mut self.content {
            *rotation = normalize_rotation(degrees);
        }
        self
    }

    /// The element's kind.
    #[must_use]
    pub fn kind(&self) -> Kind {
        match self.content {
            ElementKind::Text { .. } => Kind::Text,
            ElementKind::Image { .. } => Kind::Image,
        }
    }

    /// Kind-scoped reference to this element.
    #[must_use]
    pub fn reference(&self) -> ElementRef {
        ElementRef {
            kind: self.kind(),
            id: self.id,
        }
    }

    /// Opacity as a 0.0-1.0 multiplier.
    #[must_use]
    pub fn effective_opacity(&self) -> f32 {
        f32::from(self.opacity.unwrap_or(FULL_OPACITY).min(FULL_OPACITY)) / 100.0
    }

    /// Stacking key: the explicit z-index, or the sequence position.
    #[must_use]
    pub fn effective_z_index(&self, fallback_index: usize) -> i64 {
        self.z_index.map_or_else(
            || i64::try_from(fallback_index).unwrap_or(i64::MAX),
            i64::from,
        )
    }

    /// Width and height used for drag clamping and hit testing.
    ///
    /// Text has no tracked bounding box, so a fixed notional box stands in.
    #[must_use]
    pub fn footprint(&self) -> (f32, f32) {
        match self.content {
            ElementKind::Text { .. } => (TEXT_BOX_WIDTH, TEXT_BOX_HEIGHT),
            ElementKind::Image { width, height, .. } => (width, height),
        }
    }

    /// Rotation in degrees; always zero for text.
    #[must_use]
    pub fn rotation(&self) -> f32 {
        match self.content {
            ElementKind::Text { .. } => 0.0,
            ElementKind::Image { rotation, .. } => rotation,
        }
    }

    /// Center of the element's footprint.
    #[must_use]
    pub fn center(&self) -> (f32, f32) {
        let (w, h) = self.footprint();
        (self.x + w / 2.0, self.y + h / 2.0)
    }

    /// Check if a canvas point lies within the element's footprint,
    /// taking image rotation into account.
    #[must_use]
    pub fn contains_point(&self, x: f32, y: f32) -> bool {
        let (w, h) = self.footprint();
        let (cx, cy) = self.center();
        let (lx, ly) = rotate_about((x, y), (cx, cy), -self.rotation());
        (lx - cx).abs() <= w / 2.0 && (ly - cy).abs() <= h / 2.0
    }

    /// Merge a partial update into this element.
    ///
    /// Values are normalized on the way in: font size and image dimensions are
    /// floored, rotation wraps into `[0, 360)` and opacity is capped at 100.
    /// Fields that do not apply to this element's kind are ignored.
    pub fn apply(&mut self, patch: &ElementPatch) {
        if let Some(x) = patch.x {
            self.x = x;
        }
        if let Some(y) = patch.y {
            self.y = y;
        }
        if let Some(opacity) = patch.opacity {
            self.opacity = Some(opacity.min(FULL_OPACITY));
        }
        if let Some(z_index) = patch.z_index {
            self.z_index = Some(z_index);
        }
        if let Some(locked) = patch.locked {
            self.locked = locked;
        }

        match &mut self.content {
            ElementKind::Text {
                text,
                color,
                font,
                size,
                bold,
                italic,
            } => {
                if let Some(value) = &patch.text {
                    text.clone_from(value);
                }
                if let Some(value) = &patch.color {
                    color.clone_from(value);
                }
                if let Some(value) = &patch.font {
                    font.clone_from(value);
                }
                if let Some(value) = patch.size {
                    *size = value.max(MIN_FONT_SIZE);
                }
                if let Some(value) = patch.bold {
                    *bold = value;
                }
                if let Some(value) = patch.italic {
                    *italic = value;
                }
            }
            ElementKind::Image {
                src,
                width,
                height,
                rotation,
            } => {
                if let Some(value) = &patch.src {
                    src.clone_from(value);
                }
                if let Some(value) = patch.width {
                    *width = value.max(MIN_IMAGE_SIZE);
                }
                if let Some(value) = patch.height {
                    *height = value.max(MIN_IMAGE_SIZE);
                }
                if let Some(value) = patch.rotation {
                    *rotation = normalize_rotation(value);
                }
            }
        }
    }

    /// Bring stored values back into range: the same floors, wrap and cap
    /// that [`Element::apply`] enforces on edits.
    pub fn normalize(&mut self) {
        if let Some(opacity) = self.opacity {
            self.opacity = Some(opacity.min(FULL_OPACITY));
        }
        match &mut self.content {
            ElementKind::Text { size, .. } => *size = size.max(MIN_FONT_SIZE),
            ElementKind::Image {
                width,
                height,
                rotation,
                ..
            } => {
                *width = width.max(MIN_IMAGE_SIZE);
                *height = height.max(MIN_IMAGE_SIZE);
                *rotation = normalize_rotation(*rotation);
            }
        }
    }
}

/// Partial update for an element. `None` fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
#[allow(missing_docs)]
pub struct ElementPatch {
    pub x: Option<f32>,
    pub y: Option<f32>,
    pub opacity: Option<u8>,
    pub z_index: Option<i32>,
    pub locked: Option<bool>,
    pub text: Option<String>,
    pub color: Option<String>,
    pub font: Option<String>,
    pub size: Option<f32>,
    pub bold: Option<bool>,
    pub italic: Option<bool>,
    pub src: Option<String>,
    pub width: Option<f32>,
    pub height: Option<f32>,
    pub rotation: Option<f32>,
}

impl ElementPatch {
    /// Move the top-left corner.
    #[must_use]
    pub fn position(x: f32, y: f32) -> Self {
        Self {
            x: Some(x),
            y: Some(y),
            ..Self::default()
        }
    }

    /// Resize an image box.
    #[must_use]
    pub fn dimensions(width: f32, height: f32) -> Self {
        Self {
            width: Some(width),
            height: Some(height),
            ..Self::default()
        }
    }

    /// Change a text element's font size.
    #[must_use]
    pub fn font_size(size: f32) -> Self {
        Self {
            size: Some(size),
            ..Self::default()
        }
    }

    /// Change an image's rotation.
    #[must_use]
    pub fn rotation(degrees: f32) -> Self {
        Self {
            rotation: Some(degrees),
            ..Self::default()
        }
    }

    /// Set an explicit z-index.
    #[must_use]
    pub fn z_index(z_index: i32) -> Self {
        Self {
            z_index: Some(z_index),
            ..Self::default()
        }
    }

    /// Change the opacity percentage.
    #[must_use]
    pub fn opacity(opacity: u8) -> Self {
        Self {
            opacity: Some(opacity),
            ..Self::default()
        }
    }
}

/// Wrap an angle in degrees into `[0, 360)`.
#[must_use]
pub fn normalize_rotation(degrees: f32) -> f32 {
    if !degrees.is_finite() {
        return 0.0;
    }
    let wrapped = degrees.rem_euclid(360.0);
    // rem_euclid rounds tiny negative inputs up to exactly 360.0
    if wrapped >= 360.0 {
        0.0
    } else {
        wrapped
    }
}

/// Rotate `point` clockwise (screen convention) by `degrees` around `pivot`.
#[must_use]
pub fn rotate_about(point: (f32, f32), pivot: (f32, f32), degrees: f32) -> (f32, f32) {
    if degrees == 0.0 {
        return point;
    }
    let (sin, cos) = degrees.to_radians().sin_cos();
    let dx = point.0 - pivot.0;
    let dy = point.1 - pivot.1;
    (
        pivot.0 + dx * cos - dy * sin,
        pivot.1 + dx * sin + dy * cos,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_effective_opacity_defaults_to_opaque() {
        let element = Element::text("Hello");
        assert!((element.effective_opacity() - 1.0).abs() < f32::EPSILON);

        let faded = Element::text("Hello").with_opacity(25);
        assert!((faded.effective_opacity() - 0.25).abs() < f32::EPSILON);

        let hidden = Element::text("Hello").with_opacity(0);
        assert!(hidden.effective_opacity().abs() < f32::EPSILON);
    }

    #[test]
    fn test_effective_z_index_fallback() {
        let element = Element::image("data:,");
        assert_eq!(element.effective_z_index(3), 3);
        assert_eq!(element.with_z_index(-1).effective_z_index(3), -1);
    }

    #[test]
    fn test_footprint_per_kind() {
        assert_eq!(Element::text("a").footprint(), (50.0, 20.0));
        assert_eq!(
            Element::image("x").with_size(80.0, 60.0).footprint(),
            (80.0, 60.0)
        );
    }

    #[test]
    fn test_patch_floors_and_wraps() {
        let mut image = Element::image("x");
        image.apply(&ElementPatch {
            width: Some(10.0),
            height: Some(70.0),
            rotation: Some(370.0),
            opacity: Some(250),
            ..ElementPatch::default()
        });
        match image.content {
            ElementKind::Image {
                width,
                height,
                rotation,
                ..
            } => {
                assert_eq!(width, MIN_IMAGE_SIZE);
                assert_eq!(height, 70.0);
                assert!((rotation - 10.0).abs() < 1e-4);
            }
            ElementKind::Text { .. } => panic!("expected image"),
        }
        assert_eq!(image.opacity, Some(100));

        let mut text = Element::text("a");
        text.apply(&ElementPatch::font_size(2.0));
        match text.content {
            ElementKind::Text { size, .. } => assert_eq!(size, MIN_FONT_SIZE),
            ElementKind::Image { .. } => panic!("expected text"),
        }
    }

    #[test]
    fn test_patch_ignores_foreign_fields() {
        let mut text = Element::text("a");
        let before = text.clone();
        text.apply(&ElementPatch::rotation(45.0));
        assert_eq!(text, before);
    }

    #[test]
    fn test_normalize_rotation() {
        assert_eq!(normalize_rotation(0.0), 0.0);
        assert_eq!(normalize_rotation(360.0), 0.0);
        assert_eq!(normalize_rotation(-90.0), 270.0);
        assert_eq!(normalize_rotation(725.0), 5.0);
        assert_eq!(normalize_rotation(-1e-7), 0.0);
        assert_eq!(normalize_rotation(f32::NAN), 0.0);
    }

    #[test]
    fn test_contains_point_respects_rotation() {
        // 200x50 bar centered at (200, 125)
        let bar = Element::image("x").at(100.0, 100.0).with_size(200.0, 50.0);
        assert!(bar.contains_point(290.0, 125.0));
        assert!(!bar.contains_point(200.0, 210.0));

        let upright = bar.with_rotation(90.0);
        assert!(!upright.contains_point(290.0, 125.0));
        assert!(upright.contains_point(200.0, 210.0));
    }

    #[test]
    fn test_element_json_shape() {
        let element = Element::text("Hi").with_z_index(2);
        let json = serde_json::to_value(&element).expect("serialize");
        assert_eq!(json["type"], "text");
        assert_eq!(json["zIndex"], 2);
        assert_eq!(json["text"], "Hi");
        assert!(json.get("opacity").is_none());

        let back: Element = serde_json::from_value(json).expect("deserialize");
        assert_eq!(back, element);
    }

    #[test]
    fn test_element_json_defaults() {
        let json = serde_json::json!({
            "type": "image",
            "src": "data:image/png;base64,AAAA",
            "x": 1.0,
            "y": 2.0,
            "width": 60.0,
            "height": 70.0
        });
        let element: Element = serde_json::from_value(json).expect("deserialize");
        assert_eq!(element.kind(), Kind::Image);
        assert!(!element.locked);
        assert_eq!(element.opacity, None);
        assert_eq!(element.rotation(), 0.0);
    }

    #[test]
    fn test_normalize_restores_ranges() {
        let mut image: Element = serde_json::from_value(serde_json::json!({
            "type": "image", "src": "x", "x": 0.0, "y": 0.0,
            "width": 10.0, "height": 400.0, "rotation": 450.0, "opacity": 250
        }))
        .expect("deserialize");
        image.normalize();
        assert_eq!(image.footprint(), (50.0, 400.0));
        assert_eq!(image.rotation(), 90.0);
        assert_eq!(image.opacity, Some(100));

        let mut text = Element::text("tiny");
        if let ElementKind::Text { size, .. } = &mut text.content {
            *size = 2.0;
        }
        text.normalize();
        assert!(matches!(text.content, ElementKind::Text { size, .. } if size == 8.0));
    }
}
