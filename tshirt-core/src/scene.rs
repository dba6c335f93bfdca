//! Scene store: the ordered text and image sequences of one design.

use serde::{Deserialize, Serialize};

use crate::element::{Element, ElementPatch, ElementRef, Kind};
use crate::{CanvasError, CanvasResult};

/// Width and height of the on-screen design canvas in pixels.
pub const CANVAS_SIZE: f32 = 384.0;

/// Background color of a new design.
pub const DEFAULT_CANVAS_COLOR: &str = "#FFFFFF";

/// Direction for moving an element within its kind's stacking order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LayerMove {
    /// Swap with the element directly above.
    Forward,
    /// Swap with the element directly below.
    Backward,
    /// Move to the top of the stack.
    ToFront,
    /// Move to the bottom of the stack.
    ToBack,
}

/// A design: two independent element sequences, selection and background.
///
/// Sequence order is the default stacking order, first element at the bottom.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Scene {
    /// Text elements, bottom to top.
    texts: Vec<Element>,
    /// Image elements, bottom to top.
    images: Vec<Element>,
    /// Currently selected element.
    selected: Option<ElementRef>,
    /// Background fill color.
    pub canvas_color: String,
    /// Canvas width in pixels.
    pub width: f32,
    /// Canvas height in pixels.
    pub height: f32,
}

impl Scene {
    /// Create an empty scene with the given canvas size.
    #[must_use]
    pub fn new(width: f32, height: f32) -> Self {
        Self {
            texts: Vec::new(),
            images: Vec::new(),
            selected: None,
            canvas_color: DEFAULT_CANVAS_COLOR.to_string(),
            width,
            height,
        }
    }

    /// Append an element to the top of its kind's stack and select it.
    ///
    /// The caller must supply an id that is fresh within the kind; a duplicate
    /// is rejected without touching the scene.
    pub fn add_element(&mut self, element: Element) -> ElementRef {
        let reference = element.reference();
        let sequence = self.sequence_mut(reference.kind);
        if sequence.iter().any(|e| e.id == reference.id) {
            tracing::warn!("Ignoring add of duplicate element {reference}");
            return reference;
        }
        sequence.push(element);
        self.selected = Some(reference);
        tracing::debug!("Added element {reference}");
        reference
    }

    /// Add a default text element ("New Text") and select it.
    pub fn add_text(&mut self) -> ElementRef {
        self.add_element(Element::text(crate::element::DEFAULT_TEXT))
    }

    /// Add a default image element for an uploaded source and select it.
    pub fn add_image(&mut self, src: impl Into<String>) -> ElementRef {
        self.add_element(Element::image(src))
    }

    /// Get an element.
    #[must_use]
    pub fn get(&self, reference: ElementRef) -> Option<&Element> {
        self.sequence(reference.kind)
            .iter()
            .find(|e| e.id == reference.id)
    }

    /// Get a mutable element.
    pub fn get_mut(&mut self, reference: ElementRef) -> Option<&mut Element> {
        self.sequence_mut(reference.kind)
            .iter_mut()
            .find(|e| e.id == reference.id)
    }

    /// Merge a partial update into an element without moving it in the stack.
    ///
    /// Returns `false` if the element does not exist.
    pub fn update(&mut self, reference: ElementRef, patch: &ElementPatch) -> bool {
        match self.get_mut(reference) {
            Some(element) => {
                element.apply(patch);
                true
            }
            None => false,
        }
    }

    /// Remove an element, clearing the selection if it was selected.
    pub fn remove(&mut self, reference: ElementRef) -> Option<Element> {
        let sequence = self.sequence_mut(reference.kind);
        let index = sequence.iter().position(|e| e.id == reference.id)?;
        let removed = sequence.remove(index);
        if self.selected == Some(reference) {
            self.selected = None;
        }
        tracing::debug!("Removed element {reference}");
        Some(removed)
    }

    /// Move an element within its kind's stacking order.
    ///
    /// Returns `true` if the order changed; moves past either end are no-ops.
    pub fn reorder(&mut self, reference: ElementRef, direction: LayerMove) -> bool {
        let sequence = self.sequence_mut(reference.kind);
        let Some(index) = sequence.iter().position(|e| e.id == reference.id) else {
            return false;
        };
        let changed = reorder_sequence(sequence, index, direction);
        if changed {
            tracing::debug!("Reordered {reference} {direction:?}");
        }
        changed
    }

    /// Flip an element's lock. Returns the new state, or `None` if missing.
    ///
    /// An in-flight gesture on the element is left to the interaction state
    /// machine, which cancels it on the next pointer event.
    pub fn toggle_lock(&mut self, reference: ElementRef) -> Option<bool> {
        let element = self.get_mut(reference)?;
        element.locked = !element.locked;
        Some(element.locked)
    }

    /// Set the current selection. Callers pass only existing elements or `None`.
    pub fn select(&mut self, reference: Option<ElementRef>) {
        self.selected = reference;
    }

    /// The currently selected element reference.
    #[must_use]
    pub fn selected(&self) -> Option<ElementRef> {
        self.selected
    }

    /// The currently selected element.
    #[must_use]
    pub fn selected_element(&self) -> Option<&Element> {
        self.selected.and_then(|r| self.get(r))
    }

    /// Text elements in sequence order.
    #[must_use]
    pub fn texts(&self) -> &[Element] {
        &self.texts
    }

    /// Image elements in sequence order.
    #[must_use]
    pub fn images(&self) -> &[Element] {
        &self.images
    }

    /// Elements of one kind in sequence order.
    #[must_use]
    pub fn elements(&self, kind: Kind) -> &[Element] {
        self.sequence(kind)
    }

    /// Elements of one kind in paint order, bottom first.
    ///
    /// Sorted by effective z-index; the sort is stable so equal or absent
    /// z-indices keep their sequence order.
    #[must_use]
    pub fn paint_order(&self, kind: Kind) -> Vec<&Element> {
        let mut ordered: Vec<(i64, &Element)> = self
            .sequence(kind)
            .iter()
            .enumerate()
            .map(|(index, e)| (e.effective_z_index(index), e))
            .collect();
        ordered.sort_by_key(|(z, _)| *z);
        ordered.into_iter().map(|(_, e)| e).collect()
    }

    /// Set the background fill color.
    pub fn set_canvas_color(&mut self, color: impl Into<String>) {
        self.canvas_color = color.into();
    }

    /// Total number of elements of both kinds.
    #[must_use]
    pub fn element_count(&self) -> usize {
        self.texts.len() + self.images.len()
    }

    /// Check if the scene has no elements.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.texts.is_empty() && self.images.is_empty()
    }

    /// Serialize the scene to JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> CanvasResult<String> {
        serde_json::to_string(self).map_err(CanvasError::Serialization)
    }

    /// Deserialize a scene from JSON.
    ///
    /// A selection pointing at a missing element is dropped, and element
    /// values are normalized as if they had been set through edits.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON is malformed or the canvas size is not
    /// a positive finite number.
    pub fn from_json(json: &str) -> CanvasResult<Self> {
        let mut scene: Self = serde_json::from_str(json)?;
        let valid_dimension = |v: f32| v.is_finite() && v > 0.0;
        if !valid_dimension(scene.width) || !valid_dimension(scene.height) {
            return Err(CanvasError::InvalidScene(format!(
                "canvas size {}x{} must be positive",
                scene.width, scene.height
            )));
        }
        for element in scene.texts.iter_mut().chain(scene.images.iter_mut()) {
            element.normalize();
        }
        if let Some(selected) = scene.selected {
            if scene.get(selected).is_none() {
                scene.selected = None;
            }
        }
        Ok(scene)
    }

    fn sequence(&self, kind: Kind) -> &Vec<Element> {
        match kind {
            Kind::Text => &self.texts,
            Kind::Image => &self.images,
        }
    }

    fn sequence_mut(&mut self, kind: Kind) -> &mut Vec<Element> {
        match kind {
            Kind::Text => &mut self.texts,
            Kind::Image => &mut self.images,
        }
    }
}

impl Default for Scene {
    fn default() -> Self {
        Self::new(CANVAS_SIZE, CANVAS_SIZE)
    }
}

fn reorder_sequence(sequence: &mut Vec<Element>, index: usize, direction: LayerMove) -> bool {
    let last = sequence.len().saturating_sub(1);
    match direction {
        LayerMove::Forward if index < last => sequence.swap(index, index + 1),
        LayerMove::Backward if index > 0 => sequence.swap(index, index - 1),
        LayerMove::ToFront if index < last => {
            let element = sequence.remove(index);
            sequence.push(element);
        }
        LayerMove::ToBack if index > 0 => {
            let element = sequence.remove(index);
            sequence.insert(0, element);
        }
        _ => return false,
    }
    true
}
