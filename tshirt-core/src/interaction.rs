//! Pointer-driven manipulation: select, drag, resize, rotate.
//!
//! [`Interaction`] owns the gesture bookkeeping and turns raw
//! [`PointerEvent`]s into [`Scene`] mutations. Every geometry change is
//! clamped or floored, never rejected, and locked elements are never the
//! target of a gesture.
//!
//! ```text
//!          down on body            down on handle          down on rotate handle
//!   ┌──────────────────────┐  ┌─────────────────────┐  ┌──────────────────────┐
//!   ▼                      │  ▼                     │  ▼                      │
//! Dragging ◄──────────── Idle ─────────────► Resizing      Rotating ◄──────── Idle
//!   │        up / leave     ▲     up / leave    │             │  up / leave
//!   └───────────────────────┴───────────────────┘─────────────┘
//! ```

use serde::{Deserialize, Serialize};

use crate::element::{
    normalize_rotation, rotate_about, Element, ElementKind, ElementPatch, Kind, MIN_FONT_SIZE,
    MIN_IMAGE_SIZE,
};
use crate::event::{HitTarget, Point, PointerEvent, ResizeHandle};
use crate::{ElementRef, Scene};

/// Distance in pixels within which a handle captures a press.
pub const HANDLE_HIT_RADIUS: f32 = 6.0;

/// Distance of the rotation handle above an image's top edge.
pub const ROTATE_HANDLE_OFFSET: f32 = 20.0;

/// Resize handles exposed on a selected text element.
pub const TEXT_HANDLES: [ResizeHandle; 3] = [ResizeHandle::E, ResizeHandle::Se, ResizeHandle::S];

/// Geometry captured when a resize gesture starts.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ResizeStart {
    /// Pointer position at gesture start.
    pub pointer: Point,
    /// Image width at gesture start (footprint width for text).
    pub width: f32,
    /// Image height at gesture start (footprint height for text).
    pub height: f32,
    /// Font size at gesture start (unused for images).
    pub size: f32,
}

/// Current gesture.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "camelCase")]
pub enum InteractionState {
    /// No gesture in progress.
    #[default]
    Idle,
    /// Moving an element; `offset` is the grab point relative to its top-left.
    Dragging {
        /// Element being moved.
        element: ElementRef,
        /// Pointer position minus element top-left at gesture start.
        offset: Point,
    },
    /// Resizing an element from one handle.
    Resizing {
        /// Element being resized.
        element: ElementRef,
        /// Handle being dragged.
        handle: ResizeHandle,
        /// Geometry at gesture start.
        start: ResizeStart,
    },
    /// Rotating an image by horizontal pointer travel.
    Rotating {
        /// Image being rotated.
        element: ElementRef,
        /// Pointer position at gesture start.
        start_pointer: Point,
        /// Rotation in degrees at gesture start.
        start_rotation: f32,
    },
}

impl InteractionState {
    /// The element targeted by the active gesture.
    #[must_use]
    pub fn target(&self) -> Option<ElementRef> {
        match *self {
            Self::Idle => None,
            Self::Dragging { element, .. }
            | Self::Resizing { element, .. }
            | Self::Rotating { element, .. } => Some(element),
        }
    }
}

/// What handling one pointer event did to the scene.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "effect", rename_all = "camelCase")]
pub enum InteractionEffect {
    /// Nothing changed.
    Ignored,
    /// Selection changed without starting a gesture.
    SelectionChanged {
        /// New selection.
        selected: Option<ElementRef>,
    },
    /// A gesture started and its target became the selection.
    GestureStarted {
        /// Gesture target.
        element: ElementRef,
    },
    /// An element was moved to a clamped position.
    Moved {
        /// Element moved.
        element: ElementRef,
        /// New left edge.
        x: f32,
        /// New top edge.
        y: f32,
    },
    /// An element's size changed.
    Resized {
        /// Element resized.
        element: ElementRef,
    },
    /// An image's rotation changed.
    Rotated {
        /// Image rotated.
        element: ElementRef,
        /// New rotation in degrees.
        rotation: f32,
    },
    /// The gesture ended normally.
    GestureEnded,
    /// The gesture target became locked or disappeared mid-gesture.
    GestureCancelled,
}

/// The interaction state machine.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Interaction {
    state: InteractionState,
}

impl Interaction {
    /// Create an idle state machine.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Current gesture state.
    #[must_use]
    pub fn state(&self) -> &InteractionState {
        &self.state
    }

    /// Whether no gesture is in progress.
    #[must_use]
    pub fn is_idle(&self) -> bool {
        self.state == InteractionState::Idle
    }

    /// Feed one pointer event through the state machine.
    pub fn handle(&mut self, scene: &mut Scene, event: PointerEvent) -> InteractionEffect {
        match event {
            PointerEvent::Down { position, target } => self.pointer_down(scene, position, target),
            PointerEvent::Move { position } => self.pointer_move(scene, position),
            PointerEvent::Up | PointerEvent::Leave => self.release(),
        }
    }

    /// Hit-test a press position and feed the resulting pointer-down.
    pub fn press_at(&mut self, scene: &mut Scene, x: f32, y: f32) -> InteractionEffect {
        let target = hit_test(scene, Point::new(x, y));
        self.handle(scene, PointerEvent::down(x, y, target))
    }

    fn pointer_down(
        &mut self,
        scene: &mut Scene,
        position: Point,
        target: HitTarget,
    ) -> InteractionEffect {
        let Some(reference) = target.element() else {
            self.state = InteractionState::Idle;
            scene.select(None);
            return InteractionEffect::SelectionChanged { selected: None };
        };
        let Some(element) = scene.get(reference) else {
            return InteractionEffect::Ignored;
        };

        let was_selected = scene.selected() == Some(reference);
        let next = if element.locked {
            None
        } else {
            match target {
                HitTarget::Element { .. } => Some(InteractionState::Dragging {
                    element: reference,
                    offset: position - Point::new(element.x, element.y),
                }),
                HitTarget::ResizeHandle { handle, .. } if was_selected => {
                    Some(InteractionState::Resizing {
                        element: reference,
                        handle,
                        start: resize_start(element, position),
                    })
                }
                HitTarget::RotateHandle { .. } if was_selected && reference.kind == Kind::Image => {
                    Some(InteractionState::Rotating {
                        element: reference,
                        start_pointer: position,
                        start_rotation: element.rotation(),
                    })
                }
                _ => None,
            }
        };

        scene.select(Some(reference));
        match next {
            Some(state) => {
                tracing::debug!("Gesture started: {state:?}");
                self.state = state;
                InteractionEffect::GestureStarted { element: reference }
            }
            None => {
                self.state = InteractionState::Idle;
                InteractionEffect::SelectionChanged {
                    selected: Some(reference),
                }
            }
        }
    }

    fn pointer_move(&mut self, scene: &mut Scene, position: Point) -> InteractionEffect {
        let Some(reference) = self.state.target() else {
            return InteractionEffect::Ignored;
        };
        let Some(element) = scene.get(reference).filter(|e| !e.locked) else {
            tracing::debug!("Cancelling gesture on {reference}: target locked or removed");
            self.state = InteractionState::Idle;
            return InteractionEffect::GestureCancelled;
        };

        match self.state {
            InteractionState::Idle => InteractionEffect::Ignored,
            InteractionState::Dragging { offset, .. } => {
                let (w, h) = element.footprint();
                let x = clamp_to_canvas(position.x - offset.x, scene.width - w);
                let y = clamp_to_canvas(position.y - offset.y, scene.height - h);
                scene.update(reference, &ElementPatch::position(x, y));
                InteractionEffect::Moved {
                    element: reference,
                    x,
                    y,
                }
            }
            InteractionState::Resizing { handle, start, .. } => {
                let delta = position - start.pointer;
                let patch = match element.kind() {
                    Kind::Image => {
                        let (width, height) = resized_box(handle, &start, delta);
                        ElementPatch::dimensions(width, height)
                    }
                    Kind::Text => ElementPatch::font_size((start.size + delta.x).max(MIN_FONT_SIZE)),
                };
                scene.update(reference, &patch);
                InteractionEffect::Resized { element: reference }
            }
            InteractionState::Rotating {
                start_pointer,
                start_rotation,
                ..
            } => {
                let rotation = normalize_rotation(start_rotation + (position.x - start_pointer.x));
                scene.update(reference, &ElementPatch::rotation(rotation));
                InteractionEffect::Rotated {
                    element: reference,
                    rotation,
                }
            }
        }
    }

    fn release(&mut self) -> InteractionEffect {
        if self.is_idle() {
            return InteractionEffect::Ignored;
        }
        tracing::debug!("Gesture ended: {:?}", self.state);
        self.state = InteractionState::Idle;
        InteractionEffect::GestureEnded
    }
}

fn resize_start(element: &Element, pointer: Point) -> ResizeStart {
    let (width, height) = element.footprint();
    let size = match element.content {
        ElementKind::Text { size, .. } => size,
        ElementKind::Image { .. } => 0.0,
    };
    ResizeStart {
        pointer,
        width,
        height,
        size,
    }
}

/// New image box for a handle drag; west and north handles invert the delta.
fn resized_box(handle: ResizeHandle, start: &ResizeStart, delta: Point) -> (f32, f32) {
    let mut width = start.width;
    let mut height = start.height;
    if handle.east() {
        width = (start.width + delta.x).max(MIN_IMAGE_SIZE);
    }
    if handle.west() {
        width = (start.width - delta.x).max(MIN_IMAGE_SIZE);
    }
    if handle.south() {
        height = (start.height + delta.y).max(MIN_IMAGE_SIZE);
    }
    if handle.north() {
        height = (start.height - delta.y).max(MIN_IMAGE_SIZE);
    }
    (width, height)
}

/// Clamp into `[0, max]`, pinning to 0 when the element is wider than the canvas.
fn clamp_to_canvas(value: f32, max: f32) -> f32 {
    value.min(max).max(0.0)
}

/// Find what a press at `point` lands on.
///
/// Handles of the selected, unlocked element take priority. Among element
/// bodies, text is above images (text is painted after all images), and
/// within a kind the topmost element in paint order wins.
#[must_use]
pub fn hit_test(scene: &Scene, point: Point) -> HitTarget {
    if let Some(selected) = scene.selected_element().filter(|e| !e.locked) {
        if let Some(target) = handle_at(selected, point) {
            return target;
        }
    }

    for kind in [Kind::Text, Kind::Image] {
        if let Some(element) = scene
            .paint_order(kind)
            .into_iter()
            .rev()
            .find(|e| e.contains_point(point.x, point.y))
        {
            return HitTarget::Element {
                element: element.reference(),
            };
        }
    }

    HitTarget::Background
}

fn handle_at(element: &Element, point: Point) -> Option<HitTarget> {
    let reference = element.reference();
    let (w, h) = element.footprint();
    let center = element.center();
    let rotation = element.rotation();
    let near = |local: (f32, f32)| {
        let (hx, hy) = rotate_about(local, center, rotation);
        (hx - point.x).hypot(hy - point.y) <= HANDLE_HIT_RADIUS
    };

    if reference.kind == Kind::Image && near((center.0, element.y - ROTATE_HANDLE_OFFSET)) {
        return Some(HitTarget::RotateHandle { element: reference });
    }

    let handles: &[ResizeHandle] = match reference.kind {
        Kind::Image => &ResizeHandle::ALL,
        Kind::Text => &TEXT_HANDLES,
    };
    handles
        .iter()
        .copied()
        .find(|handle| {
            let (fx, fy) = handle.anchor();
            near((element.x + fx * w, element.y + fy * h))
        })
        .map(|handle| HitTarget::ResizeHandle {
            element: reference,
            handle,
        })
}
