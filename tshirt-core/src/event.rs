//! Pointer events for canvas interaction.

use serde::{Deserialize, Serialize};

use crate::ElementRef;

/// A position in canvas-local coordinates.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
    /// X coordinate (pixels from the canvas's left edge).
    pub x: f32,
    /// Y coordinate (pixels from the canvas's top edge).
    pub y: f32,
}

impl Point {
    /// Create a point.
    #[must_use]
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

impl std::ops::Sub for Point {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Self::new(self.x - rhs.x, self.y - rhs.y)
    }
}

/// A resize handle on the selection outline, named by compass direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[allow(missing_docs)]
pub enum ResizeHandle {
    N,
    Ne,
    E,
    Se,
    S,
    Sw,
    W,
    Nw,
}

impl ResizeHandle {
    /// All eight handles, clockwise from the top edge.
    pub const ALL: [Self; 8] = [
        Self::N,
        Self::Ne,
        Self::E,
        Self::Se,
        Self::S,
        Self::Sw,
        Self::W,
        Self::Nw,
    ];

    /// Whether the handle sits on the right edge.
    #[must_use]
    pub fn east(self) -> bool {
        matches!(self, Self::Ne | Self::E | Self::Se)
    }

    /// Whether the handle sits on the left edge.
    #[must_use]
    pub fn west(self) -> bool {
        matches!(self, Self::Nw | Self::W | Self::Sw)
    }

    /// Whether the handle sits on the top edge.
    #[must_use]
    pub fn north(self) -> bool {
        matches!(self, Self::Nw | Self::N | Self::Ne)
    }

    /// Whether the handle sits on the bottom edge.
    #[must_use]
    pub fn south(self) -> bool {
        matches!(self, Self::Sw | Self::S | Self::Se)
    }

    /// Handle position as fractions of the box width and height.
    #[must_use]
    pub fn anchor(self) -> (f32, f32) {
        let fx = if self.west() {
            0.0
        } else if self.east() {
            1.0
        } else {
            0.5
        };
        let fy = if self.north() {
            0.0
        } else if self.south() {
            1.0
        } else {
            0.5
        };
        (fx, fy)
    }
}

/// What a pointer-down landed on.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "target", rename_all = "camelCase")]
pub enum HitTarget {
    /// Empty canvas.
    Background,
    /// The body of an element.
    Element {
        /// The element hit.
        element: ElementRef,
    },
    /// A resize handle of an element.
    ResizeHandle {
        /// The element the handle belongs to.
        element: ElementRef,
        /// Which handle.
        handle: ResizeHandle,
    },
    /// The rotation handle of an element.
    RotateHandle {
        /// The element the handle belongs to.
        element: ElementRef,
    },
}

impl HitTarget {
    /// The element this target belongs to, if any.
    #[must_use]
    pub fn element(&self) -> Option<ElementRef> {
        match *self {
            Self::Background => None,
            Self::Element { element }
            | Self::ResizeHandle { element, .. }
            | Self::RotateHandle { element } => Some(element),
        }
    }
}

/// Raw pointer input delivered to the interaction state machine.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum PointerEvent {
    /// Button pressed.
    Down {
        /// Pointer position in canvas coordinates.
        position: Point,
        /// What the press landed on.
        target: HitTarget,
    },
    /// Pointer moved.
    Move {
        /// Pointer position in canvas coordinates.
        position: Point,
    },
    /// Button released.
    Up,
    /// Pointer left the canvas area.
    Leave,
}

impl PointerEvent {
    /// Pointer-down at a position on a known target.
    #[must_use]
    pub fn down(x: f32, y: f32, target: HitTarget) -> Self {
        Self::Down {
            position: Point::new(x, y),
            target,
        }
    }

    /// Pointer move to a position.
    #[must_use]
    pub fn moved(x: f32, y: f32) -> Self {
        Self::Move {
            position: Point::new(x, y),
        }
    }
}
