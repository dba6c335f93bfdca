//! # T-Shirt Studio Core
//!
//! Design model for the t-shirt editor: layered text and image elements on a
//! fixed-size canvas, manipulated by pointer gestures.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │                 tshirt-core                 │
//! ├─────────────────────────────────────────────┤
//! │  Scene Store     │  Interaction             │
//! │  - Text stack    │  - Hit testing           │
//! │  - Image stack   │  - Drag / resize         │
//! │  - Selection     │  - Rotate                │
//! ├─────────────────────────────────────────────┤
//! │  Element Model   │  Submission              │
//! │  - Layering      │  - Contact details       │
//! │  - Lock/opacity  │  - Delivery details      │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! Every mutation is synchronous and goes through `&mut Scene`; rendering and
//! transport live in the `tshirt-renderer` and `tshirt-server` crates.

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::float_cmp)]

pub mod element;
pub mod error;
pub mod event;
pub mod interaction;
pub mod scene;
pub mod submission;

pub use element::{Element, ElementId, ElementKind, ElementPatch, ElementRef, Kind};
pub use error::{CanvasError, CanvasResult};
pub use event::{HitTarget, Point, PointerEvent, ResizeHandle};
pub use interaction::{hit_test, Interaction, InteractionEffect, InteractionState};
pub use scene::{LayerMove, Scene, CANVAS_SIZE};
pub use submission::{DeliveryDetails, DesignSubmission, SubmissionError, UserDetails};

/// Core library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
