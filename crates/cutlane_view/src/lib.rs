//! Headless timeline views over a [`cutlane_core::Sequence`].
//!
//! [`TimelineView`] is the multi-track canvas: it maps time to pixels, snaps
//! drags, and produces a display list a frontend can paint. [`ClipStrip`] is
//! the single-row variant used for simple drag-to-reorder editing. Both queue
//! [`ViewEvent`]s for the caller to drain.

pub mod geometry;
pub mod scale;
pub mod scene;
pub mod snapping;
pub mod strip;
pub mod view;

pub use geometry::{Point, Rect};
pub use scale::TimeScale;
pub use scene::{ClipBlock, Primitive, Scene};
pub use snapping::ProposedPlacement;
pub use strip::ClipStrip;
pub use view::{TimelineView, ViewEvent};
