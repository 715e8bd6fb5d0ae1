//! Fling-to-snap orchestration
//!
//! # Layers
//!
//! ## L4 Atomic Layer
//! - `resolver` - Target index selection, remap and max-distance strategies
//!
//! ## L3 Molecular Layer
//! - `session` - Frame-driven decay then spring state machine for one fling
//! - `controller` - Resolves a target and starts sessions
//! - `scroller` - Owns a host and at most one in-flight fling
//!
//! A fling never blocks: hosts pull one frame at a time through
//! [`FlingSession::step`] and may cancel between frames.

pub mod controller;
pub mod resolver;
pub mod scroller;
pub mod session;

pub use controller::{FlingController, FlingPolicy};
pub use resolver::{determine_target_index, MaxFlingDistance, SnapIndex};
pub use scroller::SnapScroller;
pub use session::{FlingPhase, FlingSession, FlingState, FlingStep};

/// Something that moves by a scroll delta
pub trait ScrollSurface {
    /// Apply `delta` and return the part of it that was actually consumed
    fn scroll_by(&mut self, delta: f32) -> f32;
}
