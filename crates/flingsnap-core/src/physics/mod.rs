//! Physical models driving fling animations
//!
//! # Layers
//!
//! ## L4 Atomic Layer
//! - `decay` - Decay models projecting how far a released velocity travels
//! - `spring` - Damped spring converging on a fixed displacement
//! - `timing` - Frame time bookkeeping and clocks
//!
//! All models are relative: they start from a value of 0 and report the
//! displacement travelled since the animation started.

pub mod decay;
pub mod spring;
pub mod timing;

pub use decay::{DecayModel, ExponentialDecay, SplineDecay};
pub use spring::{SpringMotion, SpringSpec};
pub use timing::{frame_interval, FrameClock, FrameTimer, MonotonicClock, VirtualClock};
