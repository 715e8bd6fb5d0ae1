pub mod config;
pub mod error;
pub mod layout;
pub mod physics;
pub mod snap;

pub use config::{AppConfig, SnapAlignment};
pub use error::{Error, Result};
pub use layout::{
    Item, LayoutInfo, LayoutSnapshot, ListState, SnapContext, SnapOffset, SnapshotLayout, Viewport,
};
pub use physics::{DecayModel, FrameClock, MonotonicClock, SpringSpec, VirtualClock};
pub use snap::{
    FlingController, FlingPhase, FlingPolicy, FlingSession, FlingState, FlingStep,
    MaxFlingDistance, ScrollSurface, SnapIndex, SnapScroller,
};
