//! L3 Molecular Layer: Fling entry point
//!
//! Decides whether a release velocity should animate at all, resolves and
//! remaps the target index, and hands back a [`FlingSession`] the host
//! drives frame by frame.

use std::sync::Arc;

use tracing::{debug, warn};

use super::resolver::{start_index, MaxFlingDistance, SnapIndex};
use super::session::{FlingPhysics, FlingSession, FlingState};
use super::ScrollSurface;
use crate::config::{AppConfig, SnapConfig};
use crate::error::{Error, Result};
use crate::layout::LayoutInfo;
use crate::physics::{decay, DecayModel, FrameClock, SplineDecay, SpringSpec};

/// Frames [`FlingController::fling`] steps before giving up on a session
pub const MAX_FLING_FRAMES: usize = 100_000;

/// Thresholds shaping how a fling moves between phases
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FlingPolicy {
    /// Speeds below this snap to the nearest item without decaying
    pub near_zero_velocity: f32,
    /// Largest allowed gap between requested and consumed deltas
    pub consumed_tolerance: f32,
    /// Hand long flings over to the spring one item before the target
    pub fling_then_spring: bool,
    /// Minimum item distance for that hand-over
    pub spring_handoff_items: usize,
}

impl Default for FlingPolicy {
    fn default() -> Self {
        Self {
            near_zero_velocity: 0.5,
            consumed_tolerance: 0.5,
            fling_then_spring: true,
            spring_handoff_items: 2,
        }
    }
}

impl From<&SnapConfig> for FlingPolicy {
    fn from(config: &SnapConfig) -> Self {
        Self {
            near_zero_velocity: config.near_zero_velocity,
            consumed_tolerance: config.consumed_tolerance,
            fling_then_spring: config.fling_then_spring,
            spring_handoff_items: config.spring_handoff_items,
        }
    }
}

/// Turns release velocities into snapping flings
///
/// Cheap to clone; the decay model is shared.
#[derive(Debug, Clone)]
pub struct FlingController {
    physics: FlingPhysics,
    snap_index: SnapIndex,
    max_fling_distance: MaxFlingDistance,
}

impl Default for FlingController {
    fn default() -> Self {
        Self::new(Arc::new(SplineDecay::default()))
    }
}

impl FlingController {
    pub fn new(decay: Arc<dyn DecayModel>) -> Self {
        Self {
            physics: FlingPhysics {
                decay,
                spring: SpringSpec::default(),
                policy: FlingPolicy::default(),
            },
            snap_index: SnapIndex::default(),
            max_fling_distance: MaxFlingDistance::default(),
        }
    }

    /// Build a controller from validated configuration
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        config.validate()?;

        let max_fling_distance = config
            .snap
            .max_fling_items
            .map_or(MaxFlingDistance::Unbounded, MaxFlingDistance::Items);

        Ok(Self::new(decay::from_config(&config.decay))
            .with_spring(SpringSpec::from(&config.spring))
            .with_snap_index(SnapIndex::from_config(&config.snap))
            .with_max_fling_distance(max_fling_distance)
            .with_policy(FlingPolicy::from(&config.snap)))
    }

    pub fn with_spring(mut self, spring: SpringSpec) -> Self {
        self.physics.spring = spring;
        self
    }

    pub fn with_snap_index(mut self, snap_index: SnapIndex) -> Self {
        self.snap_index = snap_index;
        self
    }

    pub fn with_max_fling_distance(mut self, max_fling_distance: MaxFlingDistance) -> Self {
        self.max_fling_distance = max_fling_distance;
        self
    }

    pub fn with_policy(mut self, policy: FlingPolicy) -> Self {
        self.physics.policy = policy;
        self
    }

    pub fn decay(&self) -> &dyn DecayModel {
        self.physics.decay.as_ref()
    }

    pub fn spring(&self) -> &SpringSpec {
        &self.physics.spring
    }

    pub fn policy(&self) -> &FlingPolicy {
        &self.physics.policy
    }

    /// Index a fling with `velocity` would settle on, after remapping
    ///
    /// `Ok(None)` when the layout has no current item.
    pub fn resolve_target<L: LayoutInfo>(&self, layout: &L, velocity: f32) -> Result<Option<usize>> {
        let max_distance = self.max_fling_distance.resolve(layout);
        if max_distance.is_nan() || max_distance <= 0.0 {
            return Err(Error::InvalidMaxFlingDistance(max_distance));
        }

        let Some(current) = layout.current_item() else {
            return Ok(None);
        };
        let Some(target) = layout.determine_target_index(
            velocity,
            self.decay(),
            max_distance,
            self.physics.policy.near_zero_velocity,
        ) else {
            return Ok(None);
        };

        let start = start_index(current.index, velocity);
        let index = self.snap_index.resolve(layout, start, target);
        let count = layout.total_items_count();
        if index >= count {
            return Err(Error::SnapIndexOutOfRange { index, count });
        }

        debug!(
            current = current.index,
            start,
            resolved = target,
            target_index = index,
            velocity,
            "Resolved fling target"
        );
        Ok(Some(index))
    }

    /// Start a fling with `initial_velocity` against `layout`
    ///
    /// A layout resting against either edge does not animate: the session
    /// comes back already finished with the whole velocity unconsumed.
    pub fn start<L: LayoutInfo>(&self, layout: &L, initial_velocity: f32) -> Result<FlingSession> {
        if !layout.can_scroll_toward_start() || !layout.can_scroll_toward_end() {
            debug!(velocity = initial_velocity, "Fling skipped at scroll edge");
            return Ok(FlingSession::finished(self.physics.clone(), initial_velocity));
        }

        match self.resolve_target(layout, initial_velocity)? {
            Some(target) => Ok(FlingSession::begin(
                self.physics.clone(),
                layout,
                target,
                initial_velocity,
            )),
            None => Ok(FlingSession::finished(self.physics.clone(), initial_velocity)),
        }
    }

    /// Run a fling to completion against `clock`, returning the unconsumed velocity
    ///
    /// `clock` must advance between frames. A session still running after
    /// [`MAX_FLING_FRAMES`] frames is cancelled and reports 0.
    pub fn fling<H, C>(&self, host: &mut H, initial_velocity: f32, clock: &mut C) -> Result<f32>
    where
        H: LayoutInfo + ScrollSurface,
        C: FrameClock + ?Sized,
    {
        let mut session = self.start(&*host, initial_velocity)?;
        let mut frames = 0;
        while session.is_running() {
            if frames == MAX_FLING_FRAMES {
                warn!(
                    frames,
                    target_index = ?session.target_index(),
                    "Fling did not settle, cancelling"
                );
                session.cancel();
                break;
            }
            session.step(host, clock.next_frame());
            frames += 1;
        }

        Ok(match session.state() {
            FlingState::Finished { velocity_left } => velocity_left,
            FlingState::Running | FlingState::Cancelled => 0.0,
        })
    }
}
