//! L3 Molecular Layer: Per-frame fling state machine
//!
//! A session animates one fling towards a fixed target index: an optional
//! decay phase that lets the release velocity carry the list, then a spring
//! phase that lands the target exactly on its snap point. The host pulls
//! frames through [`FlingSession::step`]; nothing here sleeps or blocks.

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tracing::{debug, trace};

use super::controller::FlingPolicy;
use super::ScrollSurface;
use crate::layout::{Item, LayoutInfo};
use crate::physics::spring::MAX_SPRING_DURATION;
use crate::physics::{DecayModel, FrameTimer, SpringSpec};

/// Models and thresholds a session animates with
#[derive(Debug, Clone)]
pub(crate) struct FlingPhysics {
    pub decay: Arc<dyn DecayModel>,
    pub spring: SpringSpec,
    pub policy: FlingPolicy,
}

/// Phase a frame was spent in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FlingPhase {
    Decay,
    Spring,
    /// The session had already ended
    Idle,
}

/// Lifecycle of a session
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum FlingState {
    Running,
    /// Settled; `velocity_left` is what the host may hand to an outer scroller
    Finished { velocity_left: f32 },
    /// Stopped by [`FlingSession::cancel`]
    Cancelled,
}

/// What one frame did
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FlingStep {
    pub phase: FlingPhase,
    /// Delta requested from the host this frame
    pub requested: f32,
    /// Delta the host reported as consumed
    pub consumed: f32,
    /// Corrective scroll applied after overshooting the target, 0 if none
    pub snap_back: f32,
    /// Animation velocity at this frame
    pub velocity: f32,
    pub current_index: Option<usize>,
    #[serde(flatten)]
    pub state: FlingState,
}

#[derive(Debug, Clone, Copy)]
struct DecayRun {
    timer: FrameTimer,
    initial_velocity: f32,
    last_value: f32,
    /// Stop decaying one item short of the target and let the spring land it
    spring_handoff: bool,
}

#[derive(Debug, Clone, Copy)]
struct SpringRun {
    timer: FrameTimer,
    initial_velocity: f32,
    target_value: f32,
    last_value: f32,
}

#[derive(Debug, Clone, Copy)]
enum Stage {
    Decay(DecayRun),
    Spring(SpringRun),
    Done(FlingState),
}

/// One fling in progress
///
/// Create through [`FlingController::start`](super::FlingController::start),
/// then call [`step`](Self::step) once per frame with the host that was
/// measured, until the state is no longer [`FlingState::Running`].
#[derive(Debug, Clone)]
pub struct FlingSession {
    physics: FlingPhysics,
    target_index: Option<usize>,
    initial_velocity: f32,
    /// Velocity carried from the last frame into the next phase
    velocity: f32,
    stage: Stage,
}

impl FlingSession {
    /// A session that ended before animating anything
    pub(crate) fn finished(physics: FlingPhysics, velocity_left: f32) -> Self {
        Self {
            physics,
            target_index: None,
            initial_velocity: velocity_left,
            velocity: velocity_left,
            stage: Stage::Done(FlingState::Finished { velocity_left }),
        }
    }

    /// Begin animating towards `target_index`
    pub(crate) fn begin<L: LayoutInfo + ?Sized>(
        physics: FlingPhysics,
        layout: &L,
        target_index: usize,
        initial_velocity: f32,
    ) -> Self {
        let mut session = Self {
            physics,
            target_index: Some(target_index),
            initial_velocity,
            velocity: initial_velocity,
            stage: Stage::Done(FlingState::Finished {
                velocity_left: initial_velocity,
            }),
        };

        let Some(initial) = layout.current_item() else {
            return session;
        };

        if initial.index == target_index && layout.distance_to_index_snap(target_index) == 0 {
            debug!(target_index, "Fling target already snapped");
            session.finish(layout, initial_velocity);
            return session;
        }

        if session.can_decay_beyond_current_item(layout, initial_velocity, initial) {
            let spring_handoff = session.physics.policy.fling_then_spring
                && target_index.abs_diff(initial.index) >= session.physics.policy.spring_handoff_items;
            debug!(
                current = initial.index,
                target_index,
                velocity = initial_velocity,
                spring_handoff,
                "Fling decay started"
            );
            session.stage = Stage::Decay(DecayRun {
                timer: FrameTimer::new(),
                initial_velocity,
                last_value: 0.0,
                spring_handoff,
            });
        } else {
            session.enter_spring(layout);
        }

        session
    }

    /// Advance the animation to `frame_time`
    ///
    /// Frame times must come from one monotonic clock; the first frame of
    /// each phase defines that phase's zero. Stepping a session that already
    /// ended is a no-op reporting [`FlingPhase::Idle`].
    pub fn step<H>(&mut self, host: &mut H, frame_time: Duration) -> FlingStep
    where
        H: LayoutInfo + ScrollSurface + ?Sized,
    {
        match self.stage {
            Stage::Decay(run) => self.step_decay(run, host, frame_time),
            Stage::Spring(run) => self.step_spring(run, host, frame_time),
            Stage::Done(state) => FlingStep {
                phase: FlingPhase::Idle,
                requested: 0.0,
                consumed: 0.0,
                snap_back: 0.0,
                velocity: 0.0,
                current_index: host.current_item().map(|item| item.index),
                state,
            },
        }
    }

    /// Stop animating; returns whether the session was still running
    pub fn cancel(&mut self) -> bool {
        if !self.is_running() {
            return false;
        }
        debug!(target_index = ?self.target_index, velocity = self.velocity, "Fling cancelled");
        self.stage = Stage::Done(FlingState::Cancelled);
        true
    }

    pub fn state(&self) -> FlingState {
        match self.stage {
            Stage::Decay(_) | Stage::Spring(_) => FlingState::Running,
            Stage::Done(state) => state,
        }
    }

    /// Phase the next frame will run in
    pub fn phase(&self) -> FlingPhase {
        match self.stage {
            Stage::Decay(_) => FlingPhase::Decay,
            Stage::Spring(_) => FlingPhase::Spring,
            Stage::Done(_) => FlingPhase::Idle,
        }
    }

    #[inline]
    pub fn is_running(&self) -> bool {
        matches!(self.stage, Stage::Decay(_) | Stage::Spring(_))
    }

    /// Target index while the session is animating
    pub fn current_target(&self) -> Option<usize> {
        if self.is_running() {
            self.target_index
        } else {
            None
        }
    }

    /// Target the session was started with, if it resolved one
    pub fn target_index(&self) -> Option<usize> {
        self.target_index
    }

    pub fn initial_velocity(&self) -> f32 {
        self.initial_velocity
    }

    fn step_decay<H>(&mut self, mut run: DecayRun, host: &mut H, frame_time: Duration) -> FlingStep
    where
        H: LayoutInfo + ScrollSurface + ?Sized,
    {
        let decay = &self.physics.decay;
        let play_time = run.timer.play_time(frame_time);
        let duration = decay.duration(run.initial_velocity);
        let mut running = play_time < duration;
        let (value, velocity) = if running {
            (
                decay.value_at(play_time, run.initial_velocity),
                decay.velocity_at(play_time, run.initial_velocity),
            )
        } else {
            (
                decay.target_value(run.initial_velocity),
                decay.velocity_at(duration, run.initial_velocity),
            )
        };

        let requested = value - run.last_value;
        let consumed = host.scroll_by(requested);
        run.last_value = value;
        self.velocity = velocity;

        let mut snap_back = 0.0;
        if (requested - consumed).abs() > self.physics.policy.consumed_tolerance {
            debug!(requested, consumed, "Fling decay stopped by scroll bounds");
            running = false;
        }

        match host.current_item() {
            None => {
                debug!("Fling decay stopped: no current item");
                running = false;
            }
            Some(current) => {
                if running && run.spring_handoff && self.reached_handoff(velocity, current) {
                    debug!(current = current.index, "Fling decay handing off to spring");
                    running = false;
                }
                if running {
                    if let Some(amount) =
                        self.snap_back_if_overshot(host, requested, velocity, current)
                    {
                        snap_back = amount;
                        running = false;
                    }
                }
            }
        }

        trace!(phase = "decay", requested, consumed, velocity, "Fling frame");

        if running {
            self.stage = Stage::Decay(run);
        } else {
            self.enter_spring(&*host);
        }
        self.frame(FlingPhase::Decay, requested, consumed, snap_back, &*host)
    }

    fn step_spring<H>(&mut self, mut run: SpringRun, host: &mut H, frame_time: Duration) -> FlingStep
    where
        H: LayoutInfo + ScrollSurface + ?Sized,
    {
        let spring = self.physics.spring;
        let play_time = run.timer.play_time(frame_time);
        let motion = spring.motion_at(play_time, run.target_value, run.initial_velocity);
        let settled =
            play_time >= MAX_SPRING_DURATION || spring.is_settled(motion, run.target_value);
        // The final frame lands exactly on the target
        let (value, velocity) = if settled {
            (run.target_value, 0.0)
        } else {
            (motion.value, motion.velocity)
        };

        let requested = value - run.last_value;
        let consumed = host.scroll_by(requested);
        run.last_value = value;
        self.velocity = velocity;

        let mut running = !settled;
        let mut snap_back = 0.0;
        match host.current_item() {
            None => {
                debug!("Fling spring stopped: no current item");
                running = false;
            }
            Some(current) => {
                if let Some(amount) =
                    self.snap_back_if_overshot(host, requested, velocity, current)
                {
                    snap_back = amount;
                    running = false;
                } else if (requested - consumed).abs() > self.physics.policy.consumed_tolerance {
                    debug!(requested, consumed, "Fling spring stopped by scroll bounds");
                    running = false;
                }
            }
        }

        trace!(phase = "spring", requested, consumed, velocity, "Fling frame");

        if running {
            self.stage = Stage::Spring(run);
        } else {
            self.finish(&*host, self.velocity);
        }
        self.frame(FlingPhase::Spring, requested, consumed, snap_back, &*host)
    }

    /// Start the spring phase, or finish if there is nothing left to do
    fn enter_spring<L: LayoutInfo + ?Sized>(&mut self, layout: &L) {
        let Some(target) = self.target_index else {
            self.finish(layout, self.velocity);
            return;
        };
        let Some(current) = layout.current_item() else {
            debug!(target_index = target, "Fling ended without a current item");
            self.stage = Stage::Done(FlingState::Finished {
                velocity_left: self.initial_velocity,
            });
            return;
        };

        let target_value = layout.distance_to_index_snap(target);
        if current.index == target && target_value == 0 {
            self.finish(layout, self.velocity);
            return;
        }

        // Only keep momentum that already points at the target
        let velocity = self.velocity;
        let initial_velocity = if (target > current.index && velocity > 0.0)
            || (target <= current.index && velocity < 0.0)
        {
            velocity
        } else {
            0.0
        };

        debug!(
            current = current.index,
            target_index = target,
            distance = target_value,
            velocity = initial_velocity,
            "Fling spring started"
        );
        self.velocity = initial_velocity;
        self.stage = Stage::Spring(SpringRun {
            timer: FrameTimer::new(),
            initial_velocity,
            target_value: target_value as f32,
            last_value: 0.0,
        });
    }

    fn finish<L: LayoutInfo + ?Sized>(&mut self, layout: &L, velocity: f32) {
        let velocity_left = consume_if_not_at_edge(layout, velocity);
        debug!(target_index = ?self.target_index, velocity_left, "Fling finished");
        self.stage = Stage::Done(FlingState::Finished { velocity_left });
    }

    fn can_decay_beyond_current_item<L: LayoutInfo + ?Sized>(
        &self,
        layout: &L,
        velocity: f32,
        current: Item,
    ) -> bool {
        if velocity.abs() < self.physics.policy.near_zero_velocity {
            return false;
        }
        let fling_distance = self.physics.decay.target_value(velocity);
        if velocity < 0.0 {
            fling_distance <= layout.distance_to_index_snap(current.index) as f32
        } else {
            fling_distance >= layout.distance_to_index_snap(current.index + 1) as f32
        }
    }

    /// The item before the target has reached the snap line
    fn reached_handoff(&self, velocity: f32, current: Item) -> bool {
        let Some(target) = self.target_index else {
            return false;
        };
        (velocity > 0.0 && current.index + 1 == target) || (velocity < 0.0 && current.index == target)
    }

    /// Scroll back onto the target if this frame's movement carried past it
    ///
    /// A frame that requested nothing, or whose velocity is below the
    /// spring's visibility threshold, has no direction of travel to judge.
    fn snap_back_if_overshot<H>(
        &self,
        host: &mut H,
        requested: f32,
        velocity: f32,
        current: Item,
    ) -> Option<f32>
    where
        H: LayoutInfo + ScrollSurface + ?Sized,
    {
        let target = self.target_index?;
        if requested == 0.0 || velocity.abs() < self.physics.spring.visibility_threshold {
            return None;
        }
        let overshot =
            (velocity > 0.0 && current.index >= target) || (velocity < 0.0 && current.index < target);
        if !overshot {
            return None;
        }

        let distance = host.distance_to_index_snap(target);
        if distance == 0 {
            return None;
        }
        let amount = distance as f32;
        host.scroll_by(amount);
        debug!(
            current = current.index,
            target_index = target,
            amount,
            "Fling overshot target, snapping back"
        );
        Some(amount)
    }

    fn frame<H>(
        &self,
        phase: FlingPhase,
        requested: f32,
        consumed: f32,
        snap_back: f32,
        host: &H,
    ) -> FlingStep
    where
        H: LayoutInfo + ?Sized,
    {
        FlingStep {
            phase,
            requested,
            consumed,
            snap_back,
            velocity: self.velocity,
            current_index: host.current_item().map(|item| item.index),
            state: self.state(),
        }
    }
}

/// Velocity the host can still use once the fling ends
///
/// Velocity pointing past an edge the list cannot scroll beyond is handed
/// back; otherwise the fling consumed it.
pub fn consume_if_not_at_edge<L: LayoutInfo + ?Sized>(layout: &L, velocity: f32) -> f32 {
    if (velocity < 0.0 && !layout.can_scroll_toward_start())
        || (velocity > 0.0 && !layout.can_scroll_toward_end())
    {
        velocity
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::{ListState, SnapOffset};
    use crate::physics::SplineDecay;
    use crate::physics::{FrameClock, VirtualClock};
    use crate::snap::{FlingController, SnapIndex};

    fn list_at(scroll: f32) -> ListState {
        let mut state = ListState::uniform(20, 100, 300).with_snap_offset(SnapOffset::Center);
        state.scroll_to(scroll);
        state
    }

    fn run<H: LayoutInfo + ScrollSurface>(session: &mut FlingSession, host: &mut H) -> Vec<FlingStep> {
        let mut clock = VirtualClock::new(60);
        let mut steps = Vec::new();
        while session.is_running() {
            steps.push(session.step(host, clock.next_frame()));
            assert!(steps.len() < 2_000, "fling did not terminate");
        }
        steps
    }

    /// Wraps a list and consumes nothing it is asked to scroll
    struct StuckList(ListState);

    impl LayoutInfo for StuckList {
        fn start_scroll_offset(&self) -> i32 {
            self.0.start_scroll_offset()
        }
        fn end_scroll_offset(&self) -> i32 {
            self.0.end_scroll_offset()
        }
        fn visible_items(&self) -> &[Item] {
            self.0.visible_items()
        }
        fn total_items_count(&self) -> usize {
            self.0.total_items_count()
        }
        fn snap_offset(&self) -> &SnapOffset {
            self.0.snap_offset()
        }
    }

    impl ScrollSurface for StuckList {
        fn scroll_by(&mut self, _delta: f32) -> f32 {
            0.0
        }
    }

    /// Wraps a list whose items all disappear after the first scroll
    struct VanishingList {
        inner: ListState,
        hidden: bool,
    }

    impl LayoutInfo for VanishingList {
        fn start_scroll_offset(&self) -> i32 {
            self.inner.start_scroll_offset()
        }
        fn end_scroll_offset(&self) -> i32 {
            self.inner.end_scroll_offset()
        }
        fn visible_items(&self) -> &[Item] {
            if self.hidden {
                &[]
            } else {
                self.inner.visible_items()
            }
        }
        fn total_items_count(&self) -> usize {
            self.inner.total_items_count()
        }
        fn snap_offset(&self) -> &SnapOffset {
            self.inner.snap_offset()
        }
    }

    impl ScrollSurface for VanishingList {
        fn scroll_by(&mut self, delta: f32) -> f32 {
            self.hidden = true;
            self.inner.scroll_by(delta)
        }
    }

    #[test]
    fn test_decay_then_spring_lands_on_target() {
        let mut list = list_at(400.0);
        let mut session = FlingController::default().start(&list, 1200.0).unwrap();
        assert_eq!(session.current_target(), Some(8));
        assert_eq!(session.phase(), FlingPhase::Decay);

        let steps = run(&mut session, &mut list);

        let last_decay = steps
            .iter()
            .rev()
            .find(|step| step.phase == FlingPhase::Decay)
            .unwrap();
        assert_eq!(last_decay.current_index, Some(7));
        assert!(steps.iter().any(|step| step.phase == FlingPhase::Spring));

        assert_eq!(session.state(), FlingState::Finished { velocity_left: 0.0 });
        assert_eq!(list.current_item().unwrap().index, 8);
        assert_eq!(list.distance_to_index_snap(8), 0);
        assert_eq!(session.current_target(), None);
        assert_eq!(session.target_index(), Some(8));
    }

    #[test]
    fn test_first_frame_of_each_phase_is_still() {
        let mut list = list_at(400.0);
        let mut session = FlingController::default().start(&list, 1200.0).unwrap();
        let steps = run(&mut session, &mut list);

        assert_eq!(steps[0].requested, 0.0);
        let first_spring = steps
            .iter()
            .find(|step| step.phase == FlingPhase::Spring)
            .unwrap();
        assert_eq!(first_spring.requested, 0.0);
    }

    #[test]
    fn test_unconsumed_delta_ends_phase() {
        let mut host = StuckList(list_at(400.0));
        let mut session = FlingController::default().start(&host, 1200.0).unwrap();
        let mut clock = VirtualClock::new(60);

        // First decay frame is at play time zero and requests nothing
        let first = session.step(&mut host, clock.next_frame());
        assert_eq!(first.phase, FlingPhase::Decay);
        assert_eq!(session.phase(), FlingPhase::Decay);

        let second = session.step(&mut host, clock.next_frame());
        assert_eq!(second.phase, FlingPhase::Decay);
        assert!(second.requested > 0.5);
        assert_eq!(second.consumed, 0.0);
        assert_eq!(session.phase(), FlingPhase::Spring);

        session.step(&mut host, clock.next_frame());
        let stalled = session.step(&mut host, clock.next_frame());
        assert_eq!(stalled.phase, FlingPhase::Spring);
        assert!(!session.is_running());
        assert!(matches!(session.state(), FlingState::Finished { .. }));
    }

    #[test]
    fn test_missing_items_end_fling() {
        let mut host = VanishingList {
            inner: list_at(400.0),
            hidden: false,
        };
        let mut session = FlingController::default().start(&host, 1200.0).unwrap();
        let step = session.step(&mut host, Duration::ZERO);

        assert_eq!(step.current_index, None);
        assert_eq!(
            session.state(),
            FlingState::Finished {
                velocity_left: 1200.0
            }
        );
    }

    #[test]
    fn test_decay_overshoot_snaps_back_exactly() {
        let controller = FlingController::default().with_snap_index(SnapIndex::Adjacent { max_skip: 1 });
        let mut list = list_at(400.0);
        let mut session = controller.start(&list, 1200.0).unwrap();
        assert_eq!(session.target_index(), Some(6));
        assert_eq!(session.phase(), FlingPhase::Decay);

        let steps = run(&mut session, &mut list);
        let corrected = steps.iter().find(|step| step.snap_back != 0.0).unwrap();
        assert!(corrected.snap_back < 0.0);
        assert_eq!(corrected.current_index, Some(6));
        assert_eq!(list.distance_to_index_snap(6), 0);
        assert_eq!(session.state(), FlingState::Finished { velocity_left: 0.0 });
    }

    #[test]
    fn test_spring_overshoot_snaps_back_exactly() {
        let controller = FlingController::default().with_spring(SpringSpec {
            damping_ratio: 0.2,
            ..Default::default()
        });
        // Item 5 rests 30 units past its snap point
        let mut list = list_at(430.0);
        let mut session = controller.start(&list, 0.0).unwrap();
        assert_eq!(session.target_index(), Some(5));
        assert_eq!(session.phase(), FlingPhase::Spring);

        let steps = run(&mut session, &mut list);
        // The spring animates before any correction
        assert_eq!(steps[0].requested, 0.0);
        assert_eq!(steps[0].snap_back, 0.0);
        assert_eq!(steps[0].state, FlingState::Running);
        let corrected_at = steps.iter().position(|step| step.snap_back != 0.0).unwrap();
        assert!(corrected_at > 1);
        assert!(steps[..corrected_at].iter().all(|step| step.requested <= 0.0));

        let corrected = steps[corrected_at];
        assert!(corrected.snap_back > 0.0 && corrected.snap_back < 30.0);
        assert_eq!(list.current_item().unwrap().index, 5);
        assert_eq!(list.distance_to_index_snap(5), 0);
    }

    #[test]
    fn test_still_frame_never_snaps_back() {
        let mut list = list_at(430.0);
        let controller = FlingController::default().with_spring(SpringSpec {
            damping_ratio: 0.2,
            ..Default::default()
        });
        let session = controller.start(&list, 0.0).unwrap();
        let current = list.current_item().unwrap();

        assert_eq!(session.snap_back_if_overshot(&mut list, 0.0, 1.0, current), None);
        assert_eq!(session.snap_back_if_overshot(&mut list, 2.0, 1.0e-14, current), None);
        assert_eq!(list.scroll_position(), 430.0);

        // Moving forward while resting on the target is an overshoot
        assert_eq!(
            session.snap_back_if_overshot(&mut list, 2.0, 50.0, current),
            Some(-30.0)
        );
        assert_eq!(list.distance_to_index_snap(5), 0);
    }

    #[test]
    fn test_cancel_stops_session() {
        let mut list = list_at(400.0);
        let mut session = FlingController::default().start(&list, 1200.0).unwrap();
        session.step(&mut list, Duration::ZERO);
        session.step(&mut list, Duration::from_millis(16));
        let position = list.scroll_position();

        assert!(session.cancel());
        assert!(!session.cancel());
        assert_eq!(session.state(), FlingState::Cancelled);
        assert_eq!(session.current_target(), None);

        let step = session.step(&mut list, Duration::from_millis(32));
        assert_eq!(step.phase, FlingPhase::Idle);
        assert_eq!(list.scroll_position(), position);
    }

    #[test]
    fn test_consume_if_not_at_edge() {
        let start = list_at(0.0);
        assert_eq!(consume_if_not_at_edge(&start, -300.0), -300.0);
        assert_eq!(consume_if_not_at_edge(&start, 300.0), 0.0);

        let end = list_at(1700.0);
        assert_eq!(consume_if_not_at_edge(&end, 300.0), 300.0);
        assert_eq!(consume_if_not_at_edge(&end, -300.0), 0.0);
    }

    #[test]
    fn test_exponential_decay_session() {
        let controller = FlingController::new(Arc::new(crate::physics::ExponentialDecay::default()));
        let mut list = list_at(400.0);
        let mut session = controller.start(&list, 900.0).unwrap();
        let target = session.target_index().unwrap();
        assert!(target > 5);

        run(&mut session, &mut list);
        assert_eq!(list.distance_to_index_snap(target), 0);
    }

    #[test]
    fn test_spline_session_is_debuggable() {
        let session = FlingController::new(Arc::new(SplineDecay::default()))
            .start(&list_at(400.0), 800.0)
            .unwrap();
        assert!(format!("{:?}", session).contains("FlingSession"));
    }
}
