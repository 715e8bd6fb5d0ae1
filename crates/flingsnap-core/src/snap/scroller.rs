//! L3 Molecular Layer: Snapping scroller
//!
//! Owns a scrollable host and at most one in-flight fling. Starting a new
//! fling or touching the host cancels the previous one.

use std::time::Duration;

use super::controller::FlingController;
use super::session::{FlingSession, FlingState, FlingStep};
use super::ScrollSurface;
use crate::error::Result;
use crate::layout::LayoutInfo;

/// Scroll host with fling-to-snap behaviour
///
/// Call `fling()` when the user releases, then `on_frame()` every frame
/// until `is_flinging()` turns false.
#[derive(Debug)]
pub struct SnapScroller<H> {
    host: H,
    controller: FlingController,
    /// Current fling (if any)
    active: Option<FlingSession>,
}

impl<H: LayoutInfo + ScrollSurface> SnapScroller<H> {
    pub fn new(host: H, controller: FlingController) -> Self {
        Self {
            host,
            controller,
            active: None,
        }
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    /// Mutable host access; cancels the running fling
    pub fn host_mut(&mut self) -> &mut H {
        self.cancel();
        &mut self.host
    }

    pub fn controller(&self) -> &FlingController {
        &self.controller
    }

    pub fn set_controller(&mut self, controller: FlingController) {
        self.cancel();
        self.controller = controller;
    }

    /// Release with `velocity`
    ///
    /// Returns [`FlingState::Running`] when frames are needed, otherwise the
    /// immediate result (for example velocity handed back at an edge).
    pub fn fling(&mut self, velocity: f32) -> Result<FlingState> {
        self.cancel();
        let session = self.controller.start(&self.host, velocity)?;
        let state = session.state();
        if session.is_running() {
            self.active = Some(session);
        }
        Ok(state)
    }

    /// Advance the running fling, `None` when idle
    pub fn on_frame(&mut self, frame_time: Duration) -> Option<FlingStep> {
        let session = self.active.as_mut()?;
        let step = session.step(&mut self.host, frame_time);
        if !session.is_running() {
            self.active = None;
        }
        Some(step)
    }

    /// Stop the running fling; returns whether one was running
    pub fn cancel(&mut self) -> bool {
        self.active
            .take()
            .is_some_and(|mut session| session.cancel())
    }

    #[inline]
    pub fn is_flinging(&self) -> bool {
        self.active.is_some()
    }

    /// Index the running fling is heading for
    pub fn current_fling_target(&self) -> Option<usize> {
        self.active.as_ref().and_then(FlingSession::current_target)
    }

    pub fn into_host(self) -> H {
        self.host
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::{ListState, SnapOffset};
    use crate::physics::{FrameClock, VirtualClock};

    fn scroller_at(index: usize) -> SnapScroller<ListState> {
        let mut list = ListState::uniform(20, 100, 300).with_snap_offset(SnapOffset::Center);
        list.scroll_to_index(index);
        SnapScroller::new(list, FlingController::default())
    }

    #[test]
    fn test_fling_runs_to_completion() {
        let mut scroller = scroller_at(5);
        assert_eq!(scroller.fling(1200.0).unwrap(), FlingState::Running);
        assert!(scroller.is_flinging());
        assert_eq!(scroller.current_fling_target(), Some(8));

        let mut clock = VirtualClock::new(60);
        let mut last = None;
        while let Some(step) = scroller.on_frame(clock.next_frame()) {
            last = Some(step);
        }

        assert!(!scroller.is_flinging());
        assert_eq!(scroller.current_fling_target(), None);
        assert_eq!(
            last.unwrap().state,
            FlingState::Finished { velocity_left: 0.0 }
        );
        assert_eq!(scroller.host().distance_to_index_snap(8), 0);
    }

    #[test]
    fn test_new_fling_replaces_running_one() {
        let mut scroller = scroller_at(10);
        let mut clock = VirtualClock::new(60);
        scroller.fling(3000.0).unwrap();
        scroller.on_frame(clock.next_frame());
        scroller.on_frame(clock.next_frame());
        let first_target = scroller.current_fling_target().unwrap();

        scroller.fling(-3000.0).unwrap();
        let second_target = scroller.current_fling_target().unwrap();
        assert!(second_target < first_target);
    }

    #[test]
    fn test_cancel_and_host_mut() {
        let mut scroller = scroller_at(5);
        scroller.fling(1200.0).unwrap();
        assert!(scroller.cancel());
        assert!(!scroller.cancel());
        assert!(scroller.on_frame(Duration::ZERO).is_none());

        scroller.fling(1200.0).unwrap();
        scroller.host_mut().scroll_to(0.0);
        assert!(!scroller.is_flinging());
    }

    #[test]
    fn test_fling_at_edge_is_immediate() {
        let mut scroller = scroller_at(0);
        assert_eq!(
            scroller.fling(-500.0).unwrap(),
            FlingState::Finished {
                velocity_left: -500.0
            }
        );
        assert!(!scroller.is_flinging());
        assert_eq!(scroller.into_host().scroll_position(), 0.0);
    }
}
