//! L4 Atomic Layer: Frame timing for fling simulations
//!
//! Hosts deliver monotonically increasing frame times; these helpers turn
//! them into per-phase play time and provide clocks to produce them.

use std::time::{Duration, Instant};

/// Frame interval for a target FPS
#[inline]
pub fn frame_interval(fps: u32) -> Duration {
    if fps == 0 {
        Duration::from_millis(16) // ~60fps fallback
    } else {
        Duration::from_secs(1) / fps
    }
}

/// Play time of one animation phase
///
/// The first frame it sees becomes the phase start, so the first reported
/// play time is always zero. Frame times that go backwards count as no
/// elapsed time.
#[derive(Debug, Clone, Copy, Default)]
pub struct FrameTimer {
    start: Option<Duration>,
    last: Duration,
}

impl FrameTimer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Play time at `frame_time`
    pub fn play_time(&mut self, frame_time: Duration) -> Duration {
        let start = *self.start.get_or_insert(frame_time);
        let frame_time = frame_time.max(self.last).max(start);
        self.last = frame_time;
        frame_time - start
    }

    #[inline]
    pub fn is_started(&self) -> bool {
        self.start.is_some()
    }
}

/// Source of frame times for driving a simulation to completion
pub trait FrameClock {
    /// Time of the next frame
    fn next_frame(&mut self) -> Duration;
}

/// Deterministic clock advancing one fixed interval per frame
#[derive(Debug, Clone)]
pub struct VirtualClock {
    now: Duration,
    interval: Duration,
}

impl VirtualClock {
    pub fn new(fps: u32) -> Self {
        Self::with_interval(frame_interval(fps))
    }

    /// A zero interval falls back to the 60fps default
    pub fn with_interval(interval: Duration) -> Self {
        Self {
            now: Duration::ZERO,
            interval: if interval.is_zero() {
                frame_interval(0)
            } else {
                interval
            },
        }
    }

    /// Time the next frame will report
    pub fn now(&self) -> Duration {
        self.now
    }
}

impl FrameClock for VirtualClock {
    fn next_frame(&mut self) -> Duration {
        let frame = self.now;
        self.now += self.interval;
        frame
    }
}

/// Wall clock measured from its creation
#[derive(Debug, Clone, Copy)]
pub struct MonotonicClock {
    origin: Instant,
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl MonotonicClock {
    pub fn new() -> Self {
        Self::default()
    }
}

impl FrameClock for MonotonicClock {
    fn next_frame(&mut self) -> Duration {
        self.origin.elapsed()
    }
}
