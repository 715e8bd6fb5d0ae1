//! L4 Atomic Layer: Decay models for free-scrolling flings
//!
//! A decay model answers how far a released velocity carries when nothing
//! constrains it, and where along that path an animation is after a given
//! play time.

use std::fmt::Debug;
use std::sync::{Arc, OnceLock};
use std::time::Duration;

use crate::config::{DecayConfig, DecayKind};

/// Projection of a released velocity decelerating to rest
pub trait DecayModel: Debug + Send + Sync {
    /// Displacement travelled after `play_time`
    fn value_at(&self, play_time: Duration, initial_velocity: f32) -> f32;

    /// Velocity after `play_time`
    fn velocity_at(&self, play_time: Duration, initial_velocity: f32) -> f32;

    /// Time until the decay comes to rest
    fn duration(&self, initial_velocity: f32) -> Duration;

    /// Total unconstrained displacement for `initial_velocity`
    fn target_value(&self, initial_velocity: f32) -> f32;
}

/// Build the decay model selected in the configuration
pub fn from_config(config: &DecayConfig) -> Arc<dyn DecayModel> {
    match config.kind {
        DecayKind::Spline => Arc::new(SplineDecay::new(config.scroll_friction, config.density)),
        DecayKind::Exponential => Arc::new(ExponentialDecay::new(
            config.friction_multiplier,
            config.velocity_threshold,
        )),
    }
}

const INFLECTION: f32 = 0.35;
const START_TENSION: f32 = 0.5;
const END_TENSION: f32 = 1.0;
const P1: f32 = INFLECTION * START_TENSION;
const P2: f32 = 1.0 - END_TENSION * (1.0 - INFLECTION);
const SAMPLES: usize = 100;
const MAX_BISECTIONS: usize = 64;

const GRAVITY_EARTH: f32 = 9.80665;
const INCHES_PER_METER: f32 = 39.37;
const PHYSICAL_FRICTION: f32 = 0.84;
const DEFAULT_SCROLL_FRICTION: f32 = 0.015;

/// `ln(0.78) / ln(0.9)`
fn deceleration_rate() -> f64 {
    0.78_f64.ln() / 0.9_f64.ln()
}

fn spline_positions() -> &'static [f32; SAMPLES + 1] {
    static POSITIONS: OnceLock<[f32; SAMPLES + 1]> = OnceLock::new();
    POSITIONS.get_or_init(compute_spline_positions)
}

fn compute_spline_positions() -> [f32; SAMPLES + 1] {
    let mut positions = [0.0; SAMPLES + 1];
    let mut x_min = 0.0_f32;

    for (i, slot) in positions.iter_mut().take(SAMPLES).enumerate() {
        let alpha = i as f32 / SAMPLES as f32;
        let mut x_max = 1.0_f32;
        let mut x = 0.0;
        let mut coef = 0.0;

        for _ in 0..MAX_BISECTIONS {
            x = x_min + (x_max - x_min) / 2.0;
            coef = 3.0 * x * (1.0 - x);
            let tx = coef * ((1.0 - x) * P1 + x * P2) + x * x * x;
            if (tx - alpha).abs() < 1e-5 {
                break;
            }
            if tx > alpha {
                x_max = x;
            } else {
                x_min = x;
            }
        }

        *slot = coef * ((1.0 - x) * START_TENSION + x) + x * x * x;
    }

    positions[0] = 0.0;
    positions[SAMPLES] = 1.0;
    positions
}

/// Distance and velocity coefficients at normalized fling time `t`
fn spline_position(t: f32) -> (f32, f32) {
    let positions = spline_positions();
    let index = (SAMPLES as f32 * t) as usize;
    if index >= SAMPLES {
        return (1.0, 0.0);
    }

    let t_inf = index as f32 / SAMPLES as f32;
    let t_sup = (index + 1) as f32 / SAMPLES as f32;
    let d_inf = positions[index];
    let d_sup = positions[index + 1];
    let velocity_coef = (d_sup - d_inf) / (t_sup - t_inf);
    (d_inf + (t - t_inf) * velocity_coef, velocity_coef)
}

/// The platform fling curve: a spline eased towards a physically derived
/// distance and duration
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SplineDecay {
    friction: f32,
    physical_coefficient: f32,
}

impl Default for SplineDecay {
    fn default() -> Self {
        Self::new(DEFAULT_SCROLL_FRICTION, 1.0)
    }
}

impl SplineDecay {
    pub fn new(scroll_friction: f32, density: f32) -> Self {
        Self {
            friction: scroll_friction,
            physical_coefficient: GRAVITY_EARTH
                * INCHES_PER_METER
                * density
                * 160.0
                * PHYSICAL_FRICTION,
        }
    }

    fn spline_deceleration(&self, velocity: f32) -> f64 {
        let friction = (self.friction * self.physical_coefficient) as f64;
        (INFLECTION as f64 * velocity.abs() as f64 / friction).ln()
    }

    /// Time the fling takes to stop
    pub fn fling_duration(&self, velocity: f32) -> Duration {
        if velocity == 0.0 {
            return Duration::ZERO;
        }
        let l = self.spline_deceleration(velocity);
        let secs = (l / (deceleration_rate() - 1.0)).exp();
        Duration::try_from_secs_f64(secs).unwrap_or(Duration::MAX)
    }

    /// Unsigned distance the fling travels
    pub fn fling_distance(&self, velocity: f32) -> f32 {
        if velocity == 0.0 {
            return 0.0;
        }
        let l = self.spline_deceleration(velocity);
        let rate = deceleration_rate();
        let friction = (self.friction * self.physical_coefficient) as f64;
        (friction * (rate / (rate - 1.0) * l).exp()).min(f32::MAX as f64) as f32
    }

    fn progress(&self, play_time: Duration, initial_velocity: f32) -> Option<(f32, f32, f32)> {
        let duration = self.fling_duration(initial_velocity);
        if duration.is_zero() {
            return None;
        }
        let t = (play_time.as_secs_f64() / duration.as_secs_f64()) as f32;
        let (distance_coef, velocity_coef) = spline_position(t);
        Some((distance_coef, velocity_coef, duration.as_secs_f32()))
    }
}

impl DecayModel for SplineDecay {
    fn value_at(&self, play_time: Duration, initial_velocity: f32) -> f32 {
        match self.progress(play_time, initial_velocity) {
            Some((distance_coef, _, _)) => {
                initial_velocity.signum() * self.fling_distance(initial_velocity) * distance_coef
            }
            None => 0.0,
        }
    }

    fn velocity_at(&self, play_time: Duration, initial_velocity: f32) -> f32 {
        match self.progress(play_time, initial_velocity) {
            Some((_, velocity_coef, duration_secs)) => {
                let velocity = velocity_coef as f64 * self.fling_distance(initial_velocity) as f64
                    / duration_secs as f64;
                initial_velocity.signum() * velocity.min(f32::MAX as f64) as f32
            }
            None => 0.0,
        }
    }

    fn duration(&self, initial_velocity: f32) -> Duration {
        self.fling_duration(initial_velocity)
    }

    fn target_value(&self, initial_velocity: f32) -> f32 {
        if initial_velocity == 0.0 {
            return 0.0;
        }
        initial_velocity.signum() * self.fling_distance(initial_velocity)
    }
}

const EXPONENTIAL_FRICTION: f32 = -4.2;

/// Velocity decays as `v * e^(f t)` until it drops under a threshold
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExponentialDecay {
    friction: f32,
    abs_velocity_threshold: f32,
}

impl Default for ExponentialDecay {
    fn default() -> Self {
        Self::new(1.0, 0.1)
    }
}

impl ExponentialDecay {
    pub fn new(friction_multiplier: f32, abs_velocity_threshold: f32) -> Self {
        Self {
            friction: EXPONENTIAL_FRICTION * friction_multiplier.max(f32::MIN_POSITIVE),
            abs_velocity_threshold: abs_velocity_threshold.max(f32::MIN_POSITIVE),
        }
    }
}

impl DecayModel for ExponentialDecay {
    fn value_at(&self, play_time: Duration, initial_velocity: f32) -> f32 {
        if play_time.is_zero() {
            return 0.0;
        }
        let t = play_time.as_secs_f32();
        finite(initial_velocity) / self.friction * ((self.friction * t).exp() - 1.0)
    }

    fn velocity_at(&self, play_time: Duration, initial_velocity: f32) -> f32 {
        finite(initial_velocity) * (self.friction * play_time.as_secs_f32()).exp()
    }

    fn duration(&self, initial_velocity: f32) -> Duration {
        let speed = finite(initial_velocity).abs();
        if speed <= self.abs_velocity_threshold {
            return Duration::ZERO;
        }
        let secs = (self.abs_velocity_threshold / speed).ln() / self.friction;
        Duration::try_from_secs_f32(secs).unwrap_or(Duration::MAX)
    }

    fn target_value(&self, initial_velocity: f32) -> f32 {
        if initial_velocity.abs() <= self.abs_velocity_threshold {
            return 0.0;
        }
        self.value_at(self.duration(initial_velocity), initial_velocity)
    }
}

/// Infinite velocities behave like the largest finite one
pub(crate) fn finite(velocity: f32) -> f32 {
    velocity.clamp(f32::MIN, f32::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spline_table_boundaries() {
        let positions = spline_positions();
        assert_eq!(positions[0], 0.0);
        assert!((positions[SAMPLES] - 1.0).abs() < f32::EPSILON);
        for pair in positions.windows(2) {
            assert!(pair[1] >= pair[0], "spline table must be monotonic");
        }
    }

    #[test]
    fn test_spline_distance_and_duration() {
        let decay = SplineDecay::default();
        let distance = decay.target_value(1200.0);
        assert!((distance - 266.6).abs() < 1.0, "distance was {}", distance);

        let duration = decay.duration(1200.0);
        assert!(
            (duration.as_secs_f32() - 0.635).abs() < 0.01,
            "duration was {:?}",
            duration
        );

        assert!((decay.target_value(-1200.0) + distance).abs() < 0.001);
        assert_eq!(decay.target_value(0.0), 0.0);
        assert_eq!(decay.duration(0.0), Duration::ZERO);
    }

    #[test]
    fn test_first_instant_has_no_displacement() {
        let spline = SplineDecay::default();
        assert_eq!(spline.value_at(Duration::ZERO, 1200.0), 0.0);
        assert_eq!(spline.value_at(Duration::ZERO, -8000.0), 0.0);

        let exponential = ExponentialDecay::default();
        assert_eq!(exponential.value_at(Duration::ZERO, f32::INFINITY), 0.0);
    }

    #[test]
    fn test_extreme_velocity_durations_saturate() {
        let spline = SplineDecay::default();
        assert_eq!(spline.duration(1.0e30), Duration::MAX);
        assert_eq!(spline.duration(f32::INFINITY), Duration::MAX);
        assert_eq!(spline.target_value(f32::INFINITY), f32::MAX);
        let velocity = spline.velocity_at(Duration::from_millis(16), f32::MAX);
        assert!(velocity.is_finite() && velocity > 0.0);

        let exponential = ExponentialDecay::default();
        assert_eq!(exponential.duration(f32::INFINITY), exponential.duration(f32::MAX));
        assert!(exponential.target_value(f32::NEG_INFINITY).is_finite());
        assert!(exponential.velocity_at(Duration::from_millis(16), f32::INFINITY).is_finite());

        let frictionless = ExponentialDecay::new(f32::MIN_POSITIVE, 0.1);
        assert_eq!(frictionless.duration(1.0e30), Duration::MAX);
    }

    #[test]
    fn test_spline_reaches_target() {
        let decay = SplineDecay::default();
        let end = decay.duration(3000.0);
        let value = decay.value_at(end, 3000.0);
        assert!((value - decay.target_value(3000.0)).abs() < 0.01);
        assert_eq!(decay.velocity_at(end, 3000.0), 0.0);
    }

    #[test]
    fn test_spline_monotonic() {
        let decay = SplineDecay::default();
        let mut prev = 0.0;
        for frame in 0..=60 {
            let value = decay.value_at(Duration::from_millis(frame * 16), 2000.0);
            assert!(value >= prev, "not monotonic at frame {}", frame);
            prev = value;
        }
    }

    #[test]
    fn test_exponential_target() {
        let decay = ExponentialDecay::default();
        let target = decay.target_value(1000.0);
        assert!((target - (1000.0 - 0.1) / 4.2).abs() < 0.5, "target was {}", target);
        assert!(decay.target_value(-1000.0) < 0.0);
        assert_eq!(decay.target_value(0.05), 0.0);
    }

    #[test]
    fn test_exponential_velocity_decays() {
        let decay = ExponentialDecay::default();
        let early = decay.velocity_at(Duration::from_millis(16), 800.0);
        let late = decay.velocity_at(Duration::from_millis(500), 800.0);
        assert!(early < 800.0 && late < early && late > 0.0);
    }

    #[test]
    fn test_from_config() {
        let mut config = DecayConfig::default();
        let spline = from_config(&config);
        assert!((spline.target_value(1200.0) - 266.6).abs() < 1.0);

        config.kind = DecayKind::Exponential;
        let exponential = from_config(&config);
        assert!(exponential.target_value(1200.0) > 280.0);
    }
}
