//! L4 Atomic Layer: Damped spring simulation
//!
//! Closed-form damped harmonic oscillator released from displacement 0 and
//! converging on a fixed target value.

use std::time::Duration;

use super::decay::finite;
use crate::config::SpringConfig;

/// Upper bound on a spring phase regardless of parameters
pub const MAX_SPRING_DURATION: Duration = Duration::from_secs(10);

/// Velocity threshold as a multiple of the displacement threshold (1000ms / 16ms)
const VELOCITY_THRESHOLD_MULTIPLIER: f32 = 62.5;

/// Spring parameters
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpringSpec {
    pub stiffness: f32,
    /// 1.0 is critically damped; below bounces, above creeps
    pub damping_ratio: f32,
    /// Displacement from the target under which the spring counts as settled
    pub visibility_threshold: f32,
}

impl Default for SpringSpec {
    fn default() -> Self {
        Self {
            stiffness: 400.0,
            damping_ratio: 1.0,
            visibility_threshold: 0.01,
        }
    }
}

impl From<&SpringConfig> for SpringSpec {
    fn from(config: &SpringConfig) -> Self {
        Self {
            stiffness: config.stiffness,
            damping_ratio: config.damping_ratio,
            visibility_threshold: config.visibility_threshold,
        }
    }
}

/// Position and velocity of a spring at one instant
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpringMotion {
    pub value: f32,
    pub velocity: f32,
}

impl SpringSpec {
    /// Motion after `play_time` for a spring released at 0 with
    /// `initial_velocity`, pulled towards `target`
    pub fn motion_at(&self, play_time: Duration, target: f32, initial_velocity: f32) -> SpringMotion {
        let initial_velocity = finite(initial_velocity);
        if play_time.is_zero() {
            return SpringMotion {
                value: 0.0,
                velocity: initial_velocity,
            };
        }

        let t = play_time.as_secs_f64();
        let natural_freq = (self.stiffness as f64).sqrt();
        let damping = self.damping_ratio as f64;
        let displacement0 = -(target as f64);
        let velocity0 = initial_velocity as f64;
        let r = -damping * natural_freq;

        let (displacement, velocity) = if damping > 1.0 {
            let s = natural_freq * (damping * damping - 1.0).sqrt();
            let gamma_plus = r + s;
            let gamma_minus = r - s;
            let coeff_b = (gamma_minus * displacement0 - velocity0) / (gamma_minus - gamma_plus);
            let coeff_a = displacement0 - coeff_b;
            let exp_minus = (gamma_minus * t).exp();
            let exp_plus = (gamma_plus * t).exp();
            (
                coeff_a * exp_minus + coeff_b * exp_plus,
                coeff_a * gamma_minus * exp_minus + coeff_b * gamma_plus * exp_plus,
            )
        } else if damping == 1.0 {
            let coeff_a = displacement0;
            let coeff_b = velocity0 + natural_freq * displacement0;
            let decay = (-natural_freq * t).exp();
            (
                (coeff_a + coeff_b * t) * decay,
                (velocity0 - natural_freq * coeff_b * t) * decay,
            )
        } else {
            let damped_freq = natural_freq * (1.0 - damping * damping).sqrt();
            let cos_coeff = displacement0;
            let sin_coeff = (-r * displacement0 + velocity0) / damped_freq;
            let angle = damped_freq * t;
            let envelope = (r * t).exp();
            // Derivative with r * cos_coeff + damped_freq * sin_coeff folded into velocity0
            let sin_rate = r * sin_coeff - damped_freq * cos_coeff;
            (
                envelope * (cos_coeff * angle.cos() + sin_coeff * angle.sin()),
                envelope * (velocity0 * angle.cos() + sin_rate * angle.sin()),
            )
        };

        SpringMotion {
            value: (displacement + target as f64) as f32,
            velocity: velocity as f32,
        }
    }

    /// Whether the spring is close enough to `target` to stop
    pub fn is_settled(&self, motion: SpringMotion, target: f32) -> bool {
        (motion.value - target).abs() <= self.visibility_threshold
            && motion.velocity.abs() <= self.visibility_threshold * VELOCITY_THRESHOLD_MULTIPLIER
    }
}
