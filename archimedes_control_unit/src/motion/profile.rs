//! Stepper ramp profile.
//!
//! A profile is a linear acceleration ramp followed by a constant-speed run.
//! There is no deceleration phase.
//!
//! ```text
//! f ▲
//!   │          ┌──────────────────────── target
//!   │        ┌─┘
//!   │      ┌─┘
//!   │    ┌─┘    ramp_steps
//!   │  ┌─┘
//!   └──┴───────────────────────────────▶ step
//! ```
//!
//! Step `i` of the ramp (1-based) runs at `increment * i`; every step is one
//! HIGH hold and one LOW hold of `1 / (2 * f)` seconds each.

use crate::error::MotionError;
use archimedes_common::consts::{MAX_RAMP_STEPS, MIN_RAMP_STEPS};
use archimedes_common::hal::types::Level;
use archimedes_common::machine::axis::AxisConfig;

/// Step timing for one move. Derived, never mutated.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RampProfile {
    total_steps: u64,
    ramp_steps: u64,
    target_frequency_hz: f64,
    frequency_increment: f64,
}

impl RampProfile {
    /// Compute the profile for `distance_inches` at `rpm` on `axis`.
    ///
    /// # Errors
    /// `InvalidMotionParameter` for a non-positive or non-finite distance or
    /// RPM, a non-positive step frequency, or a distance shorter than half a
    /// step.
    pub fn compute(
        distance_inches: f64,
        rpm: f64,
        axis: &AxisConfig,
    ) -> Result<Self, MotionError> {
        if !(distance_inches.is_finite() && distance_inches > 0.0) {
            return Err(MotionError::invalid(format!(
                "axis {}: distance must be a positive number of inches, got {distance_inches}",
                axis.id
            )));
        }
        if !rpm.is_finite() {
            return Err(MotionError::invalid(format!(
                "axis {}: rpm must be finite, got {rpm}",
                axis.id
            )));
        }

        let steps_per_rev = f64::from(axis.steps_per_revolution);
        let target_frequency_hz = rpm * steps_per_rev / 60.0;
        if !(target_frequency_hz > 0.0) {
            return Err(MotionError::invalid(format!(
                "axis {}: step frequency must be positive (rpm {rpm})",
                axis.id
            )));
        }

        let total_steps = steps_for(distance_inches, axis);
        if total_steps == 0 {
            return Err(MotionError::invalid(format!(
                "axis {}: {distance_inches} in is shorter than one step",
                axis.id
            )));
        }

        let ramp_steps = ((target_frequency_hz * axis.ramp_time_seconds).round() as u64)
            .clamp(MIN_RAMP_STEPS, MAX_RAMP_STEPS)
            .min(total_steps);

        Ok(Self {
            total_steps,
            ramp_steps,
            target_frequency_hz,
            frequency_increment: target_frequency_hz / ramp_steps as f64,
        })
    }

    #[inline]
    pub const fn total_steps(&self) -> u64 {
        self.total_steps
    }

    #[inline]
    pub const fn ramp_steps(&self) -> u64 {
        self.ramp_steps
    }

    /// Steps run at the target frequency.
    #[inline]
    pub const fn constant_steps(&self) -> u64 {
        self.total_steps - self.ramp_steps
    }

    #[inline]
    pub const fn target_frequency_hz(&self) -> f64 {
        self.target_frequency_hz
    }

    #[inline]
    pub const fn frequency_increment(&self) -> f64 {
        self.frequency_increment
    }

    /// Pulse frequency of step `index` (0-based).
    pub fn step_frequency(&self, index: u64) -> f64 {
        if index < self.ramp_steps {
            self.frequency_increment * (index + 1) as f64
        } else {
            self.target_frequency_hz
        }
    }

    /// Half-period of every step, in order. Restartable: each call starts over.
    pub fn half_periods(&self) -> HalfPeriods {
        HalfPeriods {
            profile: *self,
            next: 0,
        }
    }

    /// Alternating `(HIGH, hold)`, `(LOW, hold)` pairs for the step pin.
    pub fn intervals(&self) -> impl Iterator<Item = (Level, f64)> + use<> {
        self.half_periods()
            .flat_map(|half| [(Level::High, half), (Level::Low, half)])
    }

    /// Nominal move time ignoring write latency, seconds.
    pub fn nominal_duration(&self) -> f64 {
        self.half_periods().map(|half| 2.0 * half).sum()
    }
}

/// Steps needed for `distance_inches` on `axis`, rounded to nearest.
pub fn steps_for(distance_inches: f64, axis: &AxisConfig) -> u64 {
    (distance_inches * f64::from(axis.steps_per_revolution) * axis.pitch_per_revolution).round()
        as u64
}

/// Inches covered by `steps` on `axis`.
pub fn inches_for(steps: u64, axis: &AxisConfig) -> f64 {
    steps as f64 / (f64::from(axis.steps_per_revolution) * axis.pitch_per_revolution)
}

/// Iterator over the per-step half-periods of a [`RampProfile`].
#[derive(Debug, Clone)]
pub struct HalfPeriods {
    profile: RampProfile,
    next: u64,
}

impl Iterator for HalfPeriods {
    type Item = f64;

    fn next(&mut self) -> Option<f64> {
        if self.next >= self.profile.total_steps {
            return None;
        }
        let f = self.profile.step_frequency(self.next);
        self.next += 1;
        Some(1.0 / (2.0 * f))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let left = (self.profile.total_steps - self.next) as usize;
        (left, Some(left))
    }
}

impl ExactSizeIterator for HalfPeriods {}
