//! Tracked machine position.
//!
//! There are no position sensors. The position is the sum of the steps each
//! axis move actually executed, in inches from home: X=0 at the left, Y=0 at
//! the top, Z=0 with the head raised.

use archimedes_common::machine::axis::{AxisId, Direction};
use core::fmt;

/// Below this an axis counts as being at home.
pub const POSITION_EPSILON: f64 = 1e-6;

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct MachinePosition {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl MachinePosition {
    /// Home position.
    pub const HOME: Self = Self {
        x: 0.0,
        y: 0.0,
        z: 0.0,
    };

    #[inline]
    pub fn get(&self, axis: AxisId) -> f64 {
        match axis {
            AxisId::X => self.x,
            AxisId::Y => self.y,
            AxisId::Z => self.z,
        }
    }

    /// Record `inches` of travel on `axis`.
    pub fn apply(&mut self, axis: AxisId, direction: Direction, inches: f64) {
        let delta = direction.sign() * inches;
        match axis {
            AxisId::X => self.x += delta,
            AxisId::Y => self.y += delta,
            AxisId::Z => self.z += delta,
        }
    }

    /// `true` when the head is below its raised position.
    #[inline]
    pub fn head_lowered(&self) -> bool {
        self.z > POSITION_EPSILON
    }

    pub fn is_home(&self) -> bool {
        AxisId::ALL
            .iter()
            .all(|&axis| self.get(axis).abs() <= POSITION_EPSILON)
    }
}

impl fmt::Display for MachinePosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "X {:.3} Y {:.3} Z {:.3}", self.x, self.y, self.z)
    }
}
