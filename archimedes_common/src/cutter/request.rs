//! Cut requests handed over by the operator shell.

use crate::machine::travel::TravelLimits;
use core::fmt;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Cut dimension that failed the range check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CutDimension {
    Horizontal,
    Vertical,
}

impl fmt::Display for CutDimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Horizontal => write!(f, "horizontal"),
            Self::Vertical => write!(f, "vertical"),
        }
    }
}

/// A cut dimension outside the configured travel.
#[derive(Debug, Clone, Copy, PartialEq, Error)]
#[error("{dimension} cut of {value} in is outside {min}..={max} in")]
pub struct CutSizeError {
    pub dimension: CutDimension,
    pub value: f64,
    pub min: f64,
    pub max: f64,
}

/// Requested panel size, inches.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CutRequest {
    /// Width of the finished panel (X).
    pub horizontal_inches: f64,
    /// Height of the finished panel (Y).
    pub vertical_inches: f64,
}

impl CutRequest {
    pub fn new(horizontal_inches: f64, vertical_inches: f64) -> Self {
        Self {
            horizontal_inches,
            vertical_inches,
        }
    }

    /// Check both dimensions against the configured limits.
    ///
    /// NaN and infinities are rejected as out of range.
    pub fn check(&self, limits: &TravelLimits) -> Result<(), CutSizeError> {
        check_dimension(
            CutDimension::Horizontal,
            self.horizontal_inches,
            limits.min_horizontal,
            limits.max_horizontal,
        )?;
        check_dimension(
            CutDimension::Vertical,
            self.vertical_inches,
            limits.min_vertical,
            limits.max_vertical,
        )
    }
}

fn check_dimension(
    dimension: CutDimension,
    value: f64,
    min: f64,
    max: f64,
) -> Result<(), CutSizeError> {
    if value.is_finite() && (min..=max).contains(&value) {
        Ok(())
    } else {
        Err(CutSizeError {
            dimension,
            value,
            min,
            max,
        })
    }
}
