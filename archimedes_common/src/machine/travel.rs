//! Travel limits and head settings.

use crate::config::ConfigError;
use crate::consts::{HEAD_JOG, MAX_HORIZONTAL, MAX_VERTICAL, MIN_HORIZONTAL, MIN_VERTICAL};
use serde::{Deserialize, Serialize};

fn default_max_horizontal() -> f64 {
    MAX_HORIZONTAL
}
fn default_max_vertical() -> f64 {
    MAX_VERTICAL
}
fn default_min_horizontal() -> f64 {
    MIN_HORIZONTAL
}
fn default_min_vertical() -> f64 {
    MIN_VERTICAL
}
fn default_jog() -> f64 {
    HEAD_JOG
}

/// `[travel]` section: usable carriage travel and accepted cut sizes, inches.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TravelLimits {
    #[serde(default = "default_max_horizontal")]
    pub max_horizontal: f64,
    #[serde(default = "default_max_vertical")]
    pub max_vertical: f64,
    #[serde(default = "default_min_horizontal")]
    pub min_horizontal: f64,
    #[serde(default = "default_min_vertical")]
    pub min_vertical: f64,
}

impl TravelLimits {
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, value) in [
            ("max_horizontal", self.max_horizontal),
            ("max_vertical", self.max_vertical),
            ("min_horizontal", self.min_horizontal),
            ("min_vertical", self.min_vertical),
        ] {
            if !(value.is_finite() && value > 0.0) {
                return Err(ConfigError::ValidationError(format!(
                    "travel: {name} must be a positive number, got {value}"
                )));
            }
        }
        if self.min_horizontal > self.max_horizontal {
            return Err(ConfigError::ValidationError(format!(
                "travel: min_horizontal ({}) exceeds max_horizontal ({})",
                self.min_horizontal, self.max_horizontal
            )));
        }
        if self.min_vertical > self.max_vertical {
            return Err(ConfigError::ValidationError(format!(
                "travel: min_vertical ({}) exceeds max_vertical ({})",
                self.min_vertical, self.max_vertical
            )));
        }
        Ok(())
    }
}

impl Default for TravelLimits {
    fn default() -> Self {
        Self {
            max_horizontal: MAX_HORIZONTAL,
            max_vertical: MAX_VERTICAL,
            min_horizontal: MIN_HORIZONTAL,
            min_vertical: MIN_VERTICAL,
        }
    }
}

/// `[head]` section.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HeadConfig {
    /// Plunge depth of the cutting head.
    #[serde(default = "default_jog")]
    pub jog_inches: f64,
}

impl HeadConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.jog_inches.is_finite() && self.jog_inches > 0.0) {
            return Err(ConfigError::ValidationError(format!(
                "head: jog_inches must be a positive number, got {}",
                self.jog_inches
            )));
        }
        Ok(())
    }
}

impl Default for HeadConfig {
    fn default() -> Self {
        Self { jog_inches: HEAD_JOG }
    }
}
