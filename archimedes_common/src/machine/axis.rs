//! Stepper axis configuration.
//!
//! Each axis is a step/direction stepper driver. `AxisConfig` carries the pin
//! pair, the conversion constants from inches to steps, the ramp time and the
//! operator direction codes. `AxisTable` holds exactly one config per axis and
//! is the `[axes]` section of `machine.toml`:
//!
//! ```toml
//! [axes.x]
//! direction_pin = 11
//! step_pin = 13
//! steps_per_revolution = 200
//! pitch_per_revolution = 4.0
//! ramp_time_seconds = 3.0
//! rpm = 200.0
//! positive_code = "r"
//! negative_code = "l"
//! ```

use crate::config::ConfigError;
use crate::consts::*;
use crate::hal::types::{Level, PinId};
use core::fmt;
use core::str::FromStr;
use serde::{Deserialize, Serialize};

// ─── AxisId ─────────────────────────────────────────────────────────

/// Machine axis identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AxisId {
    /// Horizontal carriage.
    X,
    /// Vertical carriage.
    Y,
    /// Cutting head plunge.
    Z,
}

impl AxisId {
    /// All axes in table order.
    pub const ALL: [AxisId; 3] = [AxisId::X, AxisId::Y, AxisId::Z];
}

impl fmt::Display for AxisId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::X => write!(f, "x"),
            Self::Y => write!(f, "y"),
            Self::Z => write!(f, "z"),
        }
    }
}

impl FromStr for AxisId {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "x" | "X" => Ok(Self::X),
            "y" | "Y" => Ok(Self::Y),
            "z" | "Z" => Ok(Self::Z),
            _ => Err(format!("unknown axis: {s:?}, expected x, y or z")),
        }
    }
}

// ─── Direction ──────────────────────────────────────────────────────

/// Travel direction along an axis.
///
/// Positive moves away from home: X right, Y down, Z lowers the head.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    Positive,
    Negative,
}

impl Direction {
    /// Sign multiplier for position bookkeeping.
    #[inline]
    pub const fn sign(self) -> f64 {
        match self {
            Self::Positive => 1.0,
            Self::Negative => -1.0,
        }
    }
}

// ─── AxisConfig ─────────────────────────────────────────────────────

/// Static configuration of one stepper axis. Immutable after load.
#[derive(Debug, Clone, PartialEq)]
pub struct AxisConfig {
    /// Axis this entry belongs to.
    pub id: AxisId,
    /// Direction input of the stepper driver.
    pub direction_pin: PinId,
    /// Step input of the stepper driver.
    pub step_pin: PinId,
    /// Steps per motor revolution (including microstepping).
    pub steps_per_revolution: u32,
    /// Motor revolutions per inch of carriage travel.
    pub pitch_per_revolution: f64,
    /// Nominal duration of the acceleration ramp.
    pub ramp_time_seconds: f64,
    /// Default travel speed.
    pub rpm: f64,
    /// Direction pin level for `Direction::Positive`.
    pub positive_level: Level,
    /// Operator code for `Direction::Positive` (e.g. "r" for right).
    pub positive_code: String,
    /// Operator code for `Direction::Negative` (e.g. "l" for left).
    pub negative_code: String,
}

impl AxisConfig {
    /// Factory configuration of the X carriage.
    pub fn default_x() -> Self {
        Self::from_settings(AxisId::X, AxisSettings::default_x())
    }

    /// Factory configuration of the Y carriage.
    pub fn default_y() -> Self {
        Self::from_settings(AxisId::Y, AxisSettings::default_y())
    }

    /// Factory configuration of the cutting head.
    pub fn default_z() -> Self {
        Self::from_settings(AxisId::Z, AxisSettings::default_z())
    }

    /// Direction pin level for a travel direction.
    #[inline]
    pub fn level_for(&self, direction: Direction) -> Level {
        match direction {
            Direction::Positive => self.positive_level,
            Direction::Negative => self.positive_level.inverse(),
        }
    }

    /// Resolve an operator direction code (case-insensitive).
    pub fn direction_for_code(&self, code: &str) -> Option<Direction> {
        if code.eq_ignore_ascii_case(&self.positive_code) {
            Some(Direction::Positive)
        } else if code.eq_ignore_ascii_case(&self.negative_code) {
            Some(Direction::Negative)
        } else {
            None
        }
    }

    /// Validate conversion constants, pins and direction codes.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let axis = self.id;
        if self.steps_per_revolution == 0 {
            return Err(ConfigError::ValidationError(format!(
                "axis {axis}: steps_per_revolution must be greater than 0"
            )));
        }
        if !(self.pitch_per_revolution.is_finite() && self.pitch_per_revolution > 0.0) {
            return Err(ConfigError::ValidationError(format!(
                "axis {axis}: pitch_per_revolution must be a positive number, got {}",
                self.pitch_per_revolution
            )));
        }
        if !(self.ramp_time_seconds.is_finite() && self.ramp_time_seconds >= 0.0) {
            return Err(ConfigError::ValidationError(format!(
                "axis {axis}: ramp_time_seconds must be >= 0, got {}",
                self.ramp_time_seconds
            )));
        }
        if !(self.rpm.is_finite() && self.rpm > 0.0) {
            return Err(ConfigError::ValidationError(format!(
                "axis {axis}: rpm must be a positive number, got {}",
                self.rpm
            )));
        }
        if self.direction_pin == self.step_pin {
            return Err(ConfigError::ValidationError(format!(
                "axis {axis}: direction_pin and step_pin are both {}",
                self.step_pin
            )));
        }
        if self.positive_code.is_empty() || self.negative_code.is_empty() {
            return Err(ConfigError::ValidationError(format!(
                "axis {axis}: direction codes cannot be empty"
            )));
        }
        if self.positive_code.eq_ignore_ascii_case(&self.negative_code) {
            return Err(ConfigError::ValidationError(format!(
                "axis {axis}: positive_code and negative_code are both {:?}",
                self.positive_code
            )));
        }
        Ok(())
    }

    fn from_settings(id: AxisId, s: AxisSettings) -> Self {
        Self {
            id,
            direction_pin: s.direction_pin,
            step_pin: s.step_pin,
            steps_per_revolution: s.steps_per_revolution,
            pitch_per_revolution: s.pitch_per_revolution,
            ramp_time_seconds: s.ramp_time_seconds,
            rpm: s.rpm,
            positive_level: s.positive_level,
            positive_code: s.positive_code,
            negative_code: s.negative_code,
        }
    }
}

/// On-disk form of an axis entry; the id comes from the table key.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct AxisSettings {
    direction_pin: PinId,
    step_pin: PinId,
    steps_per_revolution: u32,
    pitch_per_revolution: f64,
    ramp_time_seconds: f64,
    rpm: f64,
    #[serde(default = "default_positive_level")]
    positive_level: Level,
    positive_code: String,
    negative_code: String,
}

fn default_positive_level() -> Level {
    Level::High
}

impl AxisSettings {
    fn default_x() -> Self {
        Self {
            direction_pin: X_DIR_PIN,
            step_pin: X_STEP_PIN,
            steps_per_revolution: X_STEPS_PER_REV,
            pitch_per_revolution: X_PITCH,
            ramp_time_seconds: X_RAMP_TIME,
            rpm: X_RPM,
            positive_level: Level::High,
            positive_code: "r".to_string(),
            negative_code: "l".to_string(),
        }
    }

    fn default_y() -> Self {
        Self {
            direction_pin: Y_DIR_PIN,
            step_pin: Y_STEP_PIN,
            steps_per_revolution: Y_STEPS_PER_REV,
            pitch_per_revolution: Y_PITCH,
            ramp_time_seconds: Y_RAMP_TIME,
            rpm: Y_RPM,
            positive_level: Level::High,
            positive_code: "d".to_string(),
            negative_code: "u".to_string(),
        }
    }

    fn default_z() -> Self {
        Self {
            direction_pin: Z_DIR_PIN,
            step_pin: Z_STEP_PIN,
            steps_per_revolution: Z_STEPS_PER_REV,
            pitch_per_revolution: Z_PITCH,
            ramp_time_seconds: Z_RAMP_TIME,
            rpm: Z_RPM,
            positive_level: Level::High,
            positive_code: "i".to_string(),
            negative_code: "o".to_string(),
        }
    }
}

impl From<AxisConfig> for AxisSettings {
    fn from(c: AxisConfig) -> Self {
        Self {
            direction_pin: c.direction_pin,
            step_pin: c.step_pin,
            steps_per_revolution: c.steps_per_revolution,
            pitch_per_revolution: c.pitch_per_revolution,
            ramp_time_seconds: c.ramp_time_seconds,
            rpm: c.rpm,
            positive_level: c.positive_level,
            positive_code: c.positive_code,
            negative_code: c.negative_code,
        }
    }
}

// ─── AxisTable ──────────────────────────────────────────────────────

/// One configuration per axis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "AxisTableFile", into = "AxisTableFile")]
pub struct AxisTable {
    x: AxisConfig,
    y: AxisConfig,
    z: AxisConfig,
}

impl AxisTable {
    /// Build a table from three configs; ids are taken from the slots.
    pub fn new(mut x: AxisConfig, mut y: AxisConfig, mut z: AxisConfig) -> Self {
        x.id = AxisId::X;
        y.id = AxisId::Y;
        z.id = AxisId::Z;
        Self { x, y, z }
    }

    /// Configuration of one axis.
    #[inline]
    pub fn get(&self, id: AxisId) -> &AxisConfig {
        match id {
            AxisId::X => &self.x,
            AxisId::Y => &self.y,
            AxisId::Z => &self.z,
        }
    }

    /// Iterate in X, Y, Z order.
    pub fn iter(&self) -> impl Iterator<Item = &AxisConfig> {
        [&self.x, &self.y, &self.z].into_iter()
    }

    /// Validate every axis.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.iter().try_for_each(AxisConfig::validate)
    }
}

impl Default for AxisTable {
    fn default() -> Self {
        Self::new(
            AxisConfig::default_x(),
            AxisConfig::default_y(),
            AxisConfig::default_z(),
        )
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct AxisTableFile {
    #[serde(default = "AxisSettings::default_x")]
    x: AxisSettings,
    #[serde(default = "AxisSettings::default_y")]
    y: AxisSettings,
    #[serde(default = "AxisSettings::default_z")]
    z: AxisSettings,
}

impl From<AxisTableFile> for AxisTable {
    fn from(file: AxisTableFile) -> Self {
        Self {
            x: AxisConfig::from_settings(AxisId::X, file.x),
            y: AxisConfig::from_settings(AxisId::Y, file.y),
            z: AxisConfig::from_settings(AxisId::Z, file.z),
        }
    }
}

impl From<AxisTable> for AxisTableFile {
    fn from(table: AxisTable) -> Self {
        Self {
            x: table.x.into(),
            y: table.y.into(),
            z: table.z.into(),
        }
    }
}
