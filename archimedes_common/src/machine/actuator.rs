//! Linear actuator configuration and state.
//!
//! The actuator is an open-loop H-bridge drive: an enable line, a forward and
//! a reverse line, and an optional supply line that stays energized while the
//! machine is up. There is no position feedback; a full stroke is approximated
//! by holding the bridge energized for a calibrated dwell.

use crate::config::ConfigError;
use crate::consts::*;
use crate::hal::types::PinId;
use core::fmt;
use core::str::FromStr;
use serde::{Deserialize, Serialize};

fn default_supply_pin() -> Option<PinId> {
    Some(A_SUPPLY_PIN)
}
fn default_enable_pin() -> PinId {
    A_ENABLE_PIN
}
fn default_forward_pin() -> PinId {
    A_FORWARD_PIN
}
fn default_reverse_pin() -> PinId {
    A_REVERSE_PIN
}
fn default_dwell_seconds() -> f64 {
    A_DWELL_SECONDS
}
fn default_poll_seconds() -> f64 {
    A_POLL_SECONDS
}

/// `[actuator]` section of `machine.toml`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ActuatorConfig {
    /// Supply line raised at bring-up and dropped at shutdown.
    #[serde(default = "default_supply_pin")]
    pub supply_pin: Option<PinId>,
    /// Bridge enable (PWM) line.
    #[serde(default = "default_enable_pin")]
    pub enable_pin: PinId,
    /// Forward line.
    #[serde(default = "default_forward_pin")]
    pub forward_pin: PinId,
    /// Reverse line.
    #[serde(default = "default_reverse_pin")]
    pub reverse_pin: PinId,
    /// Calibrated full-stroke time.
    #[serde(default = "default_dwell_seconds")]
    pub dwell_seconds: f64,
    /// Cancellation polling interval during the dwell.
    #[serde(default = "default_poll_seconds")]
    pub poll_interval_seconds: f64,
}

impl ActuatorConfig {
    /// Output pins driven during a stroke.
    pub fn bridge_pins(&self) -> [PinId; 3] {
        [self.enable_pin, self.forward_pin, self.reverse_pin]
    }

    /// Validate timing values and pin uniqueness.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.dwell_seconds.is_finite() && self.dwell_seconds > 0.0) {
            return Err(ConfigError::ValidationError(format!(
                "actuator: dwell_seconds must be a positive number, got {}",
                self.dwell_seconds
            )));
        }
        if !(self.poll_interval_seconds.is_finite() && self.poll_interval_seconds > 0.0) {
            return Err(ConfigError::ValidationError(format!(
                "actuator: poll_interval_seconds must be a positive number, got {}",
                self.poll_interval_seconds
            )));
        }
        let [enable, forward, reverse] = self.bridge_pins();
        if enable == forward || enable == reverse || forward == reverse {
            return Err(ConfigError::ValidationError(
                "actuator: enable, forward and reverse pins must differ".to_string(),
            ));
        }
        if self.supply_pin.is_some_and(|p| self.bridge_pins().contains(&p)) {
            return Err(ConfigError::ValidationError(
                "actuator: supply_pin overlaps a bridge pin".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for ActuatorConfig {
    fn default() -> Self {
        Self {
            supply_pin: default_supply_pin(),
            enable_pin: default_enable_pin(),
            forward_pin: default_forward_pin(),
            reverse_pin: default_reverse_pin(),
            dwell_seconds: default_dwell_seconds(),
            poll_interval_seconds: default_poll_seconds(),
        }
    }
}

// ─── ActuatorDirection ──────────────────────────────────────────────

/// Stroke direction of the actuator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActuatorDirection {
    /// Push the rod out ("o").
    Extend,
    /// Pull the rod in ("i").
    Retract,
}

impl fmt::Display for ActuatorDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Extend => write!(f, "extend"),
            Self::Retract => write!(f, "retract"),
        }
    }
}

impl FromStr for ActuatorDirection {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "o" | "out" | "extend" => Ok(Self::Extend),
            "i" | "in" | "retract" => Ok(Self::Retract),
            _ => Err(format!(
                "invalid actuator direction {s:?}, use 'o' (extend) or 'i' (retract)"
            )),
        }
    }
}

// ─── ActuatorState ──────────────────────────────────────────────────

/// Last known actuator position.
///
/// `Extending`/`Retracting` persist after an interrupted stroke and mean the
/// rod stopped somewhere in between.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ActuatorState {
    #[default]
    Retracted,
    Extending,
    Extended,
    Retracting,
}

impl ActuatorState {
    /// State while a stroke in `direction` is running.
    pub const fn moving(direction: ActuatorDirection) -> Self {
        match direction {
            ActuatorDirection::Extend => Self::Extending,
            ActuatorDirection::Retract => Self::Retracting,
        }
    }

    /// State after a full stroke in `direction`.
    pub const fn settled(direction: ActuatorDirection) -> Self {
        match direction {
            ActuatorDirection::Extend => Self::Extended,
            ActuatorDirection::Retract => Self::Retracted,
        }
    }

    /// `true` unless the rod is known to be fully in.
    pub const fn needs_retract(self) -> bool {
        !matches!(self, Self::Retracted)
    }
}
