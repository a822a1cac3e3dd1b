//! HAL configuration (`[hal]` section of `machine.toml`).
//!
//! Machine pins are header positions. The "gpiod" driver translates each one
//! to a line offset on `chip` through `line_map`; a pin missing from the map
//! cannot be claimed.

use crate::config::ConfigError;
use crate::consts::{DEFAULT_DRIVER, DEFAULT_GPIO_CHIP, HEADER_LINES};
use crate::hal::types::PinId;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

fn default_driver() -> String {
    DEFAULT_DRIVER.to_string()
}

fn default_chip() -> String {
    DEFAULT_GPIO_CHIP.to_string()
}

fn default_line_map() -> Vec<LineMapping> {
    HEADER_LINES
        .iter()
        .map(|&(pin, line)| LineMapping { pin, line })
        .collect()
}

/// One header pin and the chip line wired to it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LineMapping {
    /// Header position used in the axis and actuator sections.
    pub pin: PinId,
    /// Line offset on the GPIO chip.
    pub line: u32,
}

/// Output driver selection and driver-specific settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HalConfig {
    /// Name of the output driver ("simulation" or "gpiod").
    #[serde(default = "default_driver")]
    pub driver: String,

    /// GPIO character device, as a name under `/dev` or an absolute path.
    #[serde(default = "default_chip")]
    pub chip: String,

    /// Header pin to line offset table. Replaces the built-in board table
    /// when given.
    #[serde(default = "default_line_map")]
    pub line_map: Vec<LineMapping>,
}

impl HalConfig {
    /// Chip line wired to header `pin`, if mapped.
    pub fn line_for(&self, pin: PinId) -> Option<u32> {
        self.line_map.iter().find(|m| m.pin == pin).map(|m| m.line)
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::ValidationError` if the chip is empty, or if a
    /// header pin or a line appears twice in `line_map`.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.chip.is_empty() {
            return Err(ConfigError::ValidationError(
                "hal.chip cannot be empty".to_string(),
            ));
        }
        let mut pins = HashMap::new();
        let mut lines = HashMap::new();
        for m in &self.line_map {
            if pins.insert(m.pin, m.line).is_some() {
                return Err(ConfigError::ValidationError(format!(
                    "hal.line_map lists header pin {} twice",
                    m.pin
                )));
            }
            if let Some(other) = lines.insert(m.line, m.pin) {
                return Err(ConfigError::ValidationError(format!(
                    "hal.line_map wires line {} to header pins {other} and {}",
                    m.line, m.pin
                )));
            }
        }
        Ok(())
    }
}

impl Default for HalConfig {
    fn default() -> Self {
        Self {
            driver: default_driver(),
            chip: default_chip(),
            line_map: default_line_map(),
        }
    }
}
