//! Configuration loading traits and types.
//!
//! This module provides the `ConfigLoader` trait used to load TOML files and
//! the `MachineConfig` root that describes the whole cutter.
//!
//! # Usage
//!
//! ```rust,no_run
//! use archimedes_common::config::{load_machine_config, ConfigError};
//! use std::path::Path;
//!
//! fn main() -> Result<(), ConfigError> {
//!     let config = load_machine_config(Path::new("machine.toml"))?;
//!     println!("Service: {}", config.shared.service_name);
//!     Ok(())
//! }
//! ```
//!
//! # TOML Layout
//!
//! ```toml
//! [shared]
//! log_level = "debug"
//! service_name = "archimedes"
//!
//! [hal]
//! driver = "gpiod"
//! chip = "gpiochip0"
//!
//! [travel]
//! max_horizontal = 46.0
//!
//! [actuator]
//! dwell_seconds = 13.0
//! ```
//!
//! Every section is optional and falls back to the factory defaults in
//! [`crate::consts`].

use crate::consts::SERVICE_NAME;
use crate::hal::config::HalConfig;
use crate::hal::types::PinId;
use crate::machine::actuator::ActuatorConfig;
use crate::machine::axis::AxisTable;
use crate::machine::travel::{HeadConfig, TravelLimits};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use static_assertions::assert_impl_all;
use std::path::Path;
use thiserror::Error;
use tracing::debug;

/// Error type for configuration loading operations.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    /// Configuration file not found at specified path.
    #[error("Configuration file not found")]
    FileNotFound,

    /// TOML parsing failed.
    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    /// Semantic validation failed.
    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}

/// Log level for application logging.
///
/// Uses lowercase serde values for TOML compatibility.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Most verbose, includes every pin write.
    Trace,
    /// Per-move parameters.
    Debug,
    /// Macro-steps and lifecycle.
    #[default]
    Info,
    /// Recoverable problems.
    Warn,
    /// Faults.
    Error,
}

impl LogLevel {
    /// Directive string accepted by `tracing_subscriber::EnvFilter`.
    pub const fn as_directive(self) -> &'static str {
        match self {
            Self::Trace => "trace",
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }
}

fn default_service_name() -> String {
    SERVICE_NAME.to_string()
}

/// Common configuration fields (`[shared]`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SharedConfig {
    /// Logging verbosity level.
    #[serde(default)]
    pub log_level: LogLevel,

    /// Application instance identifier.
    #[serde(default = "default_service_name")]
    pub service_name: String,
}

impl SharedConfig {
    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::ValidationError` if `service_name` is empty.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.service_name.is_empty() {
            return Err(ConfigError::ValidationError(
                "service_name cannot be empty".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for SharedConfig {
    fn default() -> Self {
        Self {
            log_level: LogLevel::default(),
            service_name: default_service_name(),
        }
    }
}

/// Trait for loading configuration from TOML files.
///
/// # Contract
///
/// - Returns `ConfigError::FileNotFound` if the file does not exist
/// - Returns `ConfigError::ParseError` if TOML syntax is invalid
pub trait ConfigLoader: Sized + serde::de::DeserializeOwned {
    /// Load configuration from a TOML file.
    fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ConfigError::FileNotFound
            } else {
                ConfigError::ParseError(e.to_string())
            }
        })?;

        toml::from_str(&content).map_err(|e| ConfigError::ParseError(e.to_string()))
    }
}

// Blanket implementation for all types that implement DeserializeOwned.
impl<T: serde::de::DeserializeOwned> ConfigLoader for T {}

// ─── MachineConfig ──────────────────────────────────────────────────

/// Root of `machine.toml`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MachineConfig {
    #[serde(default)]
    pub shared: SharedConfig,
    #[serde(default)]
    pub hal: HalConfig,
    #[serde(default)]
    pub travel: TravelLimits,
    #[serde(default)]
    pub head: HeadConfig,
    #[serde(default)]
    pub axes: AxisTable,
    #[serde(default)]
    pub actuator: ActuatorConfig,
}

// Shared read-only between the worker thread and the operator shell.
assert_impl_all!(MachineConfig: Send, Sync, Clone);

impl MachineConfig {
    /// Parse and validate from a TOML string.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self =
            toml::from_str(content).map_err(|e| ConfigError::ParseError(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Validate every section and check that no pin is assigned twice.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.shared.validate()?;
        self.hal.validate()?;
        self.travel.validate()?;
        self.head.validate()?;
        self.axes.validate()?;
        self.actuator.validate()?;

        let mut owners: HashMap<PinId, String> = HashMap::new();
        for (pin, owner) in self.pin_assignments() {
            if let Some(previous) = owners.insert(pin, owner.clone()) {
                return Err(ConfigError::ValidationError(format!(
                    "pin {pin} assigned to both {previous} and {owner}"
                )));
            }
        }
        Ok(())
    }

    /// Every output pin the machine drives, in a stable order.
    pub fn output_pins(&self) -> Vec<PinId> {
        self.pin_assignments().into_iter().map(|(pin, _)| pin).collect()
    }

    fn pin_assignments(&self) -> Vec<(PinId, String)> {
        let mut pins = Vec::with_capacity(10);
        for axis in self.axes.iter() {
            pins.push((axis.direction_pin, format!("axis {} direction", axis.id)));
            pins.push((axis.step_pin, format!("axis {} step", axis.id)));
        }
        if let Some(supply) = self.actuator.supply_pin {
            pins.push((supply, "actuator supply".to_string()));
        }
        pins.push((self.actuator.enable_pin, "actuator enable".to_string()));
        pins.push((self.actuator.forward_pin, "actuator forward".to_string()));
        pins.push((self.actuator.reverse_pin, "actuator reverse".to_string()));
        pins
    }
}

/// Load and validate `machine.toml`.
pub fn load_machine_config(path: &Path) -> Result<MachineConfig, ConfigError> {
    let config = MachineConfig::load(path)?;
    config.validate()?;
    debug!(
        path = %path.display(),
        driver = %config.hal.driver,
        pins = config.output_pins().len(),
        "machine configuration loaded"
    );
    Ok(config)
}
