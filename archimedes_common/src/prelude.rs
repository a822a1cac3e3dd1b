//! Prelude module for common re-exports.
//!
//! ```rust
//! use archimedes_common::prelude::*;
//! ```

// ─── Configuration ──────────────────────────────────────────────────
pub use crate::config::{
    ConfigError, ConfigLoader, LogLevel, MachineConfig, SharedConfig, load_machine_config,
};

// ─── HAL ────────────────────────────────────────────────────────────
pub use crate::hal::config::{HalConfig, LineMapping};
pub use crate::hal::driver::{DriverDiagnostics, DriverFactory, HalError, OutputDriver};
pub use crate::hal::types::{Level, PinId};

// ─── Machine ────────────────────────────────────────────────────────
pub use crate::machine::actuator::{ActuatorConfig, ActuatorDirection, ActuatorState};
pub use crate::machine::axis::{AxisConfig, AxisId, AxisTable, Direction};
pub use crate::machine::travel::{HeadConfig, TravelLimits};

// ─── Cutter ─────────────────────────────────────────────────────────
pub use crate::cutter::request::{CutDimension, CutRequest, CutSizeError};
pub use crate::cutter::state::CutPhase;
