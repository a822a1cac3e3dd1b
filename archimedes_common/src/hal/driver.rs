//! Output driver trait and error types.
//!
//! This module defines:
//! - `OutputDriver` trait - Interface for pluggable digital output backends
//! - `HalError` enum - Error types for HAL operations
//! - `DriverFactory` type alias - Factory function type
//! - `DriverDiagnostics` struct - Optional driver diagnostics

use crate::hal::config::HalConfig;
use crate::hal::types::{Level, PinId};
use thiserror::Error;

/// Error types for HAL operations.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum HalError {
    /// Driver initialization failed
    #[error("Initialization failed: {0}")]
    InitFailed(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Writing an output line failed
    #[error("Output write to pin {pin} failed: {reason}")]
    PortFault {
        /// Pin that rejected the write
        pin: PinId,
        /// Driver-reported cause
        reason: String,
    },

    /// Pin was never claimed during `init()`
    #[error("Pin {0} is not configured as an output")]
    PinNotClaimed(PinId),

    /// Driver not found
    #[error("Driver not found: {0}")]
    DriverNotFound(String),
}

/// Factory function type for creating driver instances.
pub type DriverFactory = fn() -> Box<dyn OutputDriver>;

/// Optional driver diagnostics.
#[derive(Debug, Clone, Default)]
pub struct DriverDiagnostics {
    /// Number of successful pin writes
    pub writes: u64,
    /// Number of rejected pin writes
    pub faults: u64,
    /// Number of claimed output pins
    pub claimed_pins: usize,
}

/// Trait defining the interface for digital output drivers.
///
/// The control unit only ever sets levels; it never reads pins back.
/// Drivers are shared behind an `Arc` between the axis and actuator drivers,
/// so `set_level()` takes `&self` and implementations use interior
/// mutability.
///
/// # Lifecycle
///
/// 1. `init()` - Called once with every pin the machine will drive
/// 2. `set_level()` - Called from the worker thread during motion
/// 3. `shutdown()` - Drives every claimed pin LOW and releases the lines
pub trait OutputDriver: Send + Sync {
    /// Returns the driver's unique identifier (e.g., "simulation", "gpiod").
    fn name(&self) -> &'static str;

    /// Returns the driver's semantic version.
    fn version(&self) -> &'static str;

    /// Claim the given pins as outputs and drive them LOW.
    ///
    /// # Errors
    /// Return `HalError::InitFailed` if a line cannot be claimed.
    fn init(&mut self, config: &HalConfig, pins: &[PinId]) -> Result<(), HalError>;

    /// Drive one output pin to `level`.
    ///
    /// # Errors
    /// `HalError::PortFault` if the hardware rejected the write,
    /// `HalError::PinNotClaimed` if the pin was not passed to `init()`.
    fn set_level(&self, pin: PinId, level: Level) -> Result<(), HalError>;

    /// Drive all claimed pins LOW and release them.
    fn shutdown(&self) -> Result<(), HalError>;

    /// Get driver-specific diagnostics.
    /// Default: None
    fn diagnostics(&self) -> Option<DriverDiagnostics> {
        None
    }
}
