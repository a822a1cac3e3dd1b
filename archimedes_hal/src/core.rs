//! HAL Core struct and output driver lifecycle.
//!
//! `HalCore` creates the configured driver, claims every output pin the
//! machine drives and hands out a shared port to the motion layer. Dropping
//! it drives every claimed pin LOW.

use archimedes_common::config::MachineConfig;
use archimedes_common::hal::driver::{DriverDiagnostics, HalError, OutputDriver};
use archimedes_common::hal::types::PinId;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{info, warn};

use crate::driver_registry::DriverRegistry;

/// HAL Core owns the active output driver.
pub struct HalCore {
    /// Active driver, shared with axis and actuator drivers.
    driver: Arc<dyn OutputDriver>,
    /// Pins claimed at init
    pins: Vec<PinId>,
    /// Set once the driver has been shut down
    shut_down: AtomicBool,
}

impl HalCore {
    /// Create and initialize the driver named in `config.hal.driver`.
    ///
    /// # Errors
    /// `HalError::DriverNotFound` for an unknown driver name, or any error
    /// the driver reports from `init()`.
    pub fn new(config: &MachineConfig, registry: &DriverRegistry) -> Result<Self, HalError> {
        let driver = registry.create_driver(&config.hal.driver)?;
        Self::with_driver(driver, config)
    }

    /// Initialize an already constructed driver.
    pub fn with_driver(
        mut driver: Box<dyn OutputDriver>,
        config: &MachineConfig,
    ) -> Result<Self, HalError> {
        config
            .validate()
            .map_err(|e| HalError::ConfigError(e.to_string()))?;

        let pins = config.output_pins();
        info!(
            "Initializing driver {} v{} with {} output pins",
            driver.name(),
            driver.version(),
            pins.len()
        );
        driver.init(&config.hal, &pins)?;

        Ok(Self {
            driver: Arc::from(driver),
            pins,
            shut_down: AtomicBool::new(false),
        })
    }

    /// Shared output port.
    pub fn port(&self) -> Arc<dyn OutputDriver> {
        Arc::clone(&self.driver)
    }

    /// Name of the active driver.
    pub fn driver_name(&self) -> &'static str {
        self.driver.name()
    }

    /// Pins claimed at init, in configuration order.
    pub fn claimed_pins(&self) -> &[PinId] {
        &self.pins
    }

    /// Driver diagnostics, if the driver reports any.
    pub fn diagnostics(&self) -> Option<DriverDiagnostics> {
        self.driver.diagnostics()
    }

    /// Drive every claimed pin LOW and release the driver. Idempotent.
    pub fn shutdown(&self) -> Result<(), HalError> {
        if self.shut_down.swap(true, Ordering::SeqCst) {
            return Ok(());
        }
        if let Some(diag) = self.driver.diagnostics() {
            info!(
                writes = diag.writes,
                faults = diag.faults,
                "Shutting down {} driver",
                self.driver.name()
            );
        }
        self.driver.shutdown()
    }
}

impl Drop for HalCore {
    fn drop(&mut self) {
        if let Err(e) = self.shutdown() {
            warn!("Output driver shutdown failed: {e}");
        }
    }
}
