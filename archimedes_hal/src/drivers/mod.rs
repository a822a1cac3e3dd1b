//! Output driver implementations.
//!
//! - [`simulation`] - In-memory pin table with a write journal and fault injection
//! - [`gpiod`] - Linux GPIO character device (`/dev/gpiochipN`)
//!
//! # Adding New Drivers
//!
//! 1. Create a new submodule under `drivers/`
//! 2. Implement the `OutputDriver` trait from `archimedes_common::hal::driver`
//! 3. Register the driver in [`register_all_drivers`]

pub mod gpiod;
pub mod simulation;

use crate::driver_registry::DriverRegistry;

/// Register all built-in drivers.
pub fn register_all_drivers(registry: &mut DriverRegistry) {
    registry.register("simulation", simulation::create_driver);
    registry.register("gpiod", gpiod::create_driver);
}
