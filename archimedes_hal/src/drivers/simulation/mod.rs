//! Simulation driver module.
//!
//! Software output driver for development and testing without physical
//! hardware. Every write lands in a pin table and a bounded journal that
//! tests inspect through a cloned handle.

mod driver;

pub use driver::{PinWrite, SimulationDriver};

use archimedes_common::hal::driver::OutputDriver;

/// Factory function to create a simulation driver instance.
pub fn create_driver() -> Box<dyn OutputDriver> {
    Box::new(SimulationDriver::new())
}
