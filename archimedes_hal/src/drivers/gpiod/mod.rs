//! GPIO character-device driver.
//!
//! Requests every machine pin as an output line on `[hal] chip` through the
//! `gpiod` crate. Header pins are translated to line offsets with
//! `[hal] line_map` before anything is opened.

mod driver;

pub use driver::{GpiodDriver, resolve_lines};

use archimedes_common::hal::driver::OutputDriver;

/// Factory function to create a gpiod driver instance.
pub fn create_driver() -> Box<dyn OutputDriver> {
    Box::new(GpiodDriver::new())
}
