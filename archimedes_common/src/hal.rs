//! Hardware abstraction layer contract.
//!
//! This module contains the pieces shared between the HAL crate (which
//! implements drivers) and the control unit (which drives outputs):
//! pin identifiers and levels, the `OutputDriver` trait and `HalConfig`.

pub mod config;
pub mod driver;
pub mod types;
