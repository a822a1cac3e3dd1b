//! # Archimedes HAL Library
//!
//! Digital output layer with a pluggable driver architecture.
//!
//! Drivers implement the `OutputDriver` trait defined in
//! `archimedes_common::hal::driver`. The control unit never talks to a
//! driver directly; it receives a shared port handle from [`HalCore`].
//!
//! # Module Structure
//!
//! - [`core`] - HalCore struct, driver bring-up and safe shutdown
//! - [`driver_registry`] - Driver factory registration
//! - [`drivers`] - Output driver implementations
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                  archimedes_hal                          │
//! │  ┌──────────────┐    ┌─────────────────────────────────┐ │
//! │  │  HalCore     │◄──►│  Driver Registry                │ │
//! │  │  (owns pins) │    │  "simulation" | "gpiod"         │ │
//! │  └──────┬───────┘    └─────────────────────────────────┘ │
//! │         │ port(): Arc<dyn OutputDriver>                  │
//! │         ▼                                                │
//! │  axis drivers, actuator driver (archimedes_control_unit) │
//! └──────────────────────────────────────────────────────────┘
//! ```

#![deny(missing_docs)]

pub mod core;
pub mod driver_registry;
pub mod drivers;

// Re-export key types for convenience
pub use crate::core::HalCore;
pub use crate::driver_registry::DriverRegistry;
pub use crate::drivers::simulation::{PinWrite, SimulationDriver};
pub use crate::drivers::gpiod::GpiodDriver;
