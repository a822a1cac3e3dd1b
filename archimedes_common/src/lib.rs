//! Archimedes Common Library
//!
//! Shared types for all Archimedes workspace crates: configuration loading,
//! the output-driver contract used by the HAL, per-axis and actuator
//! configuration, and the cut request/phase types exchanged with the
//! operator shell.
//!
//! # Module Structure
//!
//! - [`config`] - Configuration loading traits and the machine configuration root
//! - [`consts`] - Factory defaults of the machine
//! - [`hal`] - Output driver trait, pin types and HAL errors
//! - [`machine`] - Axis, actuator and travel configuration
//! - [`cutter`] - Cut requests and cut job phases
//! - [`prelude`] - Common re-exports for convenience
//!
//! # Usage
//!
//! ```rust
//! use archimedes_common::prelude::*;
//!
//! let config = MachineConfig::default();
//! assert!(config.validate().is_ok());
//! assert_eq!(config.axes.get(AxisId::X).steps_per_revolution, 200);
//! ```

pub mod config;
pub mod consts;
pub mod cutter;
pub mod hal;
pub mod machine;
pub mod prelude;
