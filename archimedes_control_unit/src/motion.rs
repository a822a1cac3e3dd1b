//! Single-axis and actuator motion.

pub mod actuator;
pub mod axis;
pub mod profile;
pub mod pulse;
