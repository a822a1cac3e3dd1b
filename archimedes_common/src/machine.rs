//! Static machine description.
//!
//! Axis tables, the linear actuator and travel limits. All of it is loaded
//! once at startup and treated as read-only afterwards.

pub mod actuator;
pub mod axis;
pub mod travel;
