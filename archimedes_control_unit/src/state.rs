//! Cut job state machine and tracked machine position.

pub mod job;
pub mod position;
