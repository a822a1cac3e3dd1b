//! Cut job types shared with the operator shell.

pub mod request;
pub mod state;
