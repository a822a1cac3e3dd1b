//! Motion error taxonomy.
//!
//! Cancellation is not an error: interrupted moves and strokes come back as
//! successful partial reports.

use archimedes_common::config::ConfigError;
use archimedes_common::cutter::request::CutSizeError;
use archimedes_common::hal::driver::HalError;
use thiserror::Error;

/// Errors raised by the motion layer and the cut sequencer.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum MotionError {
    /// Non-positive or non-finite distance/RPM, unknown direction code, or a
    /// request routed to the wrong axis. Raised before any pin write.
    #[error("Invalid motion parameter: {0}")]
    InvalidMotionParameter(String),

    /// Actuator direction outside {extend, retract}. Raised before any pin write.
    #[error("Invalid actuator direction: {0:?}")]
    InvalidActuatorDirection(String),

    /// The output port rejected a write. Motion stopped, not retried.
    #[error("Hardware port fault: {0}")]
    HardwarePortFault(#[from] HalError),

    /// Requested panel size outside the configured travel.
    #[error("Cut size out of range: {0}")]
    CutSizeOutOfRange(#[from] CutSizeError),

    /// A cut job is already running.
    #[error("A cut job is already in progress")]
    JobInProgress,

    /// Machine configuration rejected when building the sequencer.
    #[error("Invalid machine configuration: {0}")]
    InvalidConfiguration(#[from] ConfigError),
}

impl MotionError {
    /// Shorthand for [`MotionError::InvalidMotionParameter`].
    pub(crate) fn invalid(reason: impl Into<String>) -> Self {
        Self::InvalidMotionParameter(reason.into())
    }

    /// `true` for errors that come from the hardware path.
    pub fn is_hardware_fault(&self) -> bool {
        matches!(self, Self::HardwarePortFault(_))
    }
}
