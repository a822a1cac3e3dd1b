//! Open-loop linear actuator.
//!
//! A stroke energizes the H-bridge for a calibrated dwell. There is no end
//! switch, so the driver only knows where the rod is from the strokes it
//! completed. Every stroke releases the bridge (forward, reverse and enable
//! LOW) on every exit path.

use crate::cancel::CancellationToken;
use crate::error::MotionError;
use crate::motion::pulse::PulseScheduler;
use archimedes_common::hal::driver::{HalError, OutputDriver};
use archimedes_common::hal::types::Level;
use archimedes_common::machine::actuator::{ActuatorConfig, ActuatorDirection, ActuatorState};
use parking_lot::Mutex;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Outcome of one stroke.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StrokeReport {
    pub direction: ActuatorDirection,
    /// Dwell actually spent with the bridge energized, seconds.
    pub energized_seconds: f64,
    pub cancelled: bool,
}

/// Parse an operator direction code ("o"/"i" and long forms).
pub fn parse_direction(code: &str) -> Result<ActuatorDirection, MotionError> {
    code.parse()
        .map_err(|_| MotionError::InvalidActuatorDirection(code.to_string()))
}

/// Drives the actuator bridge.
pub struct ActuatorDriver {
    config: ActuatorConfig,
    port: Arc<dyn OutputDriver>,
    scheduler: Arc<dyn PulseScheduler>,
    state: Mutex<ActuatorState>,
}

impl ActuatorDriver {
    /// The rod is assumed retracted at construction.
    pub fn new(
        config: ActuatorConfig,
        port: Arc<dyn OutputDriver>,
        scheduler: Arc<dyn PulseScheduler>,
    ) -> Self {
        Self {
            config,
            port,
            scheduler,
            state: Mutex::new(ActuatorState::Retracted),
        }
    }

    pub fn config(&self) -> &ActuatorConfig {
        &self.config
    }

    /// Last known rod position.
    pub fn state(&self) -> ActuatorState {
        *self.state.lock()
    }

    /// Energize the supply line, if configured.
    pub fn power_up(&self) -> Result<(), MotionError> {
        if let Some(pin) = self.config.supply_pin {
            self.port.set_level(pin, Level::High)?;
            info!(pin, "actuator supply on");
        }
        Ok(())
    }

    /// Release the bridge and drop the supply line.
    pub fn power_down(&self) -> Result<(), MotionError> {
        let released = self.release();
        if let Some(pin) = self.config.supply_pin {
            self.port.set_level(pin, Level::Low)?;
            info!(pin, "actuator supply off");
        }
        released.map_err(MotionError::from)
    }

    /// Drive forward, reverse and enable LOW. Every pin is attempted; the
    /// first failure is returned.
    pub fn release(&self) -> Result<(), HalError> {
        let mut first_error = None;
        for pin in [
            self.config.forward_pin,
            self.config.reverse_pin,
            self.config.enable_pin,
        ] {
            if let Err(e) = self.port.set_level(pin, Level::Low) {
                warn!(pin, "actuator release failed: {e}");
                first_error.get_or_insert(e);
            }
        }
        first_error.map_or(Ok(()), Err)
    }

    /// Full stroke using the calibrated dwell.
    pub fn full_stroke(
        &self,
        direction: ActuatorDirection,
        token: &CancellationToken,
    ) -> Result<StrokeReport, MotionError> {
        self.stroke(direction, self.config.dwell_seconds, token)
    }

    /// Stroke by operator code. Invalid codes fail before any pin write.
    pub fn stroke_code(
        &self,
        code: &str,
        token: &CancellationToken,
    ) -> Result<StrokeReport, MotionError> {
        let direction = parse_direction(code)?;
        self.full_stroke(direction, token)
    }

    /// Energize the bridge in `direction` for `dwell_seconds`, sampling the
    /// token at the configured poll interval.
    pub fn stroke(
        &self,
        direction: ActuatorDirection,
        dwell_seconds: f64,
        token: &CancellationToken,
    ) -> Result<StrokeReport, MotionError> {
        if !(dwell_seconds.is_finite() && dwell_seconds >= 0.0) {
            return Err(MotionError::invalid(format!(
                "actuator dwell must be >= 0 seconds, got {dwell_seconds}"
            )));
        }

        let mut guard = BridgeGuard {
            driver: self,
            armed: true,
        };
        *self.state.lock() = ActuatorState::moving(direction);
        debug!(%direction, dwell_seconds, "actuator stroke start");

        let (forward, reverse) = match direction {
            ActuatorDirection::Extend => (Level::Low, Level::High),
            ActuatorDirection::Retract => (Level::High, Level::Low),
        };
        self.port.set_level(self.config.enable_pin, Level::High)?;
        self.port.set_level(self.config.forward_pin, forward)?;
        self.port.set_level(self.config.reverse_pin, reverse)?;

        let mut energized = 0.0;
        let mut cancelled = false;
        while energized < dwell_seconds {
            if token.is_cancelled() {
                cancelled = true;
                break;
            }
            let remaining = dwell_seconds - energized;
            let poll = self.config.poll_interval_seconds;
            // A non-positive poll would never advance; hold the rest at once.
            let chunk = if poll > 0.0 { poll.min(remaining) } else { remaining };
            self.scheduler.hold(chunk);
            energized += chunk;
        }

        guard.release()?;
        if cancelled {
            info!(%direction, energized, "actuator stroke cancelled");
        } else {
            *self.state.lock() = ActuatorState::settled(direction);
            debug!(%direction, "actuator stroke done");
        }

        Ok(StrokeReport {
            direction,
            energized_seconds: energized,
            cancelled,
        })
    }
}

/// Releases the bridge when a stroke exits early.
struct BridgeGuard<'a> {
    driver: &'a ActuatorDriver,
    armed: bool,
}

impl BridgeGuard<'_> {
    fn release(&mut self) -> Result<(), HalError> {
        self.armed = false;
        self.driver.release()
    }
}

impl Drop for BridgeGuard<'_> {
    fn drop(&mut self) {
        if self.armed {
            // Errors already logged by release().
            let _ = self.driver.release();
        }
    }
}
