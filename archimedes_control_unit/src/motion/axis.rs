//! Single-axis step/direction execution.

use crate::cancel::CancellationToken;
use crate::error::MotionError;
use crate::motion::profile::{RampProfile, inches_for, steps_for};
use crate::motion::pulse::PulseScheduler;
use archimedes_common::hal::driver::OutputDriver;
use archimedes_common::hal::types::Level;
use archimedes_common::machine::axis::{AxisConfig, AxisId, AxisTable, Direction};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// One single-axis move.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MotionRequest {
    pub axis: AxisId,
    pub direction: Direction,
    pub distance_inches: f64,
    pub rpm: f64,
}

/// Outcome of a move. Filled in progressively by [`AxisDriver::drive`].
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct MoveReport {
    pub total_steps: u64,
    pub steps_executed: u64,
    pub cancelled: bool,
    /// Inches actually travelled, from `steps_executed`.
    pub travelled_inches: f64,
}

impl MoveReport {
    #[inline]
    pub fn completed(&self) -> bool {
        !self.cancelled && self.steps_executed == self.total_steps
    }
}

/// Executes ramp profiles on one axis.
pub struct AxisDriver {
    id: AxisId,
    table: Arc<AxisTable>,
    port: Arc<dyn OutputDriver>,
    scheduler: Arc<dyn PulseScheduler>,
}

impl AxisDriver {
    pub fn new(
        id: AxisId,
        table: Arc<AxisTable>,
        port: Arc<dyn OutputDriver>,
        scheduler: Arc<dyn PulseScheduler>,
    ) -> Self {
        Self {
            id,
            table,
            port,
            scheduler,
        }
    }

    #[inline]
    pub fn id(&self) -> AxisId {
        self.id
    }

    #[inline]
    pub fn config(&self) -> &AxisConfig {
        self.table.get(self.id)
    }

    /// Steps a move of `distance_inches` would take on this axis.
    pub fn steps_for(&self, distance_inches: f64) -> u64 {
        steps_for(distance_inches, self.config())
    }

    /// Drive the step pin LOW.
    pub fn park(&self) -> Result<(), MotionError> {
        self.port.set_level(self.config().step_pin, Level::Low)?;
        Ok(())
    }

    /// Run a move to completion or cancellation.
    ///
    /// Cancellation is sampled before every step; a cancelled move returns
    /// `Ok` with `cancelled` set and the step pin LOW.
    pub fn execute(
        &self,
        request: &MotionRequest,
        token: &CancellationToken,
    ) -> Result<MoveReport, MotionError> {
        let mut report = MoveReport::default();
        self.drive(request, token, &mut report)?;
        Ok(report)
    }

    /// Like [`execute`](Self::execute), but progress stays readable in
    /// `report` when the move fails part way.
    pub fn drive(
        &self,
        request: &MotionRequest,
        token: &CancellationToken,
        report: &mut MoveReport,
    ) -> Result<(), MotionError> {
        let cfg = self.config();
        if request.axis != self.id {
            return Err(MotionError::invalid(format!(
                "request for axis {} sent to axis {} driver",
                request.axis, self.id
            )));
        }
        let profile = RampProfile::compute(request.distance_inches, request.rpm, cfg)?;
        *report = MoveReport {
            total_steps: profile.total_steps(),
            ..MoveReport::default()
        };

        debug!(
            axis = %self.id,
            direction = ?request.direction,
            steps = profile.total_steps(),
            ramp_steps = profile.ramp_steps(),
            frequency_hz = profile.target_frequency_hz(),
            "axis move start"
        );

        self.port
            .set_level(cfg.direction_pin, cfg.level_for(request.direction))?;

        let result = self.pulse_train(&profile, token, report);
        report.travelled_inches = inches_for(report.steps_executed, cfg);
        result?;

        if report.cancelled {
            info!(
                axis = %self.id,
                steps = report.steps_executed,
                of = report.total_steps,
                "axis move cancelled"
            );
        } else {
            debug!(axis = %self.id, steps = report.steps_executed, "axis move done");
        }
        Ok(())
    }

    fn pulse_train(
        &self,
        profile: &RampProfile,
        token: &CancellationToken,
        report: &mut MoveReport,
    ) -> Result<(), MotionError> {
        let step_pin = self.config().step_pin;
        for half_period in profile.half_periods() {
            if token.is_cancelled() {
                report.cancelled = true;
                // Already LOW after a full step; rewritten so the contract
                // holds whatever the driver did before.
                self.port.set_level(step_pin, Level::Low)?;
                return Ok(());
            }
            if let Err(e) = self.scheduler.step(&*self.port, step_pin, half_period) {
                warn!(axis = %self.id, steps = report.steps_executed, "step pulse failed: {e}");
                return Err(e.into());
            }
            report.steps_executed += 1;
        }
        Ok(())
    }

    /// Calibration move by operator direction code.
    pub fn jog(
        &self,
        direction_code: &str,
        distance_inches: f64,
        rpm: Option<f64>,
        token: &CancellationToken,
    ) -> Result<MoveReport, MotionError> {
        let request = self.jog_request(direction_code, distance_inches, rpm)?;
        self.execute(&request, token)
    }

    /// Resolve a jog into a request without moving.
    pub fn jog_request(
        &self,
        direction_code: &str,
        distance_inches: f64,
        rpm: Option<f64>,
    ) -> Result<MotionRequest, MotionError> {
        let cfg = self.config();
        let direction = cfg.direction_for_code(direction_code).ok_or_else(|| {
            MotionError::invalid(format!(
                "axis {}: unknown direction {direction_code:?}, use {:?} or {:?}",
                self.id, cfg.positive_code, cfg.negative_code
            ))
        })?;
        Ok(MotionRequest {
            axis: self.id,
            direction,
            distance_inches,
            rpm: rpm.unwrap_or(cfg.rpm),
        })
    }
}
