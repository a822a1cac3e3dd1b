//! Motion sequencer and cut job runner.
//!
//! Turns axis moves and actuator strokes into the machine's macro-operations
//! and runs a cut job through its phases:
//!
//! | Phase           | Macro-steps                                                        |
//! |-----------------|--------------------------------------------------------------------|
//! | HorizontalCut   | Y down by `max_v - v`, extend actuator, lower head, X right `max_h`, raise head |
//! | (prompts)       | remove scrap, proceed with vertical cut                            |
//! | VerticalCut     | X left by `max_h - h`, retract actuator, lower head, Y down by `v` |
//! | ReturningHome   | raise head, Y up by `max_v`, X left by `h`                         |
//!
//! Cancellation is sampled between macro-steps and per step inside moves.
//! A stopped job is brought home along one of two recovery paths, using the
//! tracked [`MachinePosition`] for the distances.

use crate::cancel::CancellationToken;
use crate::error::MotionError;
use crate::motion::actuator::{ActuatorDriver, StrokeReport};
use crate::motion::axis::{AxisDriver, MotionRequest, MoveReport};
use crate::motion::pulse::PulseScheduler;
use crate::observer::{ConfirmationPrompt, ProgressObserver, Prompt};
use crate::state::job::{CutEvent, CutStateMachine, TransitionResult};
use crate::state::position::{MachinePosition, POSITION_EPSILON};
use archimedes_common::config::MachineConfig;
use archimedes_common::cutter::request::CutRequest;
use archimedes_common::cutter::state::CutPhase;
use archimedes_common::hal::driver::OutputDriver;
use archimedes_common::machine::actuator::{ActuatorDirection, ActuatorState};
use archimedes_common::machine::axis::{AxisId, Direction};
use static_assertions::assert_impl_all;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

pub use crate::state::job::RecoveryPath;

/// Phase name reported by the demo routine.
const DEMO_PHASE: &str = "Demo";

/// Terminal result of a cut job.
#[derive(Debug, Clone, PartialEq)]
pub enum JobOutcome {
    /// All phases finished; the machine is home.
    Completed,
    /// Stopped by cancellation or an operator "no".
    Cancelled { recovery: RecoveryPath, homed: bool },
    /// Stopped by a hardware fault. Recovery was attempted.
    Faulted {
        error: MotionError,
        recovery: RecoveryPath,
    },
}

/// Result of a macro-step or phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    Completed,
    Cancelled,
}

#[derive(Debug, Clone, Copy)]
enum MacroStep {
    Move {
        label: &'static str,
        axis: AxisId,
        direction: Direction,
        inches: f64,
        rpm: Option<f64>,
    },
    Stroke {
        label: &'static str,
        direction: ActuatorDirection,
    },
}

impl MacroStep {
    fn travel(label: &'static str, axis: AxisId, direction: Direction, inches: f64) -> Self {
        Self::Move {
            label,
            axis,
            direction,
            inches,
            rpm: None,
        }
    }

    fn label(&self) -> &'static str {
        match *self {
            Self::Move { label, .. } | Self::Stroke { label, .. } => label,
        }
    }
}

enum JobFlow {
    Finished,
    Stopped(CutEvent),
}

/// Owns the axis and actuator drivers and the tracked position.
pub struct MotionSequencer {
    config: Arc<MachineConfig>,
    x: AxisDriver,
    y: AxisDriver,
    z: AxisDriver,
    actuator: ActuatorDriver,
    position: MachinePosition,
}

assert_impl_all!(MotionSequencer: Send);

impl MotionSequencer {
    /// Build the drivers. The machine is assumed to be at home. No pin is
    /// written until [`power_up`](Self::power_up).
    ///
    /// # Errors
    /// `MotionError::InvalidConfiguration` if `config` fails validation.
    pub fn new(
        config: Arc<MachineConfig>,
        port: Arc<dyn OutputDriver>,
        scheduler: Arc<dyn PulseScheduler>,
    ) -> Result<Self, MotionError> {
        config.validate()?;
        let table = Arc::new(config.axes.clone());
        let axis = |id| {
            AxisDriver::new(
                id,
                Arc::clone(&table),
                Arc::clone(&port),
                Arc::clone(&scheduler),
            )
        };
        Ok(Self {
            x: axis(AxisId::X),
            y: axis(AxisId::Y),
            z: axis(AxisId::Z),
            actuator: ActuatorDriver::new(config.actuator.clone(), port.clone(), scheduler.clone()),
            config,
            position: MachinePosition::HOME,
        })
    }

    pub fn config(&self) -> &MachineConfig {
        &self.config
    }

    #[inline]
    pub fn position(&self) -> MachinePosition {
        self.position
    }

    #[inline]
    pub fn actuator_state(&self) -> ActuatorState {
        self.actuator.state()
    }

    fn axis(&self, id: AxisId) -> &AxisDriver {
        match id {
            AxisId::X => &self.x,
            AxisId::Y => &self.y,
            AxisId::Z => &self.z,
        }
    }

    /// Energize the actuator supply line.
    pub fn power_up(&self) -> Result<(), MotionError> {
        self.actuator.power_up()
    }

    /// Drive every output to its rest level.
    pub fn shutdown(&self) -> Result<(), MotionError> {
        self.safe_state();
        self.actuator.power_down()
    }

    /// Best effort: bridge released, step pins LOW. Failures are logged.
    pub fn safe_state(&self) {
        if let Err(e) = self.actuator.release() {
            warn!("safe state: actuator release failed: {e}");
        }
        for driver in [&self.x, &self.y, &self.z] {
            if let Err(e) = driver.park() {
                warn!(axis = %driver.id(), "safe state: step pin LOW failed: {e}");
            }
        }
    }

    // ─── Single operations ──────────────────────────────────────────

    /// Calibration move by operator direction code.
    pub fn jog(
        &mut self,
        axis: AxisId,
        direction_code: &str,
        distance_inches: f64,
        rpm: Option<f64>,
        token: &CancellationToken,
    ) -> Result<MoveReport, MotionError> {
        let request = self
            .axis(axis)
            .jog_request(direction_code, distance_inches, rpm)?;
        info!(%axis, direction = ?request.direction, distance_inches, rpm = request.rpm, "jog");
        self.execute_tracked(&request, token)
    }

    /// One actuator stroke by operator code ("o" / "i").
    pub fn test_actuator(
        &self,
        direction_code: &str,
        token: &CancellationToken,
    ) -> Result<StrokeReport, MotionError> {
        self.actuator.stroke_code(direction_code, token)
    }

    /// Raise the head, move Y up by `y_len` and X left by `x_len`. On
    /// completion the tracked position is reset to home.
    pub fn home(
        &mut self,
        x_len: f64,
        y_len: f64,
        token: &CancellationToken,
        observer: &mut dyn ProgressObserver,
    ) -> Result<StepOutcome, MotionError> {
        for (name, value) in [("x", x_len), ("y", y_len)] {
            if !(value.is_finite() && value >= 0.0) {
                return Err(MotionError::invalid(format!(
                    "home: {name} distance must be >= 0, got {value}"
                )));
            }
        }
        let steps = self.return_home_steps(x_len, y_len);
        let outcome = self.run_phase(CutPhase::ReturningHome.name(), &steps, token, observer)?;
        if outcome == StepOutcome::Completed {
            self.position = MachinePosition::HOME;
            info!("machine at home");
        }
        Ok(outcome)
    }

    /// Showroom pattern: a `distance` square traced with the head, repeated
    /// `cycles` times. Returns the number of finished cycles. A cancelled
    /// demo brings the machine home.
    pub fn demo(
        &mut self,
        cycles: u32,
        distance: f64,
        rpm: Option<f64>,
        token: &CancellationToken,
        observer: &mut dyn ProgressObserver,
    ) -> Result<u32, MotionError> {
        let travel = &self.config.travel;
        let max = travel.max_horizontal.min(travel.max_vertical);
        if !(distance.is_finite() && distance > 0.0 && distance <= max) {
            return Err(MotionError::invalid(format!(
                "demo: distance must be in (0, {max}] in, got {distance}"
            )));
        }

        let steps = self.demo_steps(distance, rpm);
        for cycle in 0..cycles {
            info!(cycle = cycle + 1, of = cycles, "demo cycle");
            match self.run_phase(DEMO_PHASE, &steps, token, observer) {
                Ok(StepOutcome::Completed) => {}
                Ok(StepOutcome::Cancelled) => {
                    let homed = self.recover(RecoveryPath::FromVerticalCut, observer);
                    observer.on_cancelled(
                        "Demo cancelled",
                        &format!("Stopped after {cycle} cycles. {}", homing_note(homed)),
                    );
                    return Ok(cycle);
                }
                Err(e) => {
                    self.safe_state();
                    observer.on_error(&e);
                    return Err(e);
                }
            }
        }
        observer.on_complete("Demo complete", &format!("{cycles} cycles"));
        Ok(cycles)
    }

    // ─── Cut job ────────────────────────────────────────────────────

    /// Run one cut job to a terminal outcome.
    ///
    /// # Errors
    /// Only `CutSizeOutOfRange`, before anything moves. Faults during the job
    /// are reported as [`JobOutcome::Faulted`].
    pub fn run_job(
        &mut self,
        request: CutRequest,
        token: &CancellationToken,
        observer: &mut dyn ProgressObserver,
        prompt: &mut dyn ConfirmationPrompt,
    ) -> Result<JobOutcome, MotionError> {
        request.check(&self.config.travel)?;

        let mut sm = CutStateMachine::new();
        transition(&mut sm, CutEvent::Accept);
        info!(
            horizontal = request.horizontal_inches,
            vertical = request.vertical_inches,
            "cut job accepted"
        );

        let outcome = match self.run_phases(&request, &mut sm, token, observer, prompt) {
            Ok(JobFlow::Finished) => {
                info!(position = %self.position, "cut job complete");
                observer.on_complete(
                    "Cut complete",
                    &format!(
                        "{} x {} in panel finished",
                        request.horizontal_inches, request.vertical_inches
                    ),
                );
                JobOutcome::Completed
            }
            Ok(JobFlow::Stopped(event)) => self.finish_cancelled(&mut sm, event, observer),
            Err(error) => self.finish_faulted(&mut sm, error, observer),
        };
        Ok(outcome)
    }

    fn run_phases(
        &mut self,
        request: &CutRequest,
        sm: &mut CutStateMachine,
        token: &CancellationToken,
        observer: &mut dyn ProgressObserver,
        prompt: &mut dyn ConfirmationPrompt,
    ) -> Result<JobFlow, MotionError> {
        let steps = self.horizontal_cut_steps(request);
        if self.run_phase(sm.phase().name(), &steps, token, observer)? == StepOutcome::Cancelled {
            return Ok(JobFlow::Stopped(CutEvent::CancelRequested));
        }
        transition(sm, CutEvent::HorizontalCutDone);

        if let Some(event) = ask(sm.phase(), Prompt::RemoveScrap, token, observer, prompt) {
            return Ok(JobFlow::Stopped(event));
        }
        transition(sm, CutEvent::ScrapRemoved);

        if let Some(event) = ask(sm.phase(), Prompt::ContinueVertical, token, observer, prompt) {
            return Ok(JobFlow::Stopped(event));
        }
        transition(sm, CutEvent::ContinueConfirmed);

        let steps = self.vertical_cut_steps(request);
        if self.run_phase(sm.phase().name(), &steps, token, observer)? == StepOutcome::Cancelled {
            return Ok(JobFlow::Stopped(CutEvent::CancelRequested));
        }
        transition(sm, CutEvent::VerticalCutDone);

        let steps =
            self.return_home_steps(request.horizontal_inches, self.config.travel.max_vertical);
        if self.run_phase(sm.phase().name(), &steps, token, observer)? == StepOutcome::Cancelled {
            return Ok(JobFlow::Stopped(CutEvent::CancelRequested));
        }
        transition(sm, CutEvent::HomeReached);
        Ok(JobFlow::Finished)
    }

    fn finish_cancelled(
        &mut self,
        sm: &mut CutStateMachine,
        event: CutEvent,
        observer: &mut dyn ProgressObserver,
    ) -> JobOutcome {
        let phase = sm.phase();
        transition(sm, event);
        let recovery = sm
            .recovery_path()
            .unwrap_or(RecoveryPath::for_phase(phase));
        warn!(%phase, ?event, "cut job stopped, running {recovery}");

        let homed = self.recover(recovery, observer);
        observer.on_cancelled(
            "Cut cancelled",
            &format!("Stopped during {phase}. {}", homing_note(homed)),
        );
        JobOutcome::Cancelled { recovery, homed }
    }

    fn finish_faulted(
        &mut self,
        sm: &mut CutStateMachine,
        error: MotionError,
        observer: &mut dyn ProgressObserver,
    ) -> JobOutcome {
        let phase = sm.phase();
        error!(%phase, "cut job fault: {error}");
        transition(sm, CutEvent::Fault);
        let recovery = sm
            .recovery_path()
            .unwrap_or(RecoveryPath::for_phase(phase));

        self.safe_state();
        let homed = self.recover(recovery, observer);
        if !homed {
            warn!("homing after fault did not complete");
        }
        observer.on_error(&error);
        JobOutcome::Faulted { error, recovery }
    }

    // ─── Recovery ───────────────────────────────────────────────────

    /// Bring the machine home from the tracked position. Runs under its own
    /// token. Returns `true` if every step completed.
    fn recover(&mut self, path: RecoveryPath, observer: &mut dyn ProgressObserver) -> bool {
        let token = CancellationToken::new();
        let steps = self.recovery_steps(path);
        info!(position = %self.position, steps = steps.len(), "starting {path}");

        for step in steps {
            match self.run_macro(CutPhase::Cancelled.name(), step, &token, observer) {
                Ok(StepOutcome::Completed) => {}
                Ok(StepOutcome::Cancelled) => return false,
                Err(e) => {
                    warn!("{path} stopped at '{}': {e}", step.label());
                    self.safe_state();
                    return false;
                }
            }
        }
        self.position.is_home()
    }

    fn recovery_steps(&self, path: RecoveryPath) -> Vec<MacroStep> {
        let raise = self.homing_move("Raising head", AxisId::Z);
        let y_home = self.homing_move("Returning Y home", AxisId::Y);
        let x_home = self.homing_move("Returning X home", AxisId::X);
        let retract = self
            .actuator
            .state()
            .needs_retract()
            .then_some(MacroStep::Stroke {
                label: "Retracting actuator",
                direction: ActuatorDirection::Retract,
            });

        let ordered = match path {
            RecoveryPath::FromHorizontalCut => [raise, retract, y_home, x_home],
            RecoveryPath::FromVerticalCut => [raise, y_home, x_home, retract],
        };
        ordered.into_iter().flatten().collect()
    }

    /// Move that returns `axis` to zero, if it is away from it.
    fn homing_move(&self, label: &'static str, axis: AxisId) -> Option<MacroStep> {
        let offset = self.position.get(axis);
        if offset.abs() <= POSITION_EPSILON {
            return None;
        }
        let direction = if offset > 0.0 {
            Direction::Negative
        } else {
            Direction::Positive
        };
        Some(MacroStep::travel(label, axis, direction, offset.abs()))
    }

    // ─── Macro-step tables ──────────────────────────────────────────

    fn horizontal_cut_steps(&self, request: &CutRequest) -> [MacroStep; 5] {
        let travel = &self.config.travel;
        let jog = self.config.head.jog_inches;
        [
            MacroStep::travel(
                "Moving Y to cut height",
                AxisId::Y,
                Direction::Positive,
                travel.max_vertical - request.vertical_inches,
            ),
            MacroStep::Stroke {
                label: "Extending actuator",
                direction: ActuatorDirection::Extend,
            },
            MacroStep::travel("Lowering head", AxisId::Z, Direction::Positive, jog),
            MacroStep::travel(
                "Cutting horizontally",
                AxisId::X,
                Direction::Positive,
                travel.max_horizontal,
            ),
            MacroStep::travel("Raising head", AxisId::Z, Direction::Negative, jog),
        ]
    }

    fn vertical_cut_steps(&self, request: &CutRequest) -> [MacroStep; 4] {
        let travel = &self.config.travel;
        let jog = self.config.head.jog_inches;
        [
            MacroStep::travel(
                "Moving X to cut offset",
                AxisId::X,
                Direction::Negative,
                travel.max_horizontal - request.horizontal_inches,
            ),
            MacroStep::Stroke {
                label: "Retracting actuator",
                direction: ActuatorDirection::Retract,
            },
            MacroStep::travel("Lowering head", AxisId::Z, Direction::Positive, jog),
            MacroStep::travel(
                "Cutting vertically",
                AxisId::Y,
                Direction::Positive,
                request.vertical_inches,
            ),
        ]
    }

    fn return_home_steps(&self, x_len: f64, y_len: f64) -> [MacroStep; 3] {
        let jog = self.config.head.jog_inches;
        [
            MacroStep::travel("Raising head", AxisId::Z, Direction::Negative, jog),
            MacroStep::travel("Returning Y home", AxisId::Y, Direction::Negative, y_len),
            MacroStep::travel("Returning X home", AxisId::X, Direction::Negative, x_len),
        ]
    }

    fn demo_steps(&self, distance: f64, rpm: Option<f64>) -> Vec<MacroStep> {
        let jog = self.config.head.jog_inches;
        let lower = MacroStep::travel("Lowering head", AxisId::Z, Direction::Positive, jog);
        let raise = MacroStep::travel("Raising head", AxisId::Z, Direction::Negative, jog);
        let extend = MacroStep::Stroke {
            label: "Extending actuator",
            direction: ActuatorDirection::Extend,
        };
        let retract = MacroStep::Stroke {
            label: "Retracting actuator",
            direction: ActuatorDirection::Retract,
        };
        let side = |label, axis, direction| MacroStep::Move {
            label,
            axis,
            direction,
            inches: distance,
            rpm,
        };

        vec![
            extend,
            lower,
            side("Tracing right", AxisId::X, Direction::Positive),
            raise,
            retract,
            lower,
            side("Tracing down", AxisId::Y, Direction::Positive),
            raise,
            extend,
            lower,
            side("Tracing left", AxisId::X, Direction::Negative),
            raise,
            retract,
            lower,
            side("Tracing up", AxisId::Y, Direction::Negative),
            raise,
        ]
    }

    // ─── Execution ──────────────────────────────────────────────────

    fn run_phase(
        &mut self,
        phase: &str,
        steps: &[MacroStep],
        token: &CancellationToken,
        observer: &mut dyn ProgressObserver,
    ) -> Result<StepOutcome, MotionError> {
        for &step in steps {
            if self.run_macro(phase, step, token, observer)? == StepOutcome::Cancelled {
                return Ok(StepOutcome::Cancelled);
            }
        }
        Ok(StepOutcome::Completed)
    }

    /// One macro-step with notifications before and after.
    fn run_macro(
        &mut self,
        phase: &str,
        step: MacroStep,
        token: &CancellationToken,
        observer: &mut dyn ProgressObserver,
    ) -> Result<StepOutcome, MotionError> {
        if token.is_cancelled() {
            return Ok(StepOutcome::Cancelled);
        }
        let label = step.label();
        info!(phase, "{label}");
        observer.on_phase_change(phase, label);

        match self.perform(step, token) {
            Ok(outcome) => {
                let status = match outcome {
                    StepOutcome::Completed => "done",
                    StepOutcome::Cancelled => "interrupted",
                };
                observer.on_phase_change(phase, &format!("{label}: {status}"));
                Ok(outcome)
            }
            Err(e) => {
                observer.on_phase_change(phase, &format!("{label}: failed"));
                Err(e)
            }
        }
    }

    fn perform(
        &mut self,
        step: MacroStep,
        token: &CancellationToken,
    ) -> Result<StepOutcome, MotionError> {
        match step {
            MacroStep::Move {
                axis,
                direction,
                inches,
                rpm,
                ..
            } => {
                let driver = self.axis(axis);
                if driver.steps_for(inches) == 0 {
                    debug!(%axis, inches, "move shorter than one step, skipped");
                    return Ok(StepOutcome::Completed);
                }
                let request = MotionRequest {
                    axis,
                    direction,
                    distance_inches: inches,
                    rpm: rpm.unwrap_or(driver.config().rpm),
                };
                let report = self.execute_tracked(&request, token)?;
                Ok(if report.cancelled {
                    StepOutcome::Cancelled
                } else {
                    StepOutcome::Completed
                })
            }
            MacroStep::Stroke { direction, .. } => {
                let report = self.actuator.full_stroke(direction, token)?;
                Ok(if report.cancelled {
                    StepOutcome::Cancelled
                } else {
                    StepOutcome::Completed
                })
            }
        }
    }

    /// Execute a move and record the travelled distance, also on failure.
    fn execute_tracked(
        &mut self,
        request: &MotionRequest,
        token: &CancellationToken,
    ) -> Result<MoveReport, MotionError> {
        let mut report = MoveReport::default();
        let result = self.axis(request.axis).drive(request, token, &mut report);
        self.position
            .apply(request.axis, request.direction, report.travelled_inches);
        debug!(position = %self.position, "position updated");
        result.map(|()| report)
    }
}

/// Ask the operator; `None` means go on.
fn ask(
    phase: CutPhase,
    question: Prompt,
    token: &CancellationToken,
    observer: &mut dyn ProgressObserver,
    prompt: &mut dyn ConfirmationPrompt,
) -> Option<CutEvent> {
    if token.is_cancelled() {
        return Some(CutEvent::CancelRequested);
    }
    observer.on_phase_change(phase.name(), question.question());
    let yes = prompt.confirm(question, token);
    let answer = if yes { "yes" } else { "no" };
    observer.on_phase_change(phase.name(), &format!("{}: {answer}", question.question()));

    if token.is_cancelled() {
        Some(CutEvent::CancelRequested)
    } else if yes {
        None
    } else {
        Some(CutEvent::Declined)
    }
}

fn transition(sm: &mut CutStateMachine, event: CutEvent) {
    let from = sm.phase();
    match sm.handle_event(event) {
        TransitionResult::Ok(to) => debug!(%from, %to, ?event, "cut phase"),
        TransitionResult::Rejected(reason) => {
            error!(%from, ?event, "cut phase transition rejected: {reason}");
        }
    }
}

fn homing_note(homed: bool) -> &'static str {
    if homed {
        "Machine returned home."
    } else {
        "Homing did not complete; check the machine before the next job."
    }
}
