//! Integration test: jog, actuator test, homing, demo and shutdown.

use super::{RecordingObserver, Rig};
use archimedes_common::prelude::*;
use archimedes_control_unit::cancel::CancellationToken;
use archimedes_control_unit::error::MotionError;
use archimedes_control_unit::observer::LogObserver;
use archimedes_control_unit::sequencer::StepOutcome;
use archimedes_control_unit::motion::pulse::VirtualScheduler;
use archimedes_control_unit::sequencer::MotionSequencer;
use archimedes_control_unit::state::position::MachinePosition;
use archimedes_hal::SimulationDriver;
use std::sync::Arc;

// ── Construction ────────────────────────────────────────────────────

#[test]
fn sequencer_refuses_unvalidated_config() {
    let mut config = MachineConfig::default();
    config.actuator.poll_interval_seconds = 0.0;
    let sim = SimulationDriver::new();

    let result = MotionSequencer::new(
        Arc::new(config),
        Arc::new(sim.clone()),
        Arc::new(VirtualScheduler::new()),
    );

    assert!(matches!(result, Err(MotionError::InvalidConfiguration(_))));
    assert_eq!(sim.total_writes(), 0);
}

// ── Jog ─────────────────────────────────────────────────────────────

#[test]
fn jog_tracks_position() {
    let mut rig = Rig::new();
    let token = CancellationToken::new();

    let report = rig.sequencer.jog(AxisId::X, "r", 2.0, None, &token).unwrap();
    assert!(report.completed());
    assert_eq!(report.total_steps, 1600);
    assert_eq!(rig.sequencer.position().x, 2.0);

    rig.sequencer
        .jog(AxisId::X, "l", 2.0, Some(100.0), &token)
        .unwrap();
    assert!(rig.sequencer.position().is_home());
}

#[test]
fn jog_rejects_bad_parameters_before_motion() {
    let mut rig = Rig::new();
    let token = CancellationToken::new();
    let writes_before = rig.sim.total_writes();

    // "u" is a Y code.
    let err = rig.sequencer.jog(AxisId::X, "u", 1.0, None, &token).unwrap_err();
    assert!(matches!(err, MotionError::InvalidMotionParameter(_)));

    for (inches, rpm) in [(0.0, None), (-1.0, None), (1.0, Some(0.0))] {
        let err = rig
            .sequencer
            .jog(AxisId::Y, "d", inches, rpm, &token)
            .unwrap_err();
        assert!(matches!(err, MotionError::InvalidMotionParameter(_)));
    }

    assert_eq!(rig.sim.total_writes(), writes_before);
    assert_eq!(rig.sequencer.position(), MachinePosition::HOME);
}

// ── Actuator ────────────────────────────────────────────────────────

#[test]
fn actuator_test_strokes() {
    let rig = Rig::new();
    let token = CancellationToken::new();

    let report = rig.sequencer.test_actuator("o", &token).unwrap();
    assert_eq!(report.direction, ActuatorDirection::Extend);
    assert_eq!(rig.sequencer.actuator_state(), ActuatorState::Extended);

    rig.sequencer.test_actuator("i", &token).unwrap();
    assert_eq!(rig.sequencer.actuator_state(), ActuatorState::Retracted);

    let err = rig.sequencer.test_actuator("up", &token).unwrap_err();
    assert_eq!(err, MotionError::InvalidActuatorDirection("up".to_string()));
    rig.assert_outputs_at_rest();
}

// ── Home ────────────────────────────────────────────────────────────

#[test]
fn home_returns_jogged_axes() {
    let mut rig = Rig::new();
    let token = CancellationToken::new();
    rig.sequencer.jog(AxisId::X, "r", 3.0, None, &token).unwrap();
    rig.sequencer.jog(AxisId::Y, "d", 2.0, None, &token).unwrap();

    let outcome = rig
        .sequencer
        .home(3.0, 2.0, &token, &mut LogObserver)
        .unwrap();

    assert_eq!(outcome, StepOutcome::Completed);
    assert_eq!(rig.sequencer.position(), MachinePosition::HOME);
    let x_steps = 2.0 * 3.0 * rig.steps_per_inch(AxisId::X);
    assert_eq!(rig.sim.rising_edges(rig.step_pin(AxisId::X)), x_steps as u64);
}

#[test]
fn home_rejects_negative_lengths() {
    let mut rig = Rig::new();
    let err = rig
        .sequencer
        .home(-1.0, 2.0, &CancellationToken::new(), &mut LogObserver)
        .unwrap_err();
    assert!(matches!(err, MotionError::InvalidMotionParameter(_)));
}

#[test]
fn cancelled_home_keeps_tracked_position() {
    let mut rig = Rig::new();
    let token = CancellationToken::new();
    rig.sequencer.jog(AxisId::Y, "d", 2.0, None, &token).unwrap();
    let mut observer = RecordingObserver::new().cancel_on("ReturningHome", "Returning Y home", &token);

    let outcome = rig.sequencer.home(0.0, 2.0, &token, &mut observer).unwrap();

    assert_eq!(outcome, StepOutcome::Cancelled);
    assert_eq!(rig.sequencer.position().y, 2.0);
}

// ── Demo ────────────────────────────────────────────────────────────

#[test]
fn demo_traces_square_and_ends_where_it_started() {
    let mut rig = Rig::new();
    let mut observer = RecordingObserver::new();
    let journal = observer.journal();

    let done = rig
        .sequencer
        .demo(2, 2.0, Some(120.0), &CancellationToken::new(), &mut observer)
        .unwrap();

    assert_eq!(done, 2);
    assert_eq!(journal.completes(), 1);
    assert!(rig.sequencer.position().is_home());
    assert_eq!(rig.sequencer.actuator_state(), ActuatorState::Retracted);
    // Two cycles, right and left 2 in each.
    let x_steps = 2.0 * 2.0 * 2.0 * rig.steps_per_inch(AxisId::X);
    assert_eq!(rig.sim.rising_edges(rig.step_pin(AxisId::X)), x_steps as u64);
    assert_eq!(journal.messages("Demo").len(), 2 * 16 * 2);
    rig.assert_outputs_at_rest();
}

#[test]
fn cancelled_demo_goes_home() {
    let mut rig = Rig::new();
    let token = CancellationToken::new();
    let mut observer = RecordingObserver::new().cancel_on("Demo", "Tracing down", &token);
    let journal = observer.journal();

    let done = rig
        .sequencer
        .demo(3, 2.0, None, &token, &mut observer)
        .unwrap();

    assert_eq!(done, 0);
    assert_eq!(journal.cancels(), 1);
    assert_eq!(journal.completes(), 0);
    assert_eq!(rig.sequencer.position(), MachinePosition::HOME);
    rig.assert_outputs_at_rest();
}

#[test]
fn demo_distance_must_fit_the_table() {
    let mut rig = Rig::new();
    for distance in [0.0, -2.0, 42.0, f64::INFINITY] {
        let err = rig
            .sequencer
            .demo(1, distance, None, &CancellationToken::new(), &mut LogObserver)
            .unwrap_err();
        assert!(matches!(err, MotionError::InvalidMotionParameter(_)), "{distance}");
    }
}

// ── Shutdown ────────────────────────────────────────────────────────

#[test]
fn shutdown_drops_supply_and_bridge() {
    let rig = Rig::new();
    let supply = rig.config.actuator.supply_pin.unwrap();
    assert_eq!(rig.sim.level(supply), Some(Level::High));

    rig.sequencer.shutdown().unwrap();

    assert_eq!(rig.sim.level(supply), Some(Level::Low));
    rig.assert_outputs_at_rest();
}
