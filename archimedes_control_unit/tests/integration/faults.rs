//! Integration test: hardware faults during a cut job.
//!
//! A fault ends the job as `Faulted` with exactly one error notification,
//! after the outputs were forced to rest and homing was attempted.

use super::{RecordingObserver, Rig};
use archimedes_common::prelude::*;
use archimedes_control_unit::cancel::CancellationToken;
use archimedes_control_unit::error::MotionError;
use archimedes_control_unit::observer::AutoConfirm;
use archimedes_control_unit::sequencer::{JobOutcome, RecoveryPath};
use archimedes_control_unit::state::position::MachinePosition;

fn run(rig: &mut Rig, observer: &mut RecordingObserver) -> JobOutcome {
    rig.sequencer
        .run_job(
            CutRequest::new(24.0, 18.0),
            &CancellationToken::new(),
            observer,
            &mut AutoConfirm,
        )
        .unwrap()
}

fn faulted_pin(outcome: &JobOutcome) -> Option<(PinId, RecoveryPath)> {
    match outcome {
        JobOutcome::Faulted {
            error: MotionError::HardwarePortFault(HalError::PortFault { pin, .. }),
            recovery,
        } => Some((*pin, *recovery)),
        _ => None,
    }
}

#[test]
fn dead_step_line_faults_the_job() {
    let mut rig = Rig::new();
    let x_step = rig.step_pin(AxisId::X);
    rig.sim.fail_pin(x_step);
    let mut observer = RecordingObserver::new();
    let journal = observer.journal();

    let outcome = run(&mut rig, &mut observer);

    assert_eq!(
        faulted_pin(&outcome),
        Some((x_step, RecoveryPath::FromHorizontalCut))
    );
    assert_eq!(journal.errors().len(), 1);
    assert_eq!(journal.cancels(), 0);
    assert_eq!(journal.completes(), 0);
    assert!(
        journal
            .messages("HorizontalCut")
            .contains(&"Cutting horizontally: failed".to_string())
    );
    // X never left home, so the remaining axes could still be homed.
    assert_eq!(rig.sequencer.position(), MachinePosition::HOME);
    assert_eq!(rig.sequencer.actuator_state(), ActuatorState::Retracted);
    rig.assert_outputs_at_rest();
}

#[test]
fn transient_fault_homes_from_executed_steps() {
    let mut rig = Rig::new();
    // Y direction write plus 100 full steps succeed.
    rig.sim.fail_after_writes(1 + 2 * 100);
    let mut observer = RecordingObserver::new();
    let journal = observer.journal();

    let outcome = run(&mut rig, &mut observer);

    assert_eq!(
        faulted_pin(&outcome),
        Some((rig.step_pin(AxisId::Y), RecoveryPath::FromHorizontalCut))
    );
    assert_eq!(journal.errors().len(), 1);
    // 100 steps down, 100 back.
    assert_eq!(rig.sim.rising_edges(rig.step_pin(AxisId::Y)), 200);
    assert_eq!(rig.sequencer.position(), MachinePosition::HOME);
    rig.assert_outputs_at_rest();
}

#[test]
fn failed_recovery_still_reports_one_error() {
    let mut rig = Rig::new();
    let y_step = rig.step_pin(AxisId::Y);
    let sim = rig.sim.clone();
    let mut observer = RecordingObserver::new().on("VerticalCut", "Cutting vertically", move || {
        sim.fail_pin(y_step)
    });
    let journal = observer.journal();

    let outcome = run(&mut rig, &mut observer);

    assert_eq!(
        faulted_pin(&outcome),
        Some((y_step, RecoveryPath::FromVerticalCut))
    );
    assert_eq!(journal.errors().len(), 1);
    assert_eq!(journal.cancels(), 0);
    let recovery = journal.messages("Cancelled");
    assert!(recovery.contains(&"Raising head: done".to_string()));
    assert!(recovery.contains(&"Returning Y home: failed".to_string()));

    // Head raised, stuck on the vertical cut line.
    let position = rig.sequencer.position();
    assert!(!position.head_lowered());
    assert_eq!(position.x, 24.0);
    assert_eq!(position.y, 23.0);
    rig.assert_outputs_at_rest();
}

#[test]
fn actuator_fault_leaves_bridge_released() {
    let mut rig = Rig::new();
    let enable = rig.config.actuator.enable_pin;
    rig.sim.fail_pin(enable);
    let mut observer = RecordingObserver::new();
    let journal = observer.journal();

    let outcome = run(&mut rig, &mut observer);

    assert_eq!(
        faulted_pin(&outcome),
        Some((enable, RecoveryPath::FromHorizontalCut))
    );
    assert_eq!(journal.errors().len(), 1);
    // Rod position unknown after the failed stroke.
    assert!(rig.sequencer.actuator_state().needs_retract());
    rig.assert_outputs_at_rest();
}
