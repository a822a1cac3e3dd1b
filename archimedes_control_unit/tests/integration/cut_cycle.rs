//! Integration test: full cut job through every phase.

use super::{Rig, RecordingObserver, ScriptedPrompt};
use archimedes_common::prelude::*;
use archimedes_control_unit::cancel::CancellationToken;
use archimedes_control_unit::error::MotionError;
use archimedes_control_unit::observer::{AutoConfirm, Prompt};
use archimedes_control_unit::sequencer::JobOutcome;
use archimedes_control_unit::state::position::MachinePosition;

#[test]
fn cut_job_completes_and_returns_home() {
    let mut rig = Rig::new();
    let mut observer = RecordingObserver::new();
    let journal = observer.journal();

    let outcome = rig
        .sequencer
        .run_job(
            CutRequest::new(24.0, 18.0),
            &CancellationToken::new(),
            &mut observer,
            &mut AutoConfirm,
        )
        .unwrap();

    assert_eq!(outcome, JobOutcome::Completed);
    assert_eq!(journal.completes(), 1);
    assert_eq!(journal.cancels(), 0);
    assert!(journal.errors().is_empty());
    assert_eq!(rig.sequencer.position(), MachinePosition::HOME);
    assert_eq!(rig.sequencer.actuator_state(), ActuatorState::Retracted);
    rig.assert_outputs_at_rest();
}

#[test]
fn step_counts_follow_the_cut_geometry() {
    let mut rig = Rig::new();
    rig.sequencer
        .run_job(
            CutRequest::new(24.0, 18.0),
            &CancellationToken::new(),
            &mut RecordingObserver::new(),
            &mut AutoConfirm,
        )
        .unwrap();

    // X: 46 right, 22 left, 24 left.
    let x_steps = (46.0 + 22.0 + 24.0) * rig.steps_per_inch(AxisId::X);
    // Y: 23 to the cut line, 18 cut, 41 home.
    let y_steps = (23.0 + 18.0 + 41.0) * rig.steps_per_inch(AxisId::Y);
    // Z: lowered and raised twice.
    let z_steps = 4.0 * rig.steps_per_inch(AxisId::Z);

    assert_eq!(rig.sim.rising_edges(rig.step_pin(AxisId::X)), x_steps as u64);
    assert_eq!(rig.sim.rising_edges(rig.step_pin(AxisId::Y)), y_steps as u64);
    assert_eq!(rig.sim.rising_edges(rig.step_pin(AxisId::Z)), z_steps as u64);
}

#[test]
fn phases_and_notifications_in_order() {
    let mut rig = Rig::new();
    let mut observer = RecordingObserver::new();
    let journal = observer.journal();
    let mut prompt = ScriptedPrompt::default();

    rig.sequencer
        .run_job(
            CutRequest::new(30.0, 20.0),
            &CancellationToken::new(),
            &mut observer,
            &mut prompt,
        )
        .unwrap();

    assert_eq!(
        journal.phases(),
        vec![
            "HorizontalCut",
            "AwaitingScrapRemoval",
            "AwaitingContinueConfirm",
            "VerticalCut",
            "ReturningHome",
        ]
    );
    assert_eq!(prompt.asked, vec![Prompt::RemoveScrap, Prompt::ContinueVertical]);

    // Every macro-step is announced before and acknowledged after.
    assert_eq!(
        journal.messages("HorizontalCut"),
        vec![
            "Moving Y to cut height",
            "Moving Y to cut height: done",
            "Extending actuator",
            "Extending actuator: done",
            "Lowering head",
            "Lowering head: done",
            "Cutting horizontally",
            "Cutting horizontally: done",
            "Raising head",
            "Raising head: done",
        ]
    );
    assert_eq!(
        journal.messages("ReturningHome"),
        vec![
            "Raising head",
            "Raising head: done",
            "Returning Y home",
            "Returning Y home: done",
            "Returning X home",
            "Returning X home: done",
        ]
    );
}

#[test]
fn full_size_panel_skips_zero_length_moves() {
    let mut rig = Rig::new();
    let mut observer = RecordingObserver::new();
    let journal = observer.journal();

    let outcome = rig
        .sequencer
        .run_job(
            CutRequest::new(46.0, 41.0),
            &CancellationToken::new(),
            &mut observer,
            &mut AutoConfirm,
        )
        .unwrap();

    assert_eq!(outcome, JobOutcome::Completed);
    assert_eq!(rig.sequencer.position(), MachinePosition::HOME);
    // Still reported, but no pulses.
    assert!(
        journal
            .messages("VerticalCut")
            .contains(&"Moving X to cut offset: done".to_string())
    );
    let y_steps = (41.0 + 41.0) * rig.steps_per_inch(AxisId::Y);
    assert_eq!(rig.sim.rising_edges(rig.step_pin(AxisId::Y)), y_steps as u64);
}

#[test]
fn smallest_panel_is_accepted() {
    let mut rig = Rig::new();
    let outcome = rig
        .sequencer
        .run_job(
            CutRequest::new(12.0, 12.0),
            &CancellationToken::new(),
            &mut RecordingObserver::new(),
            &mut AutoConfirm,
        )
        .unwrap();
    assert_eq!(outcome, JobOutcome::Completed);
}

#[test]
fn out_of_range_request_moves_nothing() {
    let mut rig = Rig::new();
    let mut observer = RecordingObserver::new();
    let journal = observer.journal();
    let writes_before = rig.sim.total_writes();

    for (h, v) in [(50.0, 18.0), (24.0, 11.9), (f64::NAN, 20.0)] {
        let err = rig
            .sequencer
            .run_job(
                CutRequest::new(h, v),
                &CancellationToken::new(),
                &mut observer,
                &mut AutoConfirm,
            )
            .unwrap_err();
        assert!(matches!(err, MotionError::CutSizeOutOfRange(_)), "{h} x {v}");
    }

    assert_eq!(rig.sim.total_writes(), writes_before);
    assert!(journal.notes().is_empty());
}

#[test]
fn back_to_back_jobs_reuse_the_sequencer() {
    let mut rig = Rig::new();
    for (h, v) in [(24.0, 18.0), (40.0, 30.0)] {
        let outcome = rig
            .sequencer
            .run_job(
                CutRequest::new(h, v),
                &CancellationToken::new(),
                &mut RecordingObserver::new(),
                &mut AutoConfirm,
            )
            .unwrap();
        assert_eq!(outcome, JobOutcome::Completed);
        assert!(rig.sequencer.position().is_home());
    }
}

#[test]
fn shipped_config_matches_factory_defaults() {
    let path = std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join("config/machine.toml");
    let config = load_machine_config(&path).unwrap();
    assert_eq!(config, MachineConfig::default());
}
