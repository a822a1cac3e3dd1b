//! Integration test: cancellation, operator "no" and recovery paths.
//!
//! Hooks on phase messages run synchronously on the job thread, so a cancel
//! raised from a hook lands exactly before the announced macro-step runs.

use super::{Journal, Note, RecordingObserver, Rig, ScriptedPrompt};
use archimedes_common::prelude::*;
use archimedes_control_unit::cancel::CancellationToken;
use archimedes_control_unit::observer::{AutoConfirm, ConfirmationPrompt, Prompt};
use archimedes_control_unit::sequencer::{JobOutcome, RecoveryPath};
use archimedes_control_unit::state::position::MachinePosition;

// ── Helpers ─────────────────────────────────────────────────────────

const CANCELLED: &str = "Cancelled";

fn run(
    rig: &mut Rig,
    token: &CancellationToken,
    observer: &mut RecordingObserver,
    prompt: &mut dyn ConfirmationPrompt,
) -> JobOutcome {
    rig.sequencer
        .run_job(CutRequest::new(24.0, 18.0), token, observer, prompt)
        .unwrap()
}

fn assert_homed_after_cancel(rig: &Rig, journal: &Journal) {
    assert_eq!(rig.sequencer.position(), MachinePosition::HOME);
    assert_eq!(rig.sequencer.actuator_state(), ActuatorState::Retracted);
    assert_eq!(journal.cancels(), 1);
    assert_eq!(journal.completes(), 0);
    assert!(journal.errors().is_empty());
    rig.assert_outputs_at_rest();
}

/// Recovery macro-steps, without the "done" acknowledgements.
fn recovery_steps(journal: &Journal) -> Vec<String> {
    journal
        .messages(CANCELLED)
        .into_iter()
        .filter(|m| !m.ends_with(": done"))
        .collect()
}

// ── Horizontal stage ────────────────────────────────────────────────

#[test]
fn cancel_before_horizontal_traverse() {
    let mut rig = Rig::new();
    let token = CancellationToken::new();
    let mut observer =
        RecordingObserver::new().cancel_on("HorizontalCut", "Cutting horizontally", &token);
    let journal = observer.journal();

    let outcome = run(&mut rig, &token, &mut observer, &mut AutoConfirm);

    assert_eq!(
        outcome,
        JobOutcome::Cancelled {
            recovery: RecoveryPath::FromHorizontalCut,
            homed: true
        }
    );
    assert!(
        journal
            .messages("HorizontalCut")
            .contains(&"Cutting horizontally: interrupted".to_string())
    );
    // Head down, actuator out, Y on the cut line, X never moved.
    assert_eq!(
        recovery_steps(&journal),
        vec!["Raising head", "Retracting actuator", "Returning Y home"]
    );
    assert_homed_after_cancel(&rig, &journal);
}

#[test]
fn cancel_mid_traverse_returns_executed_steps() {
    let token = CancellationToken::new();
    // Y to the cut line (23000 steps), 13 dwell polls, head lowered (200
    // steps), then 500 X steps.
    let holds = 2 * 23_000 + 13 + 2 * 200 + 2 * 500;
    let mut rig = Rig::cancelling_after(holds, &token);
    let mut observer = RecordingObserver::new();
    let journal = observer.journal();

    let outcome = run(&mut rig, &token, &mut observer, &mut AutoConfirm);

    assert!(matches!(
        outcome,
        JobOutcome::Cancelled {
            recovery: RecoveryPath::FromHorizontalCut,
            homed: true
        }
    ));
    // 500 steps out, the same 500 back.
    assert_eq!(rig.sim.rising_edges(rig.step_pin(AxisId::X)), 1000);
    assert_eq!(
        recovery_steps(&journal),
        vec![
            "Raising head",
            "Retracting actuator",
            "Returning Y home",
            "Returning X home"
        ]
    );
    assert_homed_after_cancel(&rig, &journal);
}

#[test]
fn cancel_during_actuator_stroke_releases_bridge() {
    let mut rig = Rig::new();
    let token = CancellationToken::new();
    let mut observer =
        RecordingObserver::new().cancel_on("HorizontalCut", "Extending actuator", &token);
    let journal = observer.journal();

    let outcome = run(&mut rig, &token, &mut observer, &mut AutoConfirm);

    assert!(matches!(outcome, JobOutcome::Cancelled { .. }));
    // Stroke interrupted part way: rod position unknown, so it is retracted.
    assert_eq!(
        recovery_steps(&journal),
        vec!["Retracting actuator", "Returning Y home"]
    );
    assert_homed_after_cancel(&rig, &journal);
}

#[test]
fn declined_scrap_prompt_takes_horizontal_recovery() {
    let mut rig = Rig::new();
    let mut observer = RecordingObserver::new();
    let journal = observer.journal();
    let mut prompt = ScriptedPrompt::answering(&[false]);

    let outcome = run(&mut rig, &CancellationToken::new(), &mut observer, &mut prompt);

    assert_eq!(
        outcome,
        JobOutcome::Cancelled {
            recovery: RecoveryPath::FromHorizontalCut,
            homed: true
        }
    );
    assert_eq!(prompt.asked, vec![Prompt::RemoveScrap]);
    assert!(journal.messages("VerticalCut").is_empty());
    assert_eq!(
        recovery_steps(&journal),
        vec!["Retracting actuator", "Returning Y home", "Returning X home"]
    );
    assert_homed_after_cancel(&rig, &journal);
}

#[test]
fn declined_continue_prompt_takes_horizontal_recovery() {
    let mut rig = Rig::new();
    let mut observer = RecordingObserver::new();
    let journal = observer.journal();
    let mut prompt = ScriptedPrompt::answering(&[true, false]);

    let outcome = run(&mut rig, &CancellationToken::new(), &mut observer, &mut prompt);

    assert!(matches!(
        outcome,
        JobOutcome::Cancelled {
            recovery: RecoveryPath::FromHorizontalCut,
            ..
        }
    ));
    assert_eq!(prompt.asked, vec![Prompt::RemoveScrap, Prompt::ContinueVertical]);
    assert_homed_after_cancel(&rig, &journal);
}

#[test]
fn cancel_while_waiting_for_operator() {
    let mut rig = Rig::new();
    let token = CancellationToken::new();
    let mut observer = RecordingObserver::new().cancel_on(
        "AwaitingScrapRemoval",
        Prompt::RemoveScrap.question(),
        &token,
    );
    let journal = observer.journal();

    let outcome = run(&mut rig, &token, &mut observer, &mut AutoConfirm);

    assert!(matches!(
        outcome,
        JobOutcome::Cancelled {
            recovery: RecoveryPath::FromHorizontalCut,
            ..
        }
    ));
    assert_homed_after_cancel(&rig, &journal);
}

// ── Vertical stage ──────────────────────────────────────────────────

#[test]
fn cancel_during_vertical_cut() {
    let mut rig = Rig::new();
    let token = CancellationToken::new();
    let mut observer =
        RecordingObserver::new().cancel_on("VerticalCut", "Cutting vertically", &token);
    let journal = observer.journal();

    let outcome = run(&mut rig, &token, &mut observer, &mut AutoConfirm);

    assert_eq!(
        outcome,
        JobOutcome::Cancelled {
            recovery: RecoveryPath::FromVerticalCut,
            homed: true
        }
    );
    // Actuator already in: no retract.
    assert_eq!(
        recovery_steps(&journal),
        vec!["Raising head", "Returning Y home", "Returning X home"]
    );
    assert_homed_after_cancel(&rig, &journal);
}

#[test]
fn cancel_while_returning_home() {
    let mut rig = Rig::new();
    let token = CancellationToken::new();
    let mut observer =
        RecordingObserver::new().cancel_on("ReturningHome", "Returning Y home", &token);
    let journal = observer.journal();

    let outcome = run(&mut rig, &token, &mut observer, &mut AutoConfirm);

    assert!(matches!(
        outcome,
        JobOutcome::Cancelled {
            recovery: RecoveryPath::FromVerticalCut,
            homed: true
        }
    ));
    assert_eq!(
        recovery_steps(&journal),
        vec!["Returning Y home", "Returning X home"]
    );
    assert_homed_after_cancel(&rig, &journal);
}

// ── Edge cases ──────────────────────────────────────────────────────

#[test]
fn pre_cancelled_token_moves_nothing() {
    let mut rig = Rig::new();
    let token = CancellationToken::new();
    token.request_cancel();
    let mut observer = RecordingObserver::new();
    let journal = observer.journal();
    let writes_before = rig.sim.total_writes();

    let outcome = run(&mut rig, &token, &mut observer, &mut AutoConfirm);

    assert!(matches!(
        outcome,
        JobOutcome::Cancelled {
            recovery: RecoveryPath::FromHorizontalCut,
            homed: true
        }
    ));
    assert_eq!(rig.sim.total_writes(), writes_before);
    assert_eq!(journal.notes().len(), 1);
    assert!(matches!(&journal.notes()[0], Note::Cancelled(m) if m.contains("returned home")));
}

#[test]
fn recovery_ignores_the_stale_cancel() {
    let mut rig = Rig::new();
    let token = CancellationToken::new();
    let mut observer =
        RecordingObserver::new().cancel_on("VerticalCut", "Lowering head", &token);
    let journal = observer.journal();

    run(&mut rig, &token, &mut observer, &mut AutoConfirm);

    assert!(token.is_cancelled());
    assert!(
        journal
            .messages(CANCELLED)
            .iter()
            .all(|m| !m.ends_with(": interrupted"))
    );
    assert_homed_after_cancel(&rig, &journal);
}
