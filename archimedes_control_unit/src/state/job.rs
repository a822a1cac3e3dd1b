//! Cut job state machine.
//!
//! `Idle → HorizontalCut → AwaitingScrapRemoval → AwaitingContinueConfirm →
//! VerticalCut → ReturningHome → Complete`, with `Cancelled` reachable from
//! every active phase. The phase a job left when it was cancelled selects
//! the recovery path.

use archimedes_common::cutter::state::CutPhase;
use core::fmt;

/// Result of a CutPhase transition attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransitionResult {
    /// Transition succeeded: new phase.
    Ok(CutPhase),
    /// Transition rejected: reason.
    Rejected(&'static str),
}

/// Job-level event that can trigger a phase transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CutEvent {
    /// Validated request accepted.
    Accept,
    /// Head raised after the X traverse.
    HorizontalCutDone,
    /// Operator confirmed the offcut is cleared.
    ScrapRemoved,
    /// Operator confirmed the vertical cut.
    ContinueConfirmed,
    /// Operator answered "no" at a prompt.
    Declined,
    /// Y traverse finished.
    VerticalCutDone,
    /// X back at home.
    HomeReached,
    /// Cancellation observed.
    CancelRequested,
    /// Hardware fault.
    Fault,
}

/// Where the machine has to be brought back from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecoveryPath {
    /// Actuator out, head on the horizontal cut line.
    FromHorizontalCut,
    /// Actuator in, head on the vertical cut line.
    FromVerticalCut,
}

impl RecoveryPath {
    /// Recovery for a job interrupted in `phase`.
    pub const fn for_phase(phase: CutPhase) -> Self {
        if phase.is_horizontal_stage() {
            Self::FromHorizontalCut
        } else {
            Self::FromVerticalCut
        }
    }
}

impl fmt::Display for RecoveryPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::FromHorizontalCut => write!(f, "horizontal recovery"),
            Self::FromVerticalCut => write!(f, "vertical recovery"),
        }
    }
}

/// Phase holder for one cut job.
#[derive(Debug, Clone, Default)]
pub struct CutStateMachine {
    phase: CutPhase,
    /// Phase the job was in when it was cancelled.
    interrupted_in: Option<CutPhase>,
}

impl CutStateMachine {
    pub const fn new() -> Self {
        Self {
            phase: CutPhase::Idle,
            interrupted_in: None,
        }
    }

    #[inline]
    pub const fn phase(&self) -> CutPhase {
        self.phase
    }

    /// Phase left on cancellation, decline or fault.
    #[inline]
    pub const fn interrupted_in(&self) -> Option<CutPhase> {
        self.interrupted_in
    }

    /// Recovery path for a cancelled job.
    pub fn recovery_path(&self) -> Option<RecoveryPath> {
        self.interrupted_in.map(RecoveryPath::for_phase)
    }

    /// Attempt a transition given an event.
    pub fn handle_event(&mut self, event: CutEvent) -> TransitionResult {
        use CutEvent::*;
        use CutPhase::*;

        let next = match (self.phase, event) {
            (Idle, Accept) => HorizontalCut,
            (HorizontalCut, HorizontalCutDone) => AwaitingScrapRemoval,
            (AwaitingScrapRemoval, ScrapRemoved) => AwaitingContinueConfirm,
            (AwaitingContinueConfirm, ContinueConfirmed) => VerticalCut,
            (VerticalCut, VerticalCutDone) => ReturningHome,
            (ReturningHome, HomeReached) => Complete,

            (AwaitingScrapRemoval | AwaitingContinueConfirm, Declined) => {
                return self.interrupt();
            }
            (
                HorizontalCut | AwaitingScrapRemoval | AwaitingContinueConfirm | VerticalCut
                | ReturningHome,
                CancelRequested | Fault,
            ) => {
                return self.interrupt();
            }

            _ => {
                return TransitionResult::Rejected(invalid_transition_reason(self.phase, event));
            }
        };

        self.phase = next;
        TransitionResult::Ok(next)
    }

    fn interrupt(&mut self) -> TransitionResult {
        self.interrupted_in = Some(self.phase);
        self.phase = CutPhase::Cancelled;
        TransitionResult::Ok(CutPhase::Cancelled)
    }
}

fn invalid_transition_reason(phase: CutPhase, event: CutEvent) -> &'static str {
    use CutEvent::*;
    use CutPhase::*;
    match (phase, event) {
        (Complete | Cancelled, _) => "job already finished",
        (Idle, _) => "Idle: only Accept allowed",
        (_, Accept) => "job already accepted",
        (_, Declined) => "Declined only valid while awaiting the operator",
        (HorizontalCut, _) => "HorizontalCut: invalid event for current phase",
        (AwaitingScrapRemoval, _) => "AwaitingScrapRemoval: invalid event for current phase",
        (AwaitingContinueConfirm, _) => {
            "AwaitingContinueConfirm: invalid event for current phase"
        }
        (VerticalCut, _) => "VerticalCut: invalid event for current phase",
        (ReturningHome, _) => "ReturningHome: invalid event for current phase",
    }
}

// ─── Tests ──────────────────────────────────────────────────────────
