//! Cut job phases.
//!
//! `Idle → HorizontalCut → AwaitingScrapRemoval → AwaitingContinueConfirm →
//! VerticalCut → ReturningHome → {Complete | Cancelled}`

use core::fmt;
use serde::{Deserialize, Serialize};

/// Phase of a cut job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[repr(u8)]
pub enum CutPhase {
    /// No job accepted yet.
    #[default]
    Idle = 0,
    /// Y to cut height, actuator out, head down, X across, head up.
    HorizontalCut = 1,
    /// Waiting for the operator to clear the offcut.
    AwaitingScrapRemoval = 2,
    /// Waiting for the go-ahead on the vertical cut.
    AwaitingContinueConfirm = 3,
    /// X back to offset, actuator in, head down, Y down.
    VerticalCut = 4,
    /// Head up, Y and X back to home.
    ReturningHome = 5,
    /// Job finished normally. Terminal.
    Complete = 6,
    /// Job stopped by cancellation, decline or fault. Terminal.
    Cancelled = 7,
}

impl CutPhase {
    /// `true` for `Complete` and `Cancelled`.
    #[inline]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Complete | Self::Cancelled)
    }

    /// `true` while the machine is still laid out for the horizontal cut.
    #[inline]
    pub const fn is_horizontal_stage(self) -> bool {
        matches!(
            self,
            Self::HorizontalCut | Self::AwaitingScrapRemoval | Self::AwaitingContinueConfirm
        )
    }

    /// Human-readable phase name.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Idle => "Idle",
            Self::HorizontalCut => "HorizontalCut",
            Self::AwaitingScrapRemoval => "AwaitingScrapRemoval",
            Self::AwaitingContinueConfirm => "AwaitingContinueConfirm",
            Self::VerticalCut => "VerticalCut",
            Self::ReturningHome => "ReturningHome",
            Self::Complete => "Complete",
            Self::Cancelled => "Cancelled",
        }
    }
}

impl fmt::Display for CutPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
