//! Pin identifiers and output levels.

use core::fmt;
use core::str::FromStr;
use serde::{Deserialize, Serialize};

/// Output line number as understood by the active driver.
pub type PinId = u16;

/// Logic level of a digital output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    /// Pin driven low (released).
    #[default]
    Low,
    /// Pin driven high.
    High,
}

impl Level {
    /// The opposite level.
    #[inline]
    pub const fn inverse(self) -> Self {
        match self {
            Self::Low => Self::High,
            Self::High => Self::Low,
        }
    }

    /// `true` for `High`.
    #[inline]
    pub const fn is_high(self) -> bool {
        matches!(self, Self::High)
    }
}

impl From<bool> for Level {
    fn from(value: bool) -> Self {
        if value { Self::High } else { Self::Low }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Low => write!(f, "LOW"),
            Self::High => write!(f, "HIGH"),
        }
    }
}

impl FromStr for Level {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "low" | "0" => Ok(Self::Low),
            "high" | "1" => Ok(Self::High),
            _ => Err(format!("unknown level: {s:?}, expected \"low\" or \"high\"")),
        }
    }
}
