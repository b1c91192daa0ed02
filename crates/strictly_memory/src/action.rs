//! Results of a card selection.
//!
//! Out-of-turn taps are not errors. They come back as [`SelectOutcome::Ignored`]
//! with the guard that rejected them, and leave the session untouched.

use super::timing::Timer;
use serde::{Deserialize, Serialize};

/// Why a selection was dropped. Guards are checked in declaration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, strum::Display)]
pub enum IgnoreReason {
    /// No session is running.
    NoSession,
    /// Memorization or pair resolution in progress, or the session is over.
    InputLocked,
    /// The lives budget is exhausted.
    NoLivesLeft,
    /// The index is not on the board.
    OutOfRange,
    /// The card is already face-up or matched.
    AlreadyFaceUp,
    /// Two cards are already selected.
    SelectionFull,
}

/// Outcome of selecting a card.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectOutcome {
    /// First card of a pair turned face-up.
    Flipped,
    /// Second card turned face-up; the pair resolves when the timer fires.
    PairSelected(Timer),
    /// Nothing changed.
    Ignored(IgnoreReason),
}

impl SelectOutcome {
    /// Returns the timer the driver must schedule, if any.
    pub fn timer(&self) -> Option<Timer> {
        match self {
            SelectOutcome::PairSelected(timer) => Some(*timer),
            _ => None,
        }
    }

    /// Returns true if the selection was dropped.
    pub fn is_ignored(&self) -> bool {
        matches!(self, SelectOutcome::Ignored(_))
    }
}

impl std::fmt::Display for SelectOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SelectOutcome::Flipped => write!(f, "Flipped"),
            SelectOutcome::PairSelected(_) => write!(f, "Pair selected"),
            SelectOutcome::Ignored(reason) => write!(f, "Ignored ({})", reason),
        }
    }
}
