//! Scheduled delays.
//!
//! The controller never sleeps. Each transition that needs a delay hands back a
//! [`Timer`]; the driver waits `delay` and feeds the timer back in. Timers carry
//! the session generation they were scheduled under, so a timer that outlives
//! its session is recognised and dropped.

use derive_new::new;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Memorization time for flat schedules.
pub const DEFAULT_REVEAL_MS: u64 = 2000;

/// Delay that lets the player see both faces of a pair.
pub const DEFAULT_PERCEIVE_MS: u64 = 300;

/// Positive-feedback delay after a match.
pub const DEFAULT_MATCH_MS: u64 = 500;

/// Delay after a mismatch before the cards turn back over.
pub const DEFAULT_MISMATCH_MS: u64 = 700;

/// Graduated memorization times, by level position. The last entry applies
/// to every later level.
pub const GRADUATED_REVEAL_MS: [u64; 3] = [2000, 3000, 4000];

/// What a timer does when it fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, strum::Display)]
pub enum TimerKind {
    /// End of memorization: hide every card and accept input.
    RevealEnd,
    /// Both faces seen: compare the pair.
    PairPerceived,
    /// Match feedback finished: release the selection.
    MatchSettled,
    /// Mismatch feedback finished: unflip or lose.
    MismatchSettled,
}

/// A one-shot delay requested by the controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, new)]
pub struct Timer {
    /// Session generation the timer belongs to.
    pub generation: u64,
    /// Transition to run on expiry.
    pub kind: TimerKind,
    /// How long to wait.
    pub delay: Duration,
}

/// How long cards stay face-up at session start.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum RevealSchedule {
    /// Same duration for every level.
    Flat {
        /// Duration in milliseconds.
        ms: u64,
    },
    /// Longer for later levels, see [`GRADUATED_REVEAL_MS`].
    Graduated,
}

impl RevealSchedule {
    /// Returns the memorization time for a level position.
    pub fn reveal_for(&self, level_index: usize) -> Duration {
        let ms = match self {
            RevealSchedule::Flat { ms } => *ms,
            RevealSchedule::Graduated => {
                let last = GRADUATED_REVEAL_MS.len() - 1;
                GRADUATED_REVEAL_MS[level_index.min(last)]
            }
        };
        Duration::from_millis(ms)
    }
}

impl Default for RevealSchedule {
    fn default() -> Self {
        RevealSchedule::Flat {
            ms: DEFAULT_REVEAL_MS,
        }
    }
}

/// All delays used by a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimingConfig {
    /// Memorization schedule.
    pub reveal: RevealSchedule,
    /// Milliseconds before a pair is compared.
    pub perceive_ms: u64,
    /// Milliseconds of match feedback.
    pub match_ms: u64,
    /// Milliseconds of mismatch feedback.
    pub mismatch_ms: u64,
}

impl TimingConfig {
    /// Returns the delay scheduled for a timer kind at a level position.
    pub fn delay(&self, kind: TimerKind, level_index: usize) -> Duration {
        match kind {
            TimerKind::RevealEnd => self.reveal.reveal_for(level_index),
            TimerKind::PairPerceived => Duration::from_millis(self.perceive_ms),
            TimerKind::MatchSettled => Duration::from_millis(self.match_ms),
            TimerKind::MismatchSettled => Duration::from_millis(self.mismatch_ms),
        }
    }
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            reveal: RevealSchedule::default(),
            perceive_ms: DEFAULT_PERCEIVE_MS,
            match_ms: DEFAULT_MATCH_MS,
            mismatch_ms: DEFAULT_MISMATCH_MS,
        }
    }
}
