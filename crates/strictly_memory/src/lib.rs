//! Strictly Memory - matching-pairs game logic.
//!
//! Pure, deterministic game rules with no I/O:
//!
//! - **Board**: shuffled boards of paired cards for a level
//! - **Session**: the memorize → flip → resolve state machine with input locking
//! - **Ledger**: the contract for the cross-session lives budget
//! - **Invariants**: first-class properties checked after every transition
//!
//! # Example
//!
//! ```
//! use rand::SeedableRng;
//! use rand::rngs::StdRng;
//! use strictly_memory::{
//!     InMemoryLedger, LevelCatalog, LevelConfig, SessionController, Status, TimingConfig,
//! };
//!
//! let level = LevelConfig::new("bg.png", vec!["sun.png".into(), "moon.png".into()]);
//! let catalog = LevelCatalog::new(vec![level]).unwrap();
//! let mut controller = SessionController::new(
//!     catalog,
//!     InMemoryLedger::with_lives(8),
//!     StdRng::seed_from_u64(1),
//!     TimingConfig::default(),
//! );
//!
//! let reveal = controller.select_level(0).unwrap();
//! assert_eq!(controller.status(), Some(Status::Memorizing));
//!
//! // The driver waits `reveal.delay`, then hands the timer back.
//! controller.on_timer(reveal);
//! assert_eq!(controller.status(), Some(Status::AwaitingInput));
//! ```

#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod action;
mod board;
mod catalog;
mod controller;
mod error;
mod invariants;
mod ledger;
mod session;
mod timing;
mod types;

pub use action::{IgnoreReason, SelectOutcome};
pub use board::{canonical, generate, validate};
pub use catalog::LevelCatalog;
pub use controller::{SessionController, SessionEvent};
pub use error::{ConfigError, LedgerError};
pub use invariants::{
    Invariant, InvariantSet, InvariantViolation, MatchedRevealedInvariant, PairingInvariant,
    SelectionInvariant, SessionInvariants, TerminalLockInvariant, WinCompletenessInvariant,
};
pub use ledger::{
    DEFAULT_COOLDOWN_SECS, DEFAULT_LIVES, InMemoryLedger, LedgerSnapshot, LivesLedger,
    ResetPolicy, SharedLedger,
};
pub use session::{
    CHOOSE_MESSAGE, LOST_MESSAGE, MATCH_MESSAGE, MISMATCH_MESSAGE, SessionState, SessionView,
    completed_message, memorize_message,
};
pub use timing::{
    DEFAULT_MATCH_MS, DEFAULT_MISMATCH_MS, DEFAULT_PERCEIVE_MS, DEFAULT_REVEAL_MS,
    GRADUATED_REVEAL_MS, RevealSchedule, Timer, TimerKind, TimingConfig,
};
pub use types::{Card, CardId, CardView, LevelConfig, Status};

/// Rules shown to the player.
pub const RULES: &str = "Flip two cards at a time to find matching pairs. You are given a \
memorization period before the cards are turned face down. If the two flipped cards match, \
they remain open; if not, they will flip back and cost a life. Try to match all pairs before \
your lives run out!";
