//! The lives ledger: a cross-session mistake budget with a time-based reset.
//!
//! Sessions only read the current count and decrement it. The ledger itself
//! decides when the budget refills, according to its [`ResetPolicy`].

use super::error::LedgerError;
use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};
use tracing::{debug, info, instrument};

/// Default size of the lives budget.
pub const DEFAULT_LIVES: u32 = 8;

/// Default refill window (one hour).
pub const DEFAULT_COOLDOWN_SECS: i64 = 60 * 60;

/// Contract every lives ledger fulfils.
///
/// Reads take `&mut self` because a read may apply the reset policy.
pub trait LivesLedger {
    /// Returns the current number of lives.
    fn current_lives(&mut self) -> Result<u32, LedgerError>;

    /// Removes one life, flooring at zero, and returns the new count.
    fn decrement(&mut self) -> Result<u32, LedgerError>;

    /// Overwrites the count (clamped to the ledger maximum) and returns it.
    fn set_lives(&mut self, lives: u32) -> Result<u32, LedgerError>;

    /// Size of a full budget.
    fn max_lives(&self) -> u32 {
        DEFAULT_LIVES
    }
}

impl<L: LivesLedger + ?Sized> LivesLedger for Box<L> {
    fn current_lives(&mut self) -> Result<u32, LedgerError> {
        (**self).current_lives()
    }

    fn decrement(&mut self) -> Result<u32, LedgerError> {
        (**self).decrement()
    }

    fn set_lives(&mut self, lives: u32) -> Result<u32, LedgerError> {
        (**self).set_lives(lives)
    }

    fn max_lives(&self) -> u32 {
        (**self).max_lives()
    }
}

/// A ledger shared between sessions and other consumers.
pub type SharedLedger<L> = Arc<Mutex<L>>;

impl<L: LivesLedger + ?Sized> LivesLedger for Arc<Mutex<L>> {
    fn current_lives(&mut self) -> Result<u32, LedgerError> {
        self.lock()
            .map_err(|_| LedgerError::new("Ledger lock poisoned"))?
            .current_lives()
    }

    fn decrement(&mut self) -> Result<u32, LedgerError> {
        self.lock()
            .map_err(|_| LedgerError::new("Ledger lock poisoned"))?
            .decrement()
    }

    fn set_lives(&mut self, lives: u32) -> Result<u32, LedgerError> {
        self.lock()
            .map_err(|_| LedgerError::new("Ledger lock poisoned"))?
            .set_lives(lives)
    }

    fn max_lives(&self) -> u32 {
        self.lock().map_or(DEFAULT_LIVES, |ledger| ledger.max_lives())
    }
}

/// Persistable ledger contents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerSnapshot {
    /// Remaining lives.
    pub lives: u32,
    /// When the budget was last refilled. `None` means never.
    pub last_reset: Option<DateTime<Utc>>,
}

impl LedgerSnapshot {
    /// A full budget that has never been refilled.
    pub fn fresh(max_lives: u32) -> Self {
        Self {
            lives: max_lives,
            last_reset: None,
        }
    }
}

/// When and how far the budget refills.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResetPolicy {
    max_lives: u32,
    cooldown: TimeDelta,
}

impl ResetPolicy {
    /// Creates a policy refilling to `max_lives` once `cooldown` has elapsed.
    pub fn new(max_lives: u32, cooldown: TimeDelta) -> Self {
        Self {
            max_lives,
            cooldown,
        }
    }

    /// Returns the budget maximum.
    pub fn max_lives(&self) -> u32 {
        self.max_lives
    }

    /// Returns the refill window.
    pub fn cooldown(&self) -> TimeDelta {
        self.cooldown
    }

    /// Refills the snapshot if the window has elapsed. Returns true on refill.
    #[instrument(skip(self))]
    pub fn apply(&self, snapshot: &mut LedgerSnapshot, now: DateTime<Utc>) -> bool {
        let due = match snapshot.last_reset {
            None => true,
            Some(last) => now.signed_duration_since(last) > self.cooldown,
        };
        if due {
            info!(max_lives = self.max_lives, "Refilling lives");
            snapshot.lives = self.max_lives;
            snapshot.last_reset = Some(now);
        }
        due
    }
}

impl Default for ResetPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_LIVES, TimeDelta::seconds(DEFAULT_COOLDOWN_SECS))
    }
}

/// Ledger held entirely in memory.
///
/// Also used as the fallback when a persistent ledger fails.
#[derive(Debug, Clone)]
pub struct InMemoryLedger {
    snapshot: LedgerSnapshot,
    policy: ResetPolicy,
}

impl InMemoryLedger {
    /// Creates a full ledger governed by `policy`.
    #[instrument]
    pub fn new(policy: ResetPolicy) -> Self {
        Self {
            snapshot: LedgerSnapshot::fresh(policy.max_lives()),
            policy,
        }
    }

    /// Creates a ledger from previously stored contents.
    #[instrument]
    pub fn from_snapshot(snapshot: LedgerSnapshot, policy: ResetPolicy) -> Self {
        Self { snapshot, policy }
    }

    /// Creates a ledger holding `lives`, with the refill window starting now.
    #[instrument]
    pub fn with_lives(lives: u32) -> Self {
        Self {
            snapshot: LedgerSnapshot {
                lives,
                last_reset: Some(Utc::now()),
            },
            policy: ResetPolicy::default(),
        }
    }

    /// Returns the current contents without applying the reset policy.
    pub fn snapshot(&self) -> LedgerSnapshot {
        self.snapshot
    }

    /// Returns the reset policy.
    pub fn policy(&self) -> ResetPolicy {
        self.policy
    }

    /// Applies the reset policy as of `now`. Returns true on refill.
    #[instrument(skip(self))]
    pub fn refresh_at(&mut self, now: DateTime<Utc>) -> bool {
        self.policy.apply(&mut self.snapshot, now)
    }

    /// Removes one life without consulting the clock.
    pub(crate) fn take_one(&mut self) -> u32 {
        self.snapshot.lives = self.snapshot.lives.saturating_sub(1);
        debug!(lives = self.snapshot.lives, "Life consumed");
        self.snapshot.lives
    }
}

impl LivesLedger for InMemoryLedger {
    fn current_lives(&mut self) -> Result<u32, LedgerError> {
        self.refresh_at(Utc::now());
        Ok(self.snapshot.lives)
    }

    fn decrement(&mut self) -> Result<u32, LedgerError> {
        self.refresh_at(Utc::now());
        Ok(self.take_one())
    }

    fn set_lives(&mut self, lives: u32) -> Result<u32, LedgerError> {
        self.snapshot.lives = lives.min(self.policy.max_lives());
        Ok(self.snapshot.lives)
    }

    fn max_lives(&self) -> u32 {
        self.policy.max_lives()
    }
}
