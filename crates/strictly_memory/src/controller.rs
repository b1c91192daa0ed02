//! Session controller: the matching-pairs state machine.
//!
//! ```text
//! start ──► Memorizing ──RevealEnd──► AwaitingInput ──2nd flip──► Resolving
//!                                          ▲                         │
//!                                          └──Match/MismatchSettled──┘
//!                                                       │
//!                                          all matched ─┴─ lives < 1
//!                                               ▼              ▼
//!                                              Won            Lost
//! ```
//!
//! The controller is driven by two kinds of input: player selections and
//! expired [`Timer`]s. It never sleeps. Operations that need a delay return a
//! timer, and the driver hands it back to [`SessionController::on_timer`] once
//! the delay has elapsed. Every session start bumps a generation counter, and
//! timers from an earlier generation are dropped on arrival.
//!
//! Only one pair resolution can be in flight: the input lock is set the moment
//! the second card is flipped and released only when the resolution settles.

use super::action::{IgnoreReason, SelectOutcome};
use super::board;
use super::catalog::LevelCatalog;
use super::error::ConfigError;
use super::invariants::{InvariantSet, SessionInvariants};
use super::ledger::LivesLedger;
use super::session::{
    CHOOSE_MESSAGE, LOST_MESSAGE, MATCH_MESSAGE, MISMATCH_MESSAGE, SessionState, SessionView,
    completed_message,
};
use super::timing::{Timer, TimerKind, TimingConfig};
use super::types::{LevelConfig, Status};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use tracing::{debug, error, info, instrument, warn};

/// Signals for the presentation shell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SessionEvent {
    /// A fresh session began memorization.
    Started {
        /// Catalog position of the level.
        level_index: usize,
        /// Generation of the new session.
        generation: u64,
    },
    /// The session status changed.
    StatusChanged(Status),
    /// The observed lives count changed.
    LivesChanged(u32),
    /// Every pair was matched. Fired once per session.
    Won {
        /// Catalog position of the level.
        level_index: usize,
    },
    /// The lives budget ran out. Fired once per session.
    Lost {
        /// Catalog position of the level.
        level_index: usize,
    },
    /// The player left the session.
    Abandoned,
}

/// Owns the live session and coordinates with the lives ledger.
#[derive(Debug)]
pub struct SessionController<L, R = StdRng> {
    catalog: LevelCatalog,
    ledger: L,
    rng: R,
    timing: TimingConfig,
    session: Option<SessionState>,
    generation: u64,
    fallback_lives: Option<u32>,
    last_lives: Option<u32>,
    events: Vec<SessionEvent>,
}

impl<L: LivesLedger> SessionController<L, StdRng> {
    /// Creates a controller with an entropy-seeded shuffle.
    #[instrument(skip(catalog, ledger))]
    pub fn with_entropy(catalog: LevelCatalog, ledger: L, timing: TimingConfig) -> Self {
        Self::new(catalog, ledger, StdRng::from_entropy(), timing)
    }
}

impl<L: LivesLedger, R: Rng> SessionController<L, R> {
    /// Creates a controller with no session running.
    #[instrument(skip(catalog, ledger, rng))]
    pub fn new(catalog: LevelCatalog, ledger: L, rng: R, timing: TimingConfig) -> Self {
        info!(levels = catalog.len(), "Creating session controller");
        Self {
            catalog,
            ledger,
            rng,
            timing,
            session: None,
            generation: 0,
            fallback_lives: None,
            last_lives: None,
            events: Vec::new(),
        }
    }

    /// Returns the level catalog.
    pub fn catalog(&self) -> &LevelCatalog {
        &self.catalog
    }

    /// Returns the timing configuration.
    pub fn timing(&self) -> &TimingConfig {
        &self.timing
    }

    /// Returns the ledger.
    pub fn ledger(&self) -> &L {
        &self.ledger
    }

    /// Returns the ledger mutably, e.g. for an external reset.
    ///
    /// Call [`Self::on_lives_changed`] afterwards so the session sees the change.
    pub fn ledger_mut(&mut self) -> &mut L {
        &mut self.ledger
    }

    /// Returns the running session, if any.
    pub fn session(&self) -> Option<&SessionState> {
        self.session.as_ref()
    }

    /// Returns the current session generation.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Returns the status of the running session.
    pub fn status(&self) -> Option<Status> {
        self.session.as_ref().map(SessionState::status)
    }

    /// Returns true while the lives ledger is unreachable and an in-memory
    /// count stands in for it.
    pub fn is_degraded(&self) -> bool {
        self.fallback_lives.is_some()
    }

    /// Reads the current lives count.
    #[instrument(skip(self))]
    pub fn lives(&mut self) -> u32 {
        self.read_lives()
    }

    /// Builds a presentation snapshot of the running session.
    #[instrument(skip(self))]
    pub fn view(&mut self) -> Option<SessionView> {
        let lives = self.read_lives();
        self.session
            .as_ref()
            .map(|state| SessionView::new(state, lives))
    }

    /// Takes every event emitted since the last call.
    pub fn drain_events(&mut self) -> Vec<SessionEvent> {
        std::mem::take(&mut self.events)
    }

    // ─────────────────────────────────────────────────────────────
    //  Session lifecycle
    // ─────────────────────────────────────────────────────────────

    /// Starts a session on the catalog level at `index`.
    ///
    /// Returns the memorization timer.
    #[instrument(skip(self))]
    pub fn select_level(&mut self, index: usize) -> Result<Timer, ConfigError> {
        let level = self.catalog.get(index)?.clone();
        self.begin(index, level)
    }

    /// Starts a session on an arbitrary level configuration.
    ///
    /// The configuration takes the place of the current catalog position, so
    /// advancing afterwards moves to the following catalog level.
    #[instrument(skip(self, config), fields(num_pairs = config.num_pairs()))]
    pub fn start_session(&mut self, config: LevelConfig) -> Result<Timer, ConfigError> {
        let index = self.session.as_ref().map_or(0, SessionState::level_index);
        self.begin(index, config)
    }

    /// Restarts the running session with a fresh shuffle of the same level.
    ///
    /// Returns `Ok(None)` when no session is running.
    #[instrument(skip(self))]
    pub fn restart_session(&mut self) -> Result<Option<Timer>, ConfigError> {
        let Some(state) = self.session.as_ref() else {
            debug!("Restart requested with no session");
            return Ok(None);
        };
        let (index, level) = (state.level_index(), state.level().clone());
        self.begin(index, level).map(Some)
    }

    /// Moves from a won session to the next catalog level, wrapping around.
    ///
    /// Returns `Ok(None)` unless the running session is Won.
    #[instrument(skip(self))]
    pub fn advance_to_next_config(&mut self) -> Result<Option<Timer>, ConfigError> {
        let Some(state) = self.session.as_ref() else {
            debug!("Advance requested with no session");
            return Ok(None);
        };
        if state.status() != Status::Won {
            debug!(status = %state.status(), "Advance requested before winning");
            return Ok(None);
        }
        let next = self.catalog.next_index(state.level_index());
        self.select_level(next).map(Some)
    }

    /// Abandons the running session and invalidates its pending timers.
    #[instrument(skip(self))]
    pub fn abandon(&mut self) {
        if self.session.take().is_some() {
            self.generation += 1;
            info!(generation = self.generation, "Session abandoned");
            self.events.push(SessionEvent::Abandoned);
        }
    }

    fn begin(&mut self, level_index: usize, level: LevelConfig) -> Result<Timer, ConfigError> {
        let cards = board::generate(&level, &mut self.rng)?;
        self.generation += 1;
        self.fallback_lives = None;

        let state = SessionState::new(self.generation, level_index, level, cards);
        info!(
            generation = self.generation,
            level = state.level_number(),
            cards = state.cards().len(),
            "Session started"
        );
        self.session = Some(state);
        self.events.push(SessionEvent::Started {
            level_index,
            generation: self.generation,
        });
        self.events.push(SessionEvent::StatusChanged(Status::Memorizing));
        self.read_lives();
        self.check_invariants();

        Ok(self.schedule(TimerKind::RevealEnd, level_index))
    }

    // ─────────────────────────────────────────────────────────────
    //  Player input
    // ─────────────────────────────────────────────────────────────

    /// Flips the card at `index`.
    ///
    /// Guards run in order and each one drops the tap without touching state:
    /// no session, input locked, no lives left, index off the board, card
    /// already face-up, two cards already selected.
    #[instrument(skip(self))]
    pub fn select_card(&mut self, index: usize) -> SelectOutcome {
        let outcome = self.try_select(index);
        match outcome {
            SelectOutcome::Ignored(reason) => debug!(%reason, "Selection ignored"),
            _ => {
                debug!(%outcome, "Card selected");
                self.check_invariants();
            }
        }
        outcome
    }

    fn try_select(&mut self, index: usize) -> SelectOutcome {
        match self.session.as_ref() {
            None => return SelectOutcome::Ignored(IgnoreReason::NoSession),
            Some(state) if state.input_locked() => {
                return SelectOutcome::Ignored(IgnoreReason::InputLocked);
            }
            Some(_) => {}
        }
        if self.read_lives() == 0 {
            return SelectOutcome::Ignored(IgnoreReason::NoLivesLeft);
        }
        let Some(state) = self.session.as_mut() else {
            return SelectOutcome::Ignored(IgnoreReason::NoSession);
        };
        let Some(card) = state.cards().get(index) else {
            return SelectOutcome::Ignored(IgnoreReason::OutOfRange);
        };
        if card.is_face_up() {
            return SelectOutcome::Ignored(IgnoreReason::AlreadyFaceUp);
        }
        if state.selection().len() >= 2 {
            return SelectOutcome::Ignored(IgnoreReason::SelectionFull);
        }

        state.reveal(index);
        state.push_selection(index);
        if state.selection().len() < 2 {
            return SelectOutcome::Flipped;
        }

        state.set_locked(true);
        let level_index = state.level_index();
        if state.set_status(Status::Resolving) {
            self.events.push(SessionEvent::StatusChanged(Status::Resolving));
        }
        SelectOutcome::PairSelected(self.schedule(TimerKind::PairPerceived, level_index))
    }

    // ─────────────────────────────────────────────────────────────
    //  Timers
    // ─────────────────────────────────────────────────────────────

    /// Runs the transition for an expired timer.
    ///
    /// Returns the follow-up timer, if the transition schedules one. Timers
    /// from an earlier generation do nothing.
    #[instrument(skip(self), fields(current = self.generation))]
    pub fn on_timer(&mut self, timer: Timer) -> Option<Timer> {
        if timer.generation != self.generation || self.session.is_none() {
            debug!(kind = %timer.kind, "Dropping stale timer");
            return None;
        }
        let next = match timer.kind {
            TimerKind::RevealEnd => self.end_reveal(),
            TimerKind::PairPerceived => self.resolve_pair(),
            TimerKind::MatchSettled => self.settle_match(),
            TimerKind::MismatchSettled => self.settle_mismatch(),
        };
        self.check_invariants();
        next
    }

    fn end_reveal(&mut self) -> Option<Timer> {
        let state = self.session.as_mut()?;
        if state.status() != Status::Memorizing {
            return None;
        }
        state.hide_all();
        state.set_locked(false);
        state.set_message(CHOOSE_MESSAGE);
        state.set_status(Status::AwaitingInput);
        info!("Memorization over");
        self.events.push(SessionEvent::StatusChanged(Status::AwaitingInput));
        if self.read_lives() < 1 {
            self.lose();
        }
        None
    }

    fn resolve_pair(&mut self) -> Option<Timer> {
        let state = self.session.as_mut()?;
        if state.status().is_terminal() {
            return None;
        }
        let &[first, second] = state.selection() else {
            warn!(selected = state.selection().len(), "Resolution without a pair");
            return None;
        };
        let level_index = state.level_index();
        let cards = state.cards();
        let is_match = cards[first].value() == cards[second].value();

        if is_match {
            state.mark_matched(&[first, second]);
            state.set_message(MATCH_MESSAGE);
            info!(first, second, "Pair matched");
            self.check_win();
            Some(self.schedule(TimerKind::MatchSettled, level_index))
        } else {
            state.set_message(MISMATCH_MESSAGE);
            let lives = self.consume_life();
            info!(first, second, lives, "Pair mismatched");
            Some(self.schedule(TimerKind::MismatchSettled, level_index))
        }
    }

    fn settle_match(&mut self) -> Option<Timer> {
        let state = self.session.as_mut()?;
        state.clear_selection();
        if !state.status().is_terminal() {
            state.set_locked(false);
            state.set_message(CHOOSE_MESSAGE);
            if state.set_status(Status::AwaitingInput) {
                self.events.push(SessionEvent::StatusChanged(Status::AwaitingInput));
            }
        }
        None
    }

    fn settle_mismatch(&mut self) -> Option<Timer> {
        if self.status().is_some_and(Status::is_terminal) {
            if let Some(state) = self.session.as_mut() {
                state.clear_selection();
            }
            return None;
        }
        if self.read_lives() < 1 {
            if let Some(state) = self.session.as_mut() {
                state.clear_selection();
            }
            self.lose();
            return None;
        }
        let state = self.session.as_mut()?;
        let selected = state.selection().to_vec();
        state.unflip(&selected);
        state.clear_selection();
        state.set_locked(false);
        state.set_message(CHOOSE_MESSAGE);
        if state.set_status(Status::AwaitingInput) {
            self.events.push(SessionEvent::StatusChanged(Status::AwaitingInput));
        }
        None
    }

    fn schedule(&self, kind: TimerKind, level_index: usize) -> Timer {
        Timer::new(self.generation, kind, self.timing.delay(kind, level_index))
    }

    // ─────────────────────────────────────────────────────────────
    //  Terminal states
    // ─────────────────────────────────────────────────────────────

    /// Re-reads the ledger after an outside change and forces a loss if the
    /// budget is exhausted.
    #[instrument(skip(self))]
    pub fn on_lives_changed(&mut self) {
        let lives = self.read_lives();
        let running = self.status().is_some_and(|s| !s.is_terminal());
        if running && lives < 1 {
            info!("Lives exhausted outside the session");
            self.lose();
            self.check_invariants();
        }
    }

    fn check_win(&mut self) {
        let Some(state) = self.session.as_mut() else {
            return;
        };
        if state.status() == Status::Won || !state.all_matched() {
            return;
        }
        let level_index = state.level_index();
        state.set_status(Status::Won);
        state.set_locked(true);
        state.set_message(completed_message(level_index + 1));
        info!(level = level_index + 1, "Level completed");
        self.events.push(SessionEvent::StatusChanged(Status::Won));
        self.events.push(SessionEvent::Won { level_index });
    }

    fn lose(&mut self) {
        let Some(state) = self.session.as_mut() else {
            return;
        };
        if state.status().is_terminal() {
            return;
        }
        state.set_status(Status::Lost);
        state.set_locked(true);
        state.set_message(LOST_MESSAGE);
        let level_index = state.level_index();
        info!(level = level_index + 1, "Session lost");
        self.events.push(SessionEvent::StatusChanged(Status::Lost));
        self.events.push(SessionEvent::Lost { level_index });
    }

    // ─────────────────────────────────────────────────────────────
    //  Ledger access
    // ─────────────────────────────────────────────────────────────

    fn read_lives(&mut self) -> u32 {
        let lives = match self.fallback_lives {
            Some(lives) => lives,
            None => match self.ledger.current_lives() {
                Ok(lives) => lives,
                Err(e) => self.degrade(e),
            },
        };
        self.observe_lives(lives);
        lives
    }

    fn consume_life(&mut self) -> u32 {
        let lives = match self.fallback_lives {
            Some(lives) => {
                let lives = lives.saturating_sub(1);
                self.fallback_lives = Some(lives);
                lives
            }
            None => match self.ledger.decrement() {
                Ok(lives) => lives,
                Err(e) => {
                    let lives = self.degrade(e).saturating_sub(1);
                    self.fallback_lives = Some(lives);
                    lives
                }
            },
        };
        self.observe_lives(lives);
        lives
    }

    /// Switches to the in-memory count, starting from the last value the
    /// ledger reported so a failure never hands out lives. With nothing seen
    /// yet, the ledger's full budget is assumed.
    fn degrade(&mut self, err: impl std::fmt::Display) -> u32 {
        let lives = self.last_lives.unwrap_or_else(|| self.ledger.max_lives());
        warn!(error = %err, fallback = lives, "Lives ledger unavailable, using in-memory count");
        self.fallback_lives = Some(lives);
        lives
    }

    fn observe_lives(&mut self, lives: u32) {
        if self.last_lives != Some(lives) {
            self.last_lives = Some(lives);
            self.events.push(SessionEvent::LivesChanged(lives));
        }
    }

    fn check_invariants(&self) {
        if !cfg!(debug_assertions) {
            return;
        }
        if let Some(state) = self.session.as_ref()
            && let Err(violations) = SessionInvariants::check_all(state)
        {
            error!(?violations, "Session invariants violated");
            debug_assert!(false, "Session invariants violated: {:?}", violations);
        }
    }
}
