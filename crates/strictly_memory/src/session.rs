//! Live session state.
//!
//! Card updates replace the whole card vector with a mapped copy, so a
//! snapshot taken between operations is always consistent.

use super::types::{Card, CardView, LevelConfig, Status};
use serde::Serialize;

/// Player-facing message during memorization.
pub fn memorize_message(level_number: usize) -> String {
    format!("Level {}: Memorize the cards", level_number)
}

/// Player-facing message while waiting for a flip.
pub const CHOOSE_MESSAGE: &str = "Choose a card";

/// Player-facing message after a match.
pub const MATCH_MESSAGE: &str = "Match found!";

/// Player-facing message after a mismatch.
pub const MISMATCH_MESSAGE: &str = "No match, try again";

/// Player-facing message on loss.
pub const LOST_MESSAGE: &str = "You lost!";

/// Player-facing message on win.
pub fn completed_message(level_number: usize) -> String {
    format!("Level {} completed!", level_number)
}

/// Mutable state of one playthrough of one level.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionState {
    generation: u64,
    level_index: usize,
    level: LevelConfig,
    cards: Vec<Card>,
    selection: Vec<usize>,
    input_locked: bool,
    status: Status,
    message: String,
}

impl SessionState {
    /// Creates a session in the memorization phase.
    pub(crate) fn new(
        generation: u64,
        level_index: usize,
        level: LevelConfig,
        cards: Vec<Card>,
    ) -> Self {
        Self {
            generation,
            level_index,
            level,
            cards,
            selection: Vec::with_capacity(2),
            input_locked: true,
            status: Status::Memorizing,
            message: memorize_message(level_index + 1),
        }
    }

    /// Returns the generation this session was started under.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Returns the catalog position of the level.
    pub fn level_index(&self) -> usize {
        self.level_index
    }

    /// Returns the one-based level number shown to the player.
    pub fn level_number(&self) -> usize {
        self.level_index + 1
    }

    /// Returns the level configuration.
    pub fn level(&self) -> &LevelConfig {
        &self.level
    }

    /// Returns the cards in board order.
    pub fn cards(&self) -> &[Card] {
        &self.cards
    }

    /// Returns the indices of face-up, unresolved cards (at most two).
    pub fn selection(&self) -> &[usize] {
        &self.selection
    }

    /// Returns true while taps are being ignored.
    pub fn input_locked(&self) -> bool {
        self.input_locked
    }

    /// Returns the status.
    pub fn status(&self) -> Status {
        self.status
    }

    /// Returns the player-facing message.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Returns true if every card is matched.
    pub fn all_matched(&self) -> bool {
        !self.cards.is_empty() && self.cards.iter().all(Card::matched)
    }

    /// Returns the number of matched pairs.
    pub fn matched_pairs(&self) -> usize {
        self.cards.iter().filter(|c| c.matched()).count() / 2
    }

    /// Projects every card for the presentation shell.
    pub fn card_views(&self) -> Vec<CardView> {
        self.cards.iter().map(Card::view).collect()
    }

    pub(crate) fn hide_all(&mut self) {
        self.cards = self
            .cards
            .iter()
            .map(|card| card.with_revealed(card.matched()))
            .collect();
    }

    pub(crate) fn reveal(&mut self, index: usize) {
        self.cards = self
            .cards
            .iter()
            .enumerate()
            .map(|(i, card)| if i == index { card.with_revealed(true) } else { *card })
            .collect();
    }

    pub(crate) fn unflip(&mut self, indices: &[usize]) {
        self.cards = self
            .cards
            .iter()
            .enumerate()
            .map(|(i, card)| {
                if indices.contains(&i) && !card.matched() {
                    card.with_revealed(false)
                } else {
                    *card
                }
            })
            .collect();
    }

    pub(crate) fn mark_matched(&mut self, indices: &[usize]) {
        self.cards = self
            .cards
            .iter()
            .enumerate()
            .map(|(i, card)| if indices.contains(&i) { card.into_matched() } else { *card })
            .collect();
    }

    pub(crate) fn push_selection(&mut self, index: usize) {
        self.selection.push(index);
    }

    pub(crate) fn clear_selection(&mut self) {
        self.selection.clear();
    }

    pub(crate) fn set_locked(&mut self, locked: bool) {
        self.input_locked = locked;
    }

    /// Sets the status. Returns true if it changed.
    pub(crate) fn set_status(&mut self, status: Status) -> bool {
        let changed = self.status != status;
        self.status = status;
        changed
    }

    pub(crate) fn set_message(&mut self, message: impl Into<String>) {
        self.message = message.into();
    }
}

/// Snapshot handed to the presentation shell.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionView {
    /// Catalog position of the level.
    pub level_index: usize,
    /// Background asset reference.
    pub background: String,
    /// Card faces of the level, indexed by [`CardView::face`].
    pub card_faces: Vec<String>,
    /// Cards in board order.
    pub cards: Vec<CardView>,
    /// Session status.
    pub status: Status,
    /// Player-facing message.
    pub message: String,
    /// Last observed lives count.
    pub lives: u32,
    /// Whether taps are currently ignored.
    pub input_locked: bool,
}

impl SessionView {
    /// Builds a view of `state` with the given lives count.
    pub fn new(state: &SessionState, lives: u32) -> Self {
        Self {
            level_index: state.level_index(),
            background: state.level().background().to_string(),
            card_faces: state.level().card_faces().to_vec(),
            cards: state.card_views(),
            status: state.status(),
            message: state.message().to_string(),
            lives,
            input_locked: state.input_locked(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::CardId;

    fn state() -> SessionState {
        let level = LevelConfig::new("bg.png", vec!["a".into(), "b".into()]);
        let cards = vec![
            Card::new(CardId(0), 0),
            Card::new(CardId(2), 1),
            Card::new(CardId(1), 0),
            Card::new(CardId(3), 1),
        ];
        SessionState::new(1, 0, level, cards)
    }

    #[test]
    fn test_new_session_memorizes_locked() {
        let s = state();
        assert_eq!(s.status(), Status::Memorizing);
        assert!(s.input_locked());
        assert_eq!(s.message(), "Level 1: Memorize the cards");
        assert!(s.cards().iter().all(Card::revealed));
    }

    #[test]
    fn test_hide_all_keeps_matched_face_up() {
        let mut s = state();
        s.mark_matched(&[0, 2]);
        s.hide_all();
        assert!(s.cards()[0].revealed());
        assert!(s.cards()[2].revealed());
        assert!(!s.cards()[1].revealed());
        assert!(!s.cards()[3].revealed());
    }

    #[test]
    fn test_unflip_never_hides_matched() {
        let mut s = state();
        s.mark_matched(&[0, 2]);
        s.unflip(&[0, 1]);
        assert!(s.cards()[0].revealed());
        assert!(!s.cards()[1].revealed());
    }

    #[test]
    fn test_all_matched_and_pair_count() {
        let mut s = state();
        assert!(!s.all_matched());
        s.mark_matched(&[0, 2]);
        assert_eq!(s.matched_pairs(), 1);
        s.mark_matched(&[1, 3]);
        assert!(s.all_matched());
        assert_eq!(s.matched_pairs(), 2);
    }
}
