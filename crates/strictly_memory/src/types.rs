//! Core domain types for the memory game.

use serde::{Deserialize, Serialize};

/// Stable card identity within a session.
///
/// Ids are assigned from the canonical (unshuffled) position: the two cards of
/// pair `i` get ids `2i` and `2i + 1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CardId(pub usize);

impl std::fmt::Display for CardId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A single card on the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Card {
    id: CardId,
    value: usize,
    revealed: bool,
    matched: bool,
}

impl Card {
    /// Creates a face-up, unmatched card for the given pair index.
    pub fn new(id: CardId, value: usize) -> Self {
        Self {
            id,
            value,
            revealed: true,
            matched: false,
        }
    }

    /// Returns the card id.
    pub fn id(&self) -> CardId {
        self.id
    }

    /// Returns the pairing key (index into the level's card faces).
    pub fn value(&self) -> usize {
        self.value
    }

    /// Returns true if the card is currently face-up.
    pub fn revealed(&self) -> bool {
        self.revealed
    }

    /// Returns true if the card has been permanently matched.
    pub fn matched(&self) -> bool {
        self.matched
    }

    /// Returns true if the card is shown face-up for any reason.
    pub fn is_face_up(&self) -> bool {
        self.revealed || self.matched
    }

    /// Returns a copy with the face-up flag replaced.
    pub(crate) fn with_revealed(self, revealed: bool) -> Self {
        Self { revealed, ..self }
    }

    /// Returns a copy marked as matched (and therefore face-up).
    pub(crate) fn into_matched(self) -> Self {
        Self {
            revealed: true,
            matched: true,
            ..self
        }
    }

    /// Projects the card into what the presentation shell should draw.
    pub fn view(&self) -> CardView {
        CardView {
            face_up: self.is_face_up(),
            matched: self.matched,
            face: self.is_face_up().then_some(self.value),
        }
    }
}

/// Presentation view of a card.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardView {
    /// Whether the face is showing.
    pub face_up: bool,
    /// Whether the card is permanently resolved.
    pub matched: bool,
    /// Index into the level's card faces, present only while face-up.
    pub face: Option<usize>,
}

/// Immutable descriptor of one themed level.
///
/// The core only looks at the pair count and indexes `card_faces` by card value;
/// asset references are opaque strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelConfig {
    /// Background asset reference.
    background: String,
    /// Face assets, indexed by pair value.
    card_faces: Vec<String>,
    /// Declared pair count. Defaults to the number of faces when omitted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    num_pairs: Option<usize>,
}

impl LevelConfig {
    /// Creates a level whose pair count is the number of faces.
    pub fn new(background: impl Into<String>, card_faces: Vec<String>) -> Self {
        Self {
            background: background.into(),
            card_faces,
            num_pairs: None,
        }
    }

    /// Creates a level with an explicit pair count.
    ///
    /// The count is validated against the faces when a board is generated.
    pub fn with_pairs(
        background: impl Into<String>,
        card_faces: Vec<String>,
        num_pairs: usize,
    ) -> Self {
        Self {
            background: background.into(),
            card_faces,
            num_pairs: Some(num_pairs),
        }
    }

    /// Returns the background asset reference.
    pub fn background(&self) -> &str {
        &self.background
    }

    /// Returns the card faces.
    pub fn card_faces(&self) -> &[String] {
        &self.card_faces
    }

    /// Returns the face asset for a pair value, if any.
    pub fn face(&self, value: usize) -> Option<&str> {
        self.card_faces.get(value).map(String::as_str)
    }

    /// Returns the number of distinct pairs.
    pub fn num_pairs(&self) -> usize {
        self.num_pairs.unwrap_or(self.card_faces.len())
    }
}

/// Session status.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, strum::Display, strum::EnumIter,
)]
pub enum Status {
    /// All cards face-up for the memorization period.
    Memorizing,
    /// Waiting for the player to flip a card.
    AwaitingInput,
    /// A pair is face-up and being resolved.
    Resolving,
    /// Every pair has been matched.
    Won,
    /// The lives budget ran out.
    Lost,
}

impl Status {
    /// Returns true for `Won` and `Lost`.
    pub fn is_terminal(self) -> bool {
        matches!(self, Status::Won | Status::Lost)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    #[test]
    fn test_matched_card_is_face_up() {
        let card = Card::new(CardId(0), 1).with_revealed(false).into_matched();
        assert!(card.matched());
        assert!(card.revealed());
        assert_eq!(card.view().face, Some(1));
    }

    #[test]
    fn test_hidden_card_hides_face() {
        let card = Card::new(CardId(3), 2).with_revealed(false);
        let view = card.view();
        assert!(!view.face_up);
        assert_eq!(view.face, None);
    }

    #[test]
    fn test_pair_count_defaults_to_faces() {
        let level = LevelConfig::new("bg.png", vec!["a".into(), "b".into()]);
        assert_eq!(level.num_pairs(), 2);
        assert_eq!(level.face(1), Some("b"));
        assert_eq!(level.face(2), None);
    }

    #[test]
    fn test_level_deserializes_without_pair_count() {
        let level: LevelConfig =
            serde_json::from_str(r#"{"background":"bg.png","card_faces":["x","y","z"]}"#)
                .expect("valid level");
        assert_eq!(level.num_pairs(), 3);
    }

    #[test]
    fn test_only_won_and_lost_are_terminal() {
        let terminal: Vec<_> = Status::iter().filter(|s| s.is_terminal()).collect();
        assert_eq!(terminal, vec![Status::Won, Status::Lost]);
    }
}
