//! First-class invariants over session state.
//!
//! Invariants are logical properties that must hold after every transition.
//! They are testable independently and checked by the controller in debug
//! builds.

use super::session::SessionState;
use super::types::Status;

/// A logical property that must hold for a given state.
pub trait Invariant<S> {
    /// Checks if the invariant holds for the given state.
    fn holds(state: &S) -> bool;

    /// Human-readable description of the invariant.
    fn description() -> &'static str;
}

/// Violation of an invariant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvariantViolation {
    /// Description of the violated invariant.
    pub description: String,
}

impl InvariantViolation {
    /// Creates a new invariant violation.
    pub fn new(description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
        }
    }
}

/// A set of invariants that can be checked together.
///
/// Implemented for tuples of invariants.
pub trait InvariantSet<S> {
    /// Checks all invariants in the set, collecting every violation.
    fn check_all(state: &S) -> Result<(), Vec<InvariantViolation>>;
}

macro_rules! impl_invariant_set {
    ($($inv:ident),+) => {
        impl<S, $($inv),+> InvariantSet<S> for ($($inv,)+)
        where
            $($inv: Invariant<S>,)+
        {
            fn check_all(state: &S) -> Result<(), Vec<InvariantViolation>> {
                let mut violations = Vec::new();
                $(
                    if !$inv::holds(state) {
                        violations.push(InvariantViolation::new($inv::description()));
                    }
                )+
                if violations.is_empty() {
                    Ok(())
                } else {
                    Err(violations)
                }
            }
        }
    };
}

impl_invariant_set!(I1, I2);
impl_invariant_set!(I1, I2, I3);
impl_invariant_set!(I1, I2, I3, I4);
impl_invariant_set!(I1, I2, I3, I4, I5);

/// Invariant: every pair value appears on exactly two cards, and ids are unique.
pub struct PairingInvariant;

impl Invariant<SessionState> for PairingInvariant {
    fn holds(state: &SessionState) -> bool {
        let pairs = state.level().num_pairs();
        let cards = state.cards();
        if cards.len() != pairs * 2 {
            return false;
        }
        let mut per_value = vec![0usize; pairs];
        let mut seen_ids = vec![false; cards.len()];
        for card in cards {
            let Some(count) = per_value.get_mut(card.value()) else {
                return false;
            };
            *count += 1;
            match seen_ids.get_mut(card.id().0) {
                Some(seen) if !*seen => *seen = true,
                _ => return false,
            }
        }
        per_value.iter().all(|&count| count == 2)
    }

    fn description() -> &'static str {
        "Every value appears on exactly two cards with unique ids"
    }
}

/// Invariant: matched cards are always face-up, and matches come in pairs.
pub struct MatchedRevealedInvariant;

impl Invariant<SessionState> for MatchedRevealedInvariant {
    fn holds(state: &SessionState) -> bool {
        let cards = state.cards();
        cards.iter().filter(|c| c.matched()).all(|c| {
            c.revealed()
                && cards
                    .iter()
                    .filter(|other| other.value() == c.value())
                    .all(|other| other.matched())
        })
    }

    fn description() -> &'static str {
        "Matched cards are face-up and matched in pairs"
    }
}

/// Invariant: the selection holds at most two distinct face-up cards.
pub struct SelectionInvariant;

impl Invariant<SessionState> for SelectionInvariant {
    fn holds(state: &SessionState) -> bool {
        let selection = state.selection();
        if selection.len() > 2 {
            return false;
        }
        if let [a, b] = selection
            && a == b
        {
            return false;
        }
        selection
            .iter()
            .all(|&i| state.cards().get(i).is_some_and(|c| c.revealed()))
    }

    fn description() -> &'static str {
        "Selection holds at most two distinct face-up cards"
    }
}

/// Invariant: terminal sessions ignore input.
pub struct TerminalLockInvariant;

impl Invariant<SessionState> for TerminalLockInvariant {
    fn holds(state: &SessionState) -> bool {
        !state.status().is_terminal() || state.input_locked()
    }

    fn description() -> &'static str {
        "Won and Lost sessions keep input locked"
    }
}

/// Invariant: the session is Won exactly when every card is matched.
pub struct WinCompletenessInvariant;

impl Invariant<SessionState> for WinCompletenessInvariant {
    fn holds(state: &SessionState) -> bool {
        (state.status() == Status::Won) == state.all_matched()
    }

    fn description() -> &'static str {
        "Status is Won if and only if all cards are matched"
    }
}

/// All session invariants as a composable set.
pub type SessionInvariants = (
    PairingInvariant,
    MatchedRevealedInvariant,
    SelectionInvariant,
    TerminalLockInvariant,
    WinCompletenessInvariant,
);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Card, CardId, LevelConfig};

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
    fn test_fresh_session_satisfies_all() {
        assert!(SessionInvariants::check_all(&state()).is_ok());
    }

    #[test]
    fn test_half_matched_pair_violates() {
        let mut s = state();
        s.mark_matched(&[0]);
        assert!(!MatchedRevealedInvariant::holds(&s));
    }

    #[test]
    fn test_won_without_matches_violates() {
        let mut s = state();
        s.set_status(Status::Won);
        let violations = SessionInvariants::check_all(&s).unwrap_err();
        let descriptions: Vec<_> = violations.iter().map(|v| v.description.as_str()).collect();
        assert!(descriptions.contains(&WinCompletenessInvariant::description()));
        assert!(!descriptions.contains(&TerminalLockInvariant::description()));
    }

    #[test]
    fn test_duplicate_selection_violates() {
        let mut s = state();
        s.push_selection(1);
        s.push_selection(1);
        assert!(!SelectionInvariant::holds(&s));
    }

    #[test]
    fn test_two_invariants_as_set() {
        type TwoInvariants = (PairingInvariant, TerminalLockInvariant);
        assert!(TwoInvariants::check_all(&state()).is_ok());
    }
}
