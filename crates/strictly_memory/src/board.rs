//! Board generation.
//!
//! A board is `2 × num_pairs` cards: pair `i` contributes ids `2i` and `2i + 1`,
//! both carrying value `i`, both face-up for the memorization period. The
//! canonical sequence is then permuted with a uniform Fisher–Yates shuffle.

use super::error::ConfigError;
use super::types::{Card, CardId, LevelConfig};
use rand::Rng;
use rand::seq::SliceRandom;
use tracing::{debug, instrument, warn};

/// Checks that a level can produce a well-formed board.
#[instrument(skip(config), fields(num_pairs = config.num_pairs()))]
pub fn validate(config: &LevelConfig) -> Result<(), ConfigError> {
    let num_pairs = config.num_pairs();
    if num_pairs < 1 {
        warn!("Rejecting level with no pairs");
        return Err(ConfigError::NoPairs);
    }
    let faces = config.card_faces().len();
    if faces != num_pairs {
        warn!(faces, "Rejecting level with mismatched face count");
        return Err(ConfigError::FaceCountMismatch {
            expected: num_pairs,
            actual: faces,
        });
    }
    Ok(())
}

/// Builds the unshuffled card sequence for a level.
#[instrument(skip(config))]
pub fn canonical(config: &LevelConfig) -> Result<Vec<Card>, ConfigError> {
    validate(config)?;
    let cards = (0..config.num_pairs())
        .flat_map(|value| {
            [
                Card::new(CardId(value * 2), value),
                Card::new(CardId(value * 2 + 1), value),
            ]
        })
        .collect();
    Ok(cards)
}

/// Generates a shuffled board for a level.
#[instrument(skip(config, rng), fields(num_pairs = config.num_pairs()))]
pub fn generate<R: Rng + ?Sized>(
    config: &LevelConfig,
    rng: &mut R,
) -> Result<Vec<Card>, ConfigError> {
    let mut cards = canonical(config)?;
    cards.shuffle(rng);
    debug!(cards = cards.len(), "Generated board");
    Ok(cards)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn level(pairs: usize) -> LevelConfig {
        LevelConfig::new(
            "bg.png",
            (0..pairs).map(|i| format!("card{}.png", i + 1)).collect(),
        )
    }

    #[test]
    fn test_every_value_appears_twice() {
        let mut rng = StdRng::seed_from_u64(7);
        for pairs in [2, 3, 4, 6] {
            let cards = generate(&level(pairs), &mut rng).expect("valid level");
            assert_eq!(cards.len(), pairs * 2);
            for value in 0..pairs {
                let count = cards.iter().filter(|c| c.value() == value).count();
                assert_eq!(count, 2, "value {} should appear twice", value);
            }
        }
    }

    #[test]
    fn test_cards_start_face_up_and_unmatched() {
        let mut rng = StdRng::seed_from_u64(1);
        let cards = generate(&level(4), &mut rng).expect("valid level");
        assert!(cards.iter().all(|c| c.revealed() && !c.matched()));
    }

    #[test]
    fn test_shuffle_is_a_permutation_of_canonical() {
        let mut rng = StdRng::seed_from_u64(42);
        let config = level(6);
        let mut shuffled = generate(&config, &mut rng).expect("valid level");
        shuffled.sort_by_key(|c| c.id());
        assert_eq!(shuffled, canonical(&config).expect("valid level"));
    }

    #[test]
    fn test_same_seed_same_board() {
        let config = level(4);
        let a = generate(&config, &mut StdRng::seed_from_u64(9)).expect("valid level");
        let b = generate(&config, &mut StdRng::seed_from_u64(9)).expect("valid level");
        assert_eq!(a, b);
    }

    #[test]
    fn test_zero_pairs_rejected() {
        let config = LevelConfig::new("bg.png", Vec::new());
        let mut rng = StdRng::seed_from_u64(0);
        assert_eq!(generate(&config, &mut rng), Err(ConfigError::NoPairs));
    }

    #[test]
    fn test_face_mismatch_rejected() {
        let config = LevelConfig::with_pairs("bg.png", vec!["a".into(), "b".into()], 3);
        let mut rng = StdRng::seed_from_u64(0);
        assert_eq!(
            generate(&config, &mut rng),
            Err(ConfigError::FaceCountMismatch {
                expected: 3,
                actual: 2
            })
        );
    }
}
