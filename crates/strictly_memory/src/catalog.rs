//! Ordered level catalog.

use super::board;
use super::error::ConfigError;
use super::types::LevelConfig;
use tracing::{debug, instrument};

/// The ordered list of levels a player advances through.
///
/// Advancing past the last level wraps to the first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LevelCatalog {
    levels: Vec<LevelConfig>,
}

impl LevelCatalog {
    /// Creates a catalog, validating every level up front.
    #[instrument(skip(levels), fields(count = levels.len()))]
    pub fn new(levels: Vec<LevelConfig>) -> Result<Self, ConfigError> {
        if levels.is_empty() {
            return Err(ConfigError::EmptyCatalog);
        }
        for level in &levels {
            board::validate(level)?;
        }
        debug!("Level catalog ready");
        Ok(Self { levels })
    }

    /// Returns the number of levels.
    pub fn len(&self) -> usize {
        self.levels.len()
    }

    /// Always false: a catalog holds at least one level.
    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }

    /// Returns the level at `index`.
    pub fn get(&self, index: usize) -> Result<&LevelConfig, ConfigError> {
        self.levels.get(index).ok_or(ConfigError::LevelOutOfRange {
            index,
            len: self.levels.len(),
        })
    }

    /// Returns the position after `index`, wrapping to the first level.
    pub fn next_index(&self, index: usize) -> usize {
        (index + 1) % self.levels.len()
    }

    /// Iterates over the levels in order.
    pub fn iter(&self) -> impl Iterator<Item = &LevelConfig> {
        self.levels.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn level(pairs: usize) -> LevelConfig {
        LevelConfig::new("bg.png", (0..pairs).map(|i| i.to_string()).collect())
    }

    #[test]
    fn test_next_index_wraps() {
        let catalog = LevelCatalog::new(vec![level(2), level(3), level(4)]).expect("valid");
        assert_eq!(catalog.next_index(0), 1);
        assert_eq!(catalog.next_index(2), 0);
    }

    #[test]
    fn test_rejects_empty_and_invalid() {
        assert_eq!(LevelCatalog::new(Vec::new()), Err(ConfigError::EmptyCatalog));
        assert_eq!(
            LevelCatalog::new(vec![level(2), level(0)]),
            Err(ConfigError::NoPairs)
        );
    }

    #[test]
    fn test_get_out_of_range() {
        let catalog = LevelCatalog::new(vec![level(2)]).expect("valid");
        assert_eq!(
            catalog.get(4),
            Err(ConfigError::LevelOutOfRange { index: 4, len: 1 })
        );
    }
}
