//! Application settings loaded from TOML.

use chrono::TimeDelta;
use derive_getters::Getters;
use derive_more::{Display, Error};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use strictly_memory::{
    ConfigError, DEFAULT_COOLDOWN_SECS, DEFAULT_LIVES, LevelCatalog, LevelConfig, ResetPolicy,
    TimingConfig,
};
use tracing::{debug, info, instrument};

/// Pair counts of the built-in themed levels, in play order.
const BUILTIN_PAIRS: [usize; 8] = [2, 4, 4, 6, 3, 3, 3, 6];

/// Settings for the game shell.
#[derive(Debug, Clone, Getters, Serialize, Deserialize)]
pub struct Settings {
    /// Size of the lives budget.
    #[serde(default = "default_max_lives")]
    max_lives: u32,

    /// Seconds after the last refill before lives refill again.
    #[serde(default = "default_cooldown_secs")]
    cooldown_secs: i64,

    /// Where the lives ledger is persisted.
    #[serde(default = "default_ledger_path")]
    ledger_path: PathBuf,

    /// Session delays.
    #[serde(default)]
    timing: TimingConfig,

    /// Fixed shuffle seed, for reproducible boards.
    #[serde(default)]
    seed: Option<u64>,

    /// Level catalog, in play order.
    #[serde(default = "default_levels")]
    levels: Vec<LevelConfig>,
}

#[instrument]
fn default_max_lives() -> u32 {
    DEFAULT_LIVES
}

#[instrument]
fn default_cooldown_secs() -> i64 {
    DEFAULT_COOLDOWN_SECS
}

#[instrument]
fn default_ledger_path() -> PathBuf {
    PathBuf::from("strictly_recall_lives.json")
}

/// The eight built-in themed levels.
#[instrument]
pub fn default_levels() -> Vec<LevelConfig> {
    BUILTIN_PAIRS
        .iter()
        .enumerate()
        .map(|(i, &pairs)| {
            let game = i + 1;
            LevelConfig::new(
                format!("game{}/bg.png", game),
                (1..=pairs)
                    .map(|card| format!("game{}/card{}.png", game, card))
                    .collect(),
            )
        })
        .collect()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            max_lives: default_max_lives(),
            cooldown_secs: default_cooldown_secs(),
            ledger_path: default_ledger_path(),
            timing: TimingConfig::default(),
            seed: None,
            levels: default_levels(),
        }
    }
}

impl Settings {
    /// Loads settings from a TOML file.
    #[instrument(skip(path), fields(path = %path.as_ref().display()))]
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, SettingsError> {
        debug!("Loading settings from file");
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| SettingsError::new(format!("Failed to read settings file: {}", e)))?;
        let settings = Self::from_toml(&content)?;
        info!(levels = settings.levels.len(), "Settings loaded");
        Ok(settings)
    }

    /// Parses settings from TOML text.
    #[instrument(skip(content))]
    pub fn from_toml(content: &str) -> Result<Self, SettingsError> {
        let settings: Self = toml::from_str(content)
            .map_err(|e| SettingsError::new(format!("Failed to parse settings: {}", e)))?;
        if settings.cooldown_secs < 0 {
            return Err(SettingsError::new("cooldown_secs must not be negative"));
        }
        Ok(settings)
    }

    /// Loads settings from `path` when given, defaults otherwise.
    #[instrument]
    pub fn load(path: Option<&Path>) -> Result<Self, SettingsError> {
        match path {
            Some(path) => Self::from_file(path),
            None => {
                debug!("No settings file, using defaults");
                Ok(Self::default())
            }
        }
    }

    /// Overrides the ledger location.
    pub fn with_ledger_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.ledger_path = path.into();
        self
    }

    /// Overrides the shuffle seed.
    pub fn with_seed(mut self, seed: Option<u64>) -> Self {
        if seed.is_some() {
            self.seed = seed;
        }
        self
    }

    /// Returns the ledger reset policy.
    #[instrument(skip(self))]
    pub fn reset_policy(&self) -> ResetPolicy {
        ResetPolicy::new(self.max_lives, TimeDelta::seconds(self.cooldown_secs))
    }

    /// Builds the validated level catalog.
    #[instrument(skip(self))]
    pub fn catalog(&self) -> Result<LevelCatalog, ConfigError> {
        LevelCatalog::new(self.levels.clone())
    }
}

/// Settings error.
#[derive(Debug, Clone, Display, Error)]
#[display("Settings error: {} at {}:{}", message, file, line)]
pub struct SettingsError {
    /// Error message.
    pub message: String,
    /// Line number where error occurred.
    pub line: u32,
    /// Source file where error occurred.
    pub file: &'static str,
}

impl SettingsError {
    /// Creates a new settings error.
    #[track_caller]
    #[instrument(skip(message))]
    pub fn new(message: impl Into<String>) -> Self {
        let loc = std::panic::Location::caller();
        Self {
            message: message.into(),
            line: loc.line(),
            file: loc.file(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strictly_memory::RevealSchedule;

    #[test]
    fn test_builtin_levels_match_pair_counts() {
        let levels = default_levels();
        assert_eq!(levels.len(), 8);
        let pairs: Vec<_> = levels.iter().map(LevelConfig::num_pairs).collect();
        assert_eq!(pairs, BUILTIN_PAIRS);
        assert_eq!(levels[3].face(5), Some("game4/card6.png"));
        assert_eq!(levels[7].background(), "game8/bg.png");
    }

    #[test]
    fn test_empty_toml_gives_defaults() {
        let settings = Settings::from_toml("").expect("valid settings");
        assert_eq!(*settings.max_lives(), 8);
        assert_eq!(*settings.cooldown_secs(), 3600);
        assert_eq!(settings.timing(), &TimingConfig::default());
        assert!(settings.catalog().is_ok());
    }

    #[test]
    fn test_toml_overrides() {
        let settings = Settings::from_toml(
            r#"
            max_lives = 3
            cooldown_secs = 30
            seed = 11

            [timing]
            mismatch_ms = 900
            reveal = { kind = "graduated" }

            [[levels]]
            background = "space/bg.png"
            card_faces = ["space/a.png", "space/b.png"]
            "#,
        )
        .expect("valid settings");
        assert_eq!(settings.reset_policy().max_lives(), 3);
        assert_eq!(settings.reset_policy().cooldown(), TimeDelta::seconds(30));
        assert_eq!(*settings.seed(), Some(11));
        assert_eq!(settings.timing().mismatch_ms, 900);
        assert_eq!(settings.timing().perceive_ms, 300);
        assert_eq!(settings.timing().reveal, RevealSchedule::Graduated);
        assert_eq!(settings.catalog().expect("valid catalog").len(), 1);
    }

    #[test]
    fn test_negative_cooldown_rejected() {
        assert!(Settings::from_toml("cooldown_secs = -5").is_err());
    }

    #[test]
    fn test_bad_level_reported_by_catalog() {
        let settings = Settings::from_toml(
            r#"
            [[levels]]
            background = "bg.png"
            card_faces = []
            "#,
        )
        .expect("valid toml");
        assert_eq!(settings.catalog(), Err(ConfigError::NoPairs));
    }
}
