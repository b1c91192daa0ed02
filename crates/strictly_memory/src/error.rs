//! Error types for the memory game core.

use derive_more::{Display, Error};
use tracing::instrument;

/// A level configuration (or catalog) that cannot produce a playable board.
///
/// Reported once, at session start. No partial session is created.
#[derive(Debug, Clone, PartialEq, Eq, Display)]
pub enum ConfigError {
    /// The configuration declares no pairs.
    #[display("Level has no pairs")]
    NoPairs,

    /// The number of card faces does not match the number of pairs.
    #[display("Level declares {} pairs but supplies {} card faces", expected, actual)]
    FaceCountMismatch {
        /// Pairs declared by the level.
        expected: usize,
        /// Faces actually supplied.
        actual: usize,
    },

    /// A catalog must hold at least one level.
    #[display("Level catalog is empty")]
    EmptyCatalog,

    /// A level index outside the catalog.
    #[display("Level {} is out of range (catalog has {} levels)", index, len)]
    LevelOutOfRange {
        /// Requested index.
        index: usize,
        /// Catalog length.
        len: usize,
    },
}

impl std::error::Error for ConfigError {}

/// The lives ledger could not be read or written.
#[derive(Debug, Clone, Display, Error)]
#[display("Ledger unavailable: {} at {}:{}", message, file, line)]
pub struct LedgerError {
    /// Error message.
    pub message: String,
    /// Line number where error occurred.
    pub line: u32,
    /// Source file where error occurred.
    pub file: &'static str,
}

impl LedgerError {
    /// Creates a new ledger error with caller location tracking.
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

impl From<std::io::Error> for LedgerError {
    #[track_caller]
    fn from(err: std::io::Error) -> Self {
        Self::new(format!("I/O error: {}", err))
    }
}
