//! Lives ledger persisted as JSON on disk.

use std::path::{Path, PathBuf};
use strictly_memory::{InMemoryLedger, LedgerError, LedgerSnapshot, LivesLedger, ResetPolicy};
use tracing::{debug, info, instrument};

/// A [`LivesLedger`] that survives process restarts.
///
/// The file is read once on open; every change is written back immediately.
/// A missing file is a full budget that has never been refilled.
#[derive(Debug)]
pub struct FileLedger {
    path: PathBuf,
    inner: InMemoryLedger,
}

impl FileLedger {
    /// Opens the ledger stored at `path`.
    #[instrument(skip(path), fields(path = %path.as_ref().display()))]
    pub fn open(path: impl AsRef<Path>, policy: ResetPolicy) -> Result<Self, LedgerError> {
        let path = path.as_ref().to_path_buf();
        let snapshot = if path.exists() {
            let content = std::fs::read_to_string(&path)?;
            serde_json::from_str(&content)
                .map_err(|e| LedgerError::new(format!("Corrupt ledger file: {}", e)))?
        } else {
            debug!("No ledger file yet");
            LedgerSnapshot::fresh(policy.max_lives())
        };
        info!(lives = snapshot.lives, "Ledger opened");
        Ok(Self {
            path,
            inner: InMemoryLedger::from_snapshot(snapshot, policy),
        })
    }

    /// Returns the file location.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns the current contents without applying the reset policy.
    pub fn snapshot(&self) -> LedgerSnapshot {
        self.inner.snapshot()
    }

    /// Applies `change` to a copy, writes the copy out, and keeps it only
    /// once the write succeeded. A failed write leaves memory and file agreeing.
    fn commit<T>(
        &mut self,
        change: impl FnOnce(&mut InMemoryLedger) -> Result<T, LedgerError>,
    ) -> Result<T, LedgerError> {
        let mut staged = self.inner.clone();
        let out = change(&mut staged)?;
        if staged.snapshot() != self.inner.snapshot() {
            self.write(&staged.snapshot())?;
        }
        self.inner = staged;
        Ok(out)
    }

    #[instrument(skip(self, snapshot))]
    fn write(&self, snapshot: &LedgerSnapshot) -> Result<(), LedgerError> {
        let json = serde_json::to_string_pretty(snapshot)
            .map_err(|e| LedgerError::new(format!("Failed to encode ledger: {}", e)))?;
        std::fs::write(&self.path, json)?;
        debug!(lives = snapshot.lives, "Ledger saved");
        Ok(())
    }
}

impl LivesLedger for FileLedger {
    fn current_lives(&mut self) -> Result<u32, LedgerError> {
        self.commit(|ledger| ledger.current_lives())
    }

    fn decrement(&mut self) -> Result<u32, LedgerError> {
        self.commit(|ledger| ledger.decrement())
    }

    fn set_lives(&mut self, lives: u32) -> Result<u32, LedgerError> {
        self.commit(|ledger| ledger.set_lives(lives))
    }

    fn max_lives(&self) -> u32 {
        self.inner.policy().max_lives()
    }
}
