//! Strictly Recall - terminal shell for the Strictly Memory game.
//!
//! The game rules live in [`strictly_memory`]. This crate adds what a real
//! program needs around them:
//!
//! - **Settings**: TOML configuration for lives, delays and the level catalog
//! - **Ledger**: a lives budget persisted to a JSON file
//! - **Runner**: a tokio task that owns the controller and sleeps on its timers
//! - **Terminal**: a line-oriented text interface
//!
//! # Example
//!
//! ```no_run
//! use strictly_recall::{FileLedger, Settings};
//!
//! # fn example() -> anyhow::Result<()> {
//! let settings = Settings::load(None)?;
//! let ledger = FileLedger::open(settings.ledger_path(), settings.reset_policy())?;
//! println!("{} levels, {} lives", settings.levels().len(), ledger.snapshot().lives);
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod file_ledger;
mod runner;
mod settings;
mod terminal;

pub use file_ledger::FileLedger;
pub use runner::{Command, RunnerHandle, SessionRunner, Update};
pub use settings::{Settings, SettingsError, default_levels};
pub use terminal::{HELP, parse_command, play, render};

pub use strictly_memory;
