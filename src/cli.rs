//! Command-line interface for strictly_recall.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Strictly Recall - matching-pairs memory game
#[derive(Parser, Debug)]
#[command(name = "strictly_recall")]
#[command(about = "Matching-pairs memory game with a persistent lives budget", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Path to a settings file (TOML). Built-in defaults when omitted.
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Subcommand to run
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Play in the terminal
    Play {
        /// Level to start at (1-based)
        #[arg(short, long, default_value = "1")]
        level: usize,

        /// Shuffle seed for a reproducible board
        #[arg(long)]
        seed: Option<u64>,

        /// Override the ledger file location
        #[arg(long)]
        ledger: Option<PathBuf>,
    },

    /// List the level catalog
    Levels,

    /// Print the rules
    Rules,

    /// Show the lives budget
    Lives {
        /// Refill the budget to the maximum
        #[arg(long)]
        reset: bool,

        /// Override the ledger file location
        #[arg(long)]
        ledger: Option<PathBuf>,
    },
}
