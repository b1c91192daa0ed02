//! Strictly Recall - CLI entry point.

#![warn(missing_docs)]

mod cli;

use anyhow::{Result, bail};
use clap::Parser;
use cli::{Cli, Command};
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::path::PathBuf;
use strictly_memory::{InMemoryLedger, LivesLedger, RULES, SessionController};
use strictly_recall::{FileLedger, Settings};
use tracing::{info, instrument, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    // Logs go to stderr so they never mix with the board on stdout.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let settings = Settings::load(cli.config.as_deref())?;

    match cli.command {
        Command::Play {
            level,
            seed,
            ledger,
        } => run_play(settings, level, seed, ledger).await,
        Command::Levels => list_levels(&settings),
        Command::Rules => {
            println!("{}", RULES);
            Ok(())
        }
        Command::Lives { reset, ledger } => run_lives(settings, reset, ledger),
    }
}

/// Applies a `--ledger` override.
fn with_ledger(settings: Settings, ledger: Option<PathBuf>) -> Settings {
    match ledger {
        Some(path) => settings.with_ledger_path(path),
        None => settings,
    }
}

/// Opens the file ledger, falling back to a volatile one if the file is unusable.
#[instrument(skip(settings))]
fn open_ledger(settings: &Settings) -> Box<dyn LivesLedger + Send> {
    match FileLedger::open(settings.ledger_path(), settings.reset_policy()) {
        Ok(ledger) => Box::new(ledger),
        Err(error) => {
            warn!(%error, "Ledger file unusable, lives will not persist");
            Box::new(InMemoryLedger::new(settings.reset_policy()))
        }
    }
}

/// Play in the terminal.
#[instrument(skip(settings, ledger))]
async fn run_play(
    settings: Settings,
    level: usize,
    seed: Option<u64>,
    ledger: Option<PathBuf>,
) -> Result<()> {
    let settings = with_ledger(settings, ledger).with_seed(seed);
    let catalog = settings.catalog()?;
    if level == 0 || level > catalog.len() {
        bail!("Level must be between 1 and {}", catalog.len());
    }

    let ledger = open_ledger(&settings);
    let controller = match settings.seed() {
        Some(seed) => SessionController::new(
            catalog,
            ledger,
            StdRng::seed_from_u64(*seed),
            *settings.timing(),
        ),
        None => SessionController::with_entropy(catalog, ledger, *settings.timing()),
    };

    info!(level, "Starting game");
    strictly_recall::play(controller, level - 1).await
}

/// Print the level catalog.
#[instrument(skip(settings))]
fn list_levels(settings: &Settings) -> Result<()> {
    let catalog = settings.catalog()?;
    for (i, level) in catalog.iter().enumerate() {
        println!(
            "{:>2}. {} pairs, background {}",
            i + 1,
            level.num_pairs(),
            level.background()
        );
    }
    Ok(())
}

/// Show or refill the lives budget.
#[instrument(skip(settings, ledger))]
fn run_lives(settings: Settings, reset: bool, ledger: Option<PathBuf>) -> Result<()> {
    let settings = with_ledger(settings, ledger);
    let mut ledger = FileLedger::open(settings.ledger_path(), settings.reset_policy())?;
    let lives = if reset {
        ledger.set_lives(*settings.max_lives())?
    } else {
        ledger.current_lives()?
    };
    println!("Lives: {}/{}", lives, ledger.max_lives());
    println!("Ledger: {}", ledger.path().display());
    if let Some(last_reset) = ledger.snapshot().last_reset {
        println!("Last refill: {}", last_reset.to_rfc3339());
    }
    Ok(())
}
