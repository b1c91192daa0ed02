//! Async driver for the session controller.
//!
//! A single tokio task owns the controller. Player commands arrive on a
//! channel; timers the controller asks for are slept on inside the same
//! `select!` loop, so commands and timer expiries never interleave mid-step.

use rand::Rng;
use strictly_memory::{
    ConfigError, LevelConfig, LivesLedger, SessionController, SessionEvent, SessionView, Timer,
};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{Instant, sleep_until};
use tracing::{debug, info, instrument, warn};

/// Inbound command from the shell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Start the catalog level at this position.
    SelectLevel(usize),
    /// Start an ad-hoc level.
    Start(LevelConfig),
    /// Flip the card at this board position.
    SelectCard(usize),
    /// Reshuffle and replay the current level.
    Restart,
    /// Move on from a won level.
    Next,
    /// The ledger was changed by someone else.
    LivesChanged,
    /// Leave the session.
    Abandon,
    /// Show the command summary. Handled by the shell, ignored here.
    Help,
    /// Stop the runner.
    Quit,
}

/// Outbound update for the shell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Update {
    /// A controller signal.
    Event(SessionEvent),
    /// Fresh snapshot after a step.
    View(SessionView),
    /// A command was refused because its level is unplayable.
    Rejected(ConfigError),
}

/// Handle to a spawned runner.
#[derive(Debug)]
pub struct RunnerHandle {
    /// Command sender.
    pub commands: mpsc::Sender<Command>,
    /// Update receiver.
    pub updates: mpsc::UnboundedReceiver<Update>,
    /// The runner task.
    pub task: JoinHandle<()>,
}

/// Owns a controller and drives it from commands and timers.
#[derive(Debug)]
pub struct SessionRunner<L, R> {
    controller: SessionController<L, R>,
    commands: mpsc::Receiver<Command>,
    updates: mpsc::UnboundedSender<Update>,
    pending: Option<(Instant, Timer)>,
}

impl<L, R> SessionRunner<L, R>
where
    L: LivesLedger + Send + 'static,
    R: Rng + Send + 'static,
{
    /// Creates a runner around `controller`.
    #[instrument(skip_all)]
    pub fn new(
        controller: SessionController<L, R>,
        commands: mpsc::Receiver<Command>,
        updates: mpsc::UnboundedSender<Update>,
    ) -> Self {
        Self {
            controller,
            commands,
            updates,
            pending: None,
        }
    }

    /// Spawns a runner on the current tokio runtime.
    #[instrument(skip_all)]
    pub fn spawn(controller: SessionController<L, R>) -> RunnerHandle {
        let (command_tx, command_rx) = mpsc::channel(32);
        let (update_tx, update_rx) = mpsc::unbounded_channel();
        let runner = Self::new(controller, command_rx, update_tx);
        RunnerHandle {
            commands: command_tx,
            updates: update_rx,
            task: tokio::spawn(runner.run()),
        }
    }

    /// Runs until `Quit`, until the command channel closes, or until nobody
    /// listens for updates.
    #[instrument(skip(self))]
    pub async fn run(mut self) {
        info!("Session runner started");
        loop {
            let deadline = self.pending.map(|(at, _)| at);
            tokio::select! {
                command = self.commands.recv() => {
                    match command {
                        None | Some(Command::Quit) => break,
                        Some(command) => {
                            if let Err(error) = self.handle(command) {
                                warn!(%error, "Command rejected");
                                if self.updates.send(Update::Rejected(error)).is_err() {
                                    break;
                                }
                            }
                        }
                    }
                }
                _ = sleep_until(deadline.unwrap_or_else(Instant::now)), if deadline.is_some() => {
                    if let Some((_, timer)) = self.pending.take() {
                        debug!(kind = %timer.kind, "Timer expired");
                        let next = self.controller.on_timer(timer);
                        self.schedule(next);
                    }
                }
            }
            if !self.publish() {
                warn!("Update receiver dropped, stopping");
                break;
            }
        }
        info!("Session runner stopped");
    }

    fn handle(&mut self, command: Command) -> Result<(), ConfigError> {
        debug!(?command, "Handling command");
        match command {
            Command::SelectLevel(index) => {
                let timer = self.controller.select_level(index)?;
                self.schedule(Some(timer));
            }
            Command::Start(level) => {
                let timer = self.controller.start_session(level)?;
                self.schedule(Some(timer));
            }
            Command::SelectCard(index) => {
                let outcome = self.controller.select_card(index);
                if let Some(timer) = outcome.timer() {
                    self.schedule(Some(timer));
                }
            }
            Command::Restart => {
                let timer = self.controller.restart_session()?;
                if timer.is_some() {
                    self.schedule(timer);
                }
            }
            Command::Next => {
                let timer = self.controller.advance_to_next_config()?;
                if timer.is_some() {
                    self.schedule(timer);
                }
            }
            Command::LivesChanged => self.controller.on_lives_changed(),
            Command::Abandon => {
                self.controller.abandon();
                self.pending = None;
            }
            Command::Help | Command::Quit => {}
        }
        Ok(())
    }

    /// Replaces the pending timer. A replaced timer belongs to an older
    /// generation, so dropping it loses nothing.
    fn schedule(&mut self, timer: Option<Timer>) {
        self.pending = timer.map(|timer| (Instant::now() + timer.delay, timer));
    }

    fn publish(&mut self) -> bool {
        for event in self.controller.drain_events() {
            if self.updates.send(Update::Event(event)).is_err() {
                return false;
            }
        }
        match self.controller.view() {
            Some(view) => self.updates.send(Update::View(view)).is_ok(),
            None => !self.updates.is_closed(),
        }
    }
}
