//! Tests for the async session runner, on tokio's paused clock.

use rand::SeedableRng;
use rand::rngs::StdRng;
use std::time::Duration;
use strictly_memory::{
    InMemoryLedger, LevelCatalog, LevelConfig, SessionController, SessionEvent, SessionView,
    Status, TimingConfig,
};
use strictly_recall::{Command, RunnerHandle, SessionRunner, Update};
use tokio::time::Instant;

const SEED: u64 = 7;

fn level(pairs: usize) -> LevelConfig {
    LevelConfig::new(
        "bg.png",
        (0..pairs).map(|i| format!("card{}.png", i + 1)).collect(),
    )
}

fn spawn(levels: Vec<LevelConfig>, lives: u32) -> RunnerHandle {
    let controller = SessionController::new(
        LevelCatalog::new(levels).expect("valid catalog"),
        InMemoryLedger::with_lives(lives),
        StdRng::seed_from_u64(SEED),
        TimingConfig::default(),
    );
    SessionRunner::spawn(controller)
}

/// Receives updates until a view with `status` arrives, collecting events.
async fn wait_for(
    handle: &mut RunnerHandle,
    status: Status,
    events: &mut Vec<SessionEvent>,
) -> SessionView {
    loop {
        match handle.updates.recv().await.expect("runner alive") {
            Update::View(view) if view.status == status => return view,
            Update::View(_) => {}
            Update::Event(event) => events.push(event),
            Update::Rejected(error) => panic!("command rejected: {}", error),
        }
    }
}

#[tokio::test(start_paused = true)]
async fn test_memorization_ends_after_reveal_delay() {
    let mut handle = spawn(vec![level(2)], 8);
    let mut events = Vec::new();
    let start = Instant::now();

    handle.commands.send(Command::SelectLevel(0)).await.expect("send");
    let view = wait_for(&mut handle, Status::Memorizing, &mut events).await;
    assert!(view.cards.iter().all(|card| card.face_up));
    assert!(view.input_locked);

    let view = wait_for(&mut handle, Status::AwaitingInput, &mut events).await;
    assert!(start.elapsed() >= Duration::from_millis(2000));
    assert!(view.cards.iter().all(|card| !card.face_up));
    assert!(!view.input_locked);
    assert!(events.contains(&SessionEvent::StatusChanged(Status::AwaitingInput)));
}

#[tokio::test(start_paused = true)]
async fn test_restart_replaces_pending_reveal() {
    let mut handle = spawn(vec![level(2)], 8);
    let mut events = Vec::new();
    let start = Instant::now();

    handle.commands.send(Command::SelectLevel(0)).await.expect("send");
    wait_for(&mut handle, Status::Memorizing, &mut events).await;

    tokio::time::sleep(Duration::from_millis(1500)).await;
    handle.commands.send(Command::Restart).await.expect("send");

    wait_for(&mut handle, Status::AwaitingInput, &mut events).await;
    assert!(start.elapsed() >= Duration::from_millis(3500));
    let starts = events
        .iter()
        .filter(|event| matches!(event, SessionEvent::Started { .. }))
        .count();
    assert_eq!(starts, 2);
}

#[tokio::test(start_paused = true)]
async fn test_single_pair_is_won() {
    let mut handle = spawn(vec![level(1)], 8);
    let mut events = Vec::new();

    handle.commands.send(Command::SelectLevel(0)).await.expect("send");
    wait_for(&mut handle, Status::AwaitingInput, &mut events).await;

    handle.commands.send(Command::SelectCard(0)).await.expect("send");
    handle.commands.send(Command::SelectCard(1)).await.expect("send");
    let view = wait_for(&mut handle, Status::Won, &mut events).await;

    assert!(view.cards.iter().all(|card| card.matched));
    assert_eq!(view.lives, 8);
    assert!(events.contains(&SessionEvent::Won { level_index: 0 }));
}

#[tokio::test(start_paused = true)]
async fn test_mismatch_costs_a_life_and_flips_back() {
    let pairs = 3;
    let board = strictly_memory::generate(&level(pairs), &mut StdRng::seed_from_u64(SEED))
        .expect("valid level");
    let other = (1..board.len())
        .find(|&i| board[i].value() != board[0].value())
        .expect("a non-matching card");

    let mut handle = spawn(vec![level(pairs)], 8);
    let mut events = Vec::new();
    handle.commands.send(Command::SelectLevel(0)).await.expect("send");
    wait_for(&mut handle, Status::AwaitingInput, &mut events).await;

    handle.commands.send(Command::SelectCard(0)).await.expect("send");
    handle.commands.send(Command::SelectCard(other)).await.expect("send");
    let resolving = wait_for(&mut handle, Status::Resolving, &mut events).await;
    assert!(resolving.cards[0].face_up && resolving.cards[other].face_up);

    let view = wait_for(&mut handle, Status::AwaitingInput, &mut events).await;
    assert_eq!(view.lives, 7);
    assert!(!view.cards[0].face_up);
    assert!(!view.cards[other].face_up);
    assert!(events.contains(&SessionEvent::LivesChanged(7)));
}

#[tokio::test(start_paused = true)]
async fn test_unknown_level_is_rejected_and_runner_survives() {
    let mut handle = spawn(vec![level(2)], 8);

    handle.commands.send(Command::SelectLevel(5)).await.expect("send");
    match handle.updates.recv().await.expect("runner alive") {
        Update::Rejected(error) => assert!(error.to_string().contains("out of range")),
        other => panic!("unexpected update {:?}", other),
    }

    let mut events = Vec::new();
    handle.commands.send(Command::SelectLevel(0)).await.expect("send");
    wait_for(&mut handle, Status::Memorizing, &mut events).await;
}

#[tokio::test(start_paused = true)]
async fn test_quit_stops_the_task() {
    let handle = spawn(vec![level(2)], 8);
    handle.commands.send(Command::Quit).await.expect("send");
    handle.task.await.expect("runner finished cleanly");
}
