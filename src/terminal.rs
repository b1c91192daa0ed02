//! Plain-text game shell.
//!
//! Prints the board after every update and reads one command per line from
//! stdin. Cards are numbered from 1 for the player.

use crate::runner::{Command, SessionRunner, Update};
use anyhow::Result;
use rand::Rng;
use std::path::Path;
use strictly_memory::{LivesLedger, SessionController, SessionEvent, SessionView};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{debug, info, instrument};

/// Cards per printed row.
const ROW_WIDTH: usize = 4;

/// Command summary shown on `help` and unknown input.
pub const HELP: &str = "Commands: <n> flip card n | r replay | n next level | l <n> play level n | lives | home leave level | h help | q quit";

/// Parses one line of player input.
#[instrument]
pub fn parse_command(line: &str) -> Option<Command> {
    let mut words = line.split_whitespace();
    let first = words.next()?;
    if let Ok(card) = first.parse::<usize>() {
        return card.checked_sub(1).map(Command::SelectCard);
    }
    match first.to_lowercase().as_str() {
        "r" | "replay" | "restart" => Some(Command::Restart),
        "n" | "next" => Some(Command::Next),
        "l" | "level" => {
            let level = words.next()?.parse::<usize>().ok()?;
            level.checked_sub(1).map(Command::SelectLevel)
        }
        "lives" => Some(Command::LivesChanged),
        "home" | "back" => Some(Command::Abandon),
        "h" | "help" | "?" => Some(Command::Help),
        "q" | "quit" | "exit" => Some(Command::Quit),
        _ => None,
    }
}

/// Short label for a face asset: its file stem.
fn face_label(asset: &str) -> &str {
    Path::new(asset)
        .file_stem()
        .and_then(|stem| stem.to_str())
        .unwrap_or(asset)
}

/// Renders a session snapshot as text.
#[instrument(skip(view))]
pub fn render(view: &SessionView) -> String {
    let mut out = format!(
        "Level {} | Lives {} | {}\n",
        view.level_index + 1,
        view.lives,
        view.message
    );
    for (row, cards) in view.cards.chunks(ROW_WIDTH).enumerate() {
        let line: Vec<String> = cards
            .iter()
            .enumerate()
            .map(|(col, card)| {
                let number = row * ROW_WIDTH + col + 1;
                let face = match card.face {
                    Some(face) => view
                        .card_faces
                        .get(face)
                        .map_or("?", |asset| face_label(asset)),
                    None => "?",
                };
                let mark = if card.matched { "*" } else { " " };
                format!("{:>2}:[{:^7}]{}", number, face, mark)
            })
            .collect();
        out.push_str(&line.join(" "));
        out.push('\n');
    }
    out
}

/// Text shown when a session ends.
fn terminal_hint(event: &SessionEvent) -> Option<&'static str> {
    match event {
        SessionEvent::Won { .. } => Some("All pairs found! n: next level, r: replay, q: quit"),
        SessionEvent::Lost { .. } => Some("Out of lives. r: replay, q: quit"),
        _ => None,
    }
}

/// Plays in the terminal, starting at catalog position `start_level`.
#[instrument(skip(controller))]
pub async fn play<L, R>(controller: SessionController<L, R>, start_level: usize) -> Result<()>
where
    L: LivesLedger + Send + 'static,
    R: Rng + Send + 'static,
{
    let mut handle = SessionRunner::spawn(controller);
    handle.commands.send(Command::SelectLevel(start_level)).await?;
    println!("{}", HELP);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut last_view: Option<SessionView> = None;
    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else {
                    debug!("stdin closed");
                    break;
                };
                match parse_command(&line) {
                    Some(Command::Quit) => break,
                    Some(Command::Help) | None => println!("{}", HELP),
                    Some(command) => handle.commands.send(command).await?,
                }
            }
            update = handle.updates.recv() => {
                match update {
                    Some(Update::View(view)) => {
                        if last_view.as_ref() != Some(&view) {
                            print!("{}", render(&view));
                            last_view = Some(view);
                        }
                    }
                    Some(Update::Event(event)) => {
                        if let Some(hint) = terminal_hint(&event) {
                            println!("{}", hint);
                        }
                        if event == SessionEvent::Abandoned {
                            println!("Left the level. l <n>: play level n, q: quit");
                        }
                    }
                    Some(Update::Rejected(error)) => println!("Cannot start: {}", error),
                    None => break,
                }
            }
        }
    }

    // The runner may already have stopped; a closed channel is fine here.
    let _ = handle.commands.send(Command::Quit).await;
    handle.task.await?;
    info!("Goodbye");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use strictly_memory::{CardView, Status};

    #[test]
    fn test_parse_card_numbers_are_one_based() {
        assert_eq!(parse_command("3"), Some(Command::SelectCard(2)));
        assert_eq!(parse_command(" 1 "), Some(Command::SelectCard(0)));
        assert_eq!(parse_command("0"), None);
    }

    #[test]
    fn test_parse_words() {
        assert_eq!(parse_command("r"), Some(Command::Restart));
        assert_eq!(parse_command("Next"), Some(Command::Next));
        assert_eq!(parse_command("l 4"), Some(Command::SelectLevel(3)));
        assert_eq!(parse_command("level"), None);
        assert_eq!(parse_command("q"), Some(Command::Quit));
        assert_eq!(parse_command("home"), Some(Command::Abandon));
        assert_eq!(parse_command("h"), Some(Command::Help));
        assert_eq!(parse_command("dance"), None);
        assert_eq!(parse_command(""), None);
    }

    #[test]
    fn test_help_lists_every_command_word() {
        for word in ["r", "n", "l 1", "lives", "home", "h", "q"] {
            let listed = HELP.contains(&format!("| {} ", word.split(' ').next().unwrap_or(word)));
            assert!(listed, "help text is missing {:?}", word);
            assert!(parse_command(word).is_some(), "{:?} does not parse", word);
        }
    }

    #[test]
    fn test_render_hides_face_down_cards() {
        let view = SessionView {
            level_index: 0,
            background: "game1/bg.png".into(),
            card_faces: vec!["game1/card1.png".into(), "game1/card2.png".into()],
            cards: vec![
                CardView {
                    face_up: true,
                    matched: true,
                    face: Some(1),
                },
                CardView {
                    face_up: false,
                    matched: false,
                    face: None,
                },
            ],
            status: Status::AwaitingInput,
            message: "Choose a card".into(),
            lives: 7,
            input_locked: false,
        };
        let text = render(&view);
        assert!(text.starts_with("Level 1 | Lives 7 | Choose a card\n"));
        assert!(text.contains(" 1:[ card2 ]*"));
        assert!(text.contains(" 2:[   ?   ]"));
    }
}
