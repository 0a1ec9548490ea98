//! Line-oriented terminal front end.
//!
//! Reads moves from stdin, forwards them to the coordinator and prints the
//! events it emits. Holds no game state of its own.

use anyhow::Result;
use strictly_chess::{FallbackReason, GameEvent, Position, Side, TurnCoordinator, TurnState, rules};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc::UnboundedReceiver;
use tracing::{debug, instrument};

/// Interactive game loop.
pub struct Console {
    coordinator: TurnCoordinator,
    events: UnboundedReceiver<GameEvent>,
    human_side: Side,
    start: Position,
}

impl Console {
    /// Wraps a coordinator and the receiving end of its event channel.
    pub fn new(
        coordinator: TurnCoordinator,
        events: UnboundedReceiver<GameEvent>,
        human_side: Side,
        start: Position,
    ) -> Self {
        Self {
            coordinator,
            events,
            human_side,
            start,
        }
    }

    /// Runs until `quit` or end of input.
    #[instrument(skip(self))]
    pub async fn run(mut self) -> Result<()> {
        println!("Commands: <move> (e.g. e2e4), moves, reset, quit");
        let mut lines = BufReader::new(tokio::io::stdin()).lines();

        loop {
            self.coordinator.settle().await;
            self.drain_events();
            self.print_board();
            self.print_prompt();

            let Some(line) = lines.next_line().await? else {
                debug!("End of input");
                break;
            };

            match line.trim() {
                "" => continue,
                "quit" | "exit" => break,
                "reset" => {
                    self.coordinator.reset(self.human_side, self.start.clone());
                }
                "moves" => {
                    let moves = rules::legal_moves(self.coordinator.session().position());
                    println!("{}", join_moves(&moves));
                }
                notation => {
                    if let Err(e) = self.coordinator.submit_human_notation(notation) {
                        println!("{}", e);
                    }
                }
            }
        }

        Ok(())
    }

    fn drain_events(&mut self) {
        while let Ok(event) = self.events.try_recv() {
            match event {
                GameEvent::SessionStarted { human_side, .. } => {
                    println!("New game. You play {}.", human_side);
                }
                GameEvent::OracleThinking { .. } => println!("Opponent is thinking..."),
                GameEvent::AlternativeMove { reason, .. } => match reason {
                    FallbackReason::OracleFailed(why) => {
                        println!("Opponent unavailable ({}), playing an alternative move.", why)
                    }
                    FallbackReason::InvalidSuggestion(Some(s)) => {
                        println!("Opponent suggested '{}', which is not legal here.", s)
                    }
                    FallbackReason::InvalidSuggestion(None) => {
                        println!("Opponent gave no move, playing an alternative.")
                    }
                },
                GameEvent::MovePlayed { played, .. } => {
                    println!("{} plays {} ({})", played.side(), played.mv(), played.provenance());
                }
                GameEvent::GameOver { verdict, .. } => println!("Game over: {}", verdict),
            }
        }
    }

    fn print_board(&self) {
        let position = self.coordinator.session().position();
        print!("{}", render_board(position));
        println!("{}", position);
    }

    fn print_prompt(&self) {
        match self.coordinator.state() {
            TurnState::GameOver(_) => println!("Type 'reset' for a new game or 'quit'."),
            _ => println!("Your move:"),
        }
    }
}

fn join_moves(moves: &[strictly_chess::Move]) -> String {
    moves
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Renders the placement field of a position as an 8x8 grid, rank 8 first.
fn render_board(position: &Position) -> String {
    let fen = position.to_fen();
    let placement = fen.split(' ').next().unwrap_or_default();
    let mut out = String::new();
    for (i, rank) in placement.split('/').enumerate() {
        out.push_str(&format!("{} ", 8 - i));
        for c in rank.chars() {
            match c.to_digit(10) {
                Some(empty) => (0..empty).for_each(|_| out.push_str(". ")),
                None => {
                    out.push(c);
                    out.push(' ');
                }
            }
        }
        out.push('\n');
    }
    out.push_str("  a b c d e f g h\n");
    out
}
