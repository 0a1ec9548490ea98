//! Strictly Chess - Unified CLI

#![warn(missing_docs)]

mod cli;
mod console;

use anyhow::{Context, Result};
use clap::Parser;
use cli::{Cli, Command};
use console::Console;
use std::path::PathBuf;
use strictly_chess::{ArbiterConfig, Position, Side, TurnCoordinator, rules};
use tracing::{info, instrument};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file
    dotenvy::dotenv().ok();

    // Logs go to stderr so they stay out of the board display.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Play { config, side, fen } => run_play(config, side, fen).await,
        Command::Moves { fen } => run_moves(fen),
    }
}

fn parse_start(fen: Option<String>) -> Result<Position> {
    match fen {
        Some(fen) => Position::from_fen(&fen).with_context(|| format!("Invalid FEN '{}'", fen)),
        None => Ok(Position::new()),
    }
}

/// Run an interactive game
#[instrument]
async fn run_play(config: Option<PathBuf>, side: Option<Side>, fen: Option<String>) -> Result<()> {
    let mut config = match config {
        Some(path) => ArbiterConfig::from_file(&path)?,
        None => ArbiterConfig::default(),
    };
    if let Some(side) = side {
        config = config.with_human_side(side);
    }
    let start = parse_start(fen)?;

    let client = config.build_client()?;
    info!(oracle = %client.name(), timeout = ?client.timeout(), "Oracle ready");

    let (events_tx, events_rx) = tokio::sync::mpsc::unbounded_channel();
    let coordinator = TurnCoordinator::builder(client)
        .fallback(config.fallback().build(*config.fallback_seed()))
        .sink(config.build_sink())
        .events(events_tx)
        .human_side(*config.human_side())
        .start(start.clone())
        .build()?;

    Console::new(coordinator, events_rx, *config.human_side(), start)
        .run()
        .await
}

/// Print the legal moves of a position
fn run_moves(fen: Option<String>) -> Result<()> {
    let position = parse_start(fen)?;
    for mv in rules::legal_moves(&position) {
        println!("{}", mv);
    }
    Ok(())
}
