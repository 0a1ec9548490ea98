//! Command-line interface for strictly_chess.

use clap::{Parser, Subcommand};
use strictly_chess::Side;

/// Strictly Chess - race-free move arbitration against an automated opponent
#[derive(Parser, Debug)]
#[command(name = "strictly_chess")]
#[command(about = "Play chess against an oracle with a legal-move fallback", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Subcommand to run
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Play an interactive game in the terminal
    Play {
        /// Path to arbiter config (defaults apply when omitted)
        #[arg(short, long)]
        config: Option<std::path::PathBuf>,

        /// Side to play (first or second), overriding the config
        #[arg(short, long)]
        side: Option<Side>,

        /// Starting position in FEN
        #[arg(long)]
        fen: Option<String>,
    },

    /// List the legal moves in a position
    Moves {
        /// Position in FEN (standard start when omitted)
        fen: Option<String>,
    },
}
