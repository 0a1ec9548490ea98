//! Immutable chess positions with FEN serialization.

use super::types::Side;
use serde::{Deserialize, Serialize};
use shakmaty::fen::Fen;
use shakmaty::{CastlingMode, Chess, EnPassantMode, Position as _};
use std::str::FromStr;
use tracing::instrument;

/// A complete snapshot of the board and game metadata.
///
/// Positions are never mutated: every accepted move yields a new one.
/// Two positions are equal when their canonical FEN strings are equal.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Position {
    chess: Chess,
}

impl Position {
    /// Creates the standard starting position.
    pub fn new() -> Self {
        Self {
            chess: Chess::default(),
        }
    }

    /// Parses a position from FEN.
    #[instrument]
    pub fn from_fen(fen: &str) -> Result<Self, PositionError> {
        let setup: Fen = fen
            .trim()
            .parse()
            .map_err(|e| PositionError::Notation(format!("{e}")))?;
        let chess: Chess = setup
            .into_position(CastlingMode::Standard)
            .map_err(|e| PositionError::Setup(format!("{e}")))?;
        Ok(Self { chess })
    }

    /// Serializes the position to FEN.
    pub fn to_fen(&self) -> String {
        Fen::from_position(self.chess.clone(), EnPassantMode::Legal).to_string()
    }

    /// Returns the side to move.
    pub fn side_to_move(&self) -> Side {
        self.chess.turn().into()
    }

    /// Returns the half-move clock used by the fifty-move rule.
    pub fn halfmove_clock(&self) -> u32 {
        self.chess.halfmoves()
    }

    /// Returns the full-move number.
    pub fn fullmove_number(&self) -> u32 {
        self.chess.fullmoves().get()
    }

    /// Key identifying the position for repetition purposes.
    ///
    /// Board, side to move, castling rights and en passant square; the move
    /// counters are excluded.
    pub fn repetition_key(&self) -> String {
        self.to_fen()
            .split_whitespace()
            .take(4)
            .collect::<Vec<_>>()
            .join(" ")
    }

    pub(crate) fn chess(&self) -> &Chess {
        &self.chess
    }

    pub(crate) fn from_chess(chess: Chess) -> Self {
        Self { chess }
    }
}

impl Default for Position {
    fn default() -> Self {
        Self::new()
    }
}

impl PartialEq for Position {
    fn eq(&self, other: &Self) -> bool {
        self.to_fen() == other.to_fen()
    }
}

impl Eq for Position {}

impl std::fmt::Display for Position {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_fen())
    }
}

impl FromStr for Position {
    type Err = PositionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_fen(s)
    }
}

impl TryFrom<String> for Position {
    type Error = PositionError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::from_fen(&value)
    }
}

impl From<Position> for String {
    fn from(position: Position) -> Self {
        position.to_fen()
    }
}

/// Error parsing a position.
#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display)]
pub enum PositionError {
    /// The text is not valid FEN.
    #[display("Invalid FEN: {}", _0)]
    Notation(String),

    /// The FEN is well formed but describes an impossible position.
    #[display("Invalid position: {}", _0)]
    Setup(String),
}

impl std::error::Error for PositionError {}
