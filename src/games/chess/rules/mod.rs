//! Rules engine adapter.
//!
//! Legality, move application and terminal predicates are delegated to
//! `shakmaty`. This module translates between its types and ours and is
//! the only place a move is checked against a position.

pub mod draw;
pub mod mate;

pub use draw::{is_fifty_move_draw, is_insufficient_material, is_threefold_repetition};
pub use mate::{is_checkmate, is_stalemate};

use super::action::{IllegalMoveError, Move};
use super::position::Position;
use shakmaty::uci::UciMove;
use shakmaty::{CastlingMode, Position as _};
use tracing::{debug, instrument};

/// Enumerates every legal move for the side to move.
#[instrument(skip(position), fields(fen = %position))]
pub fn legal_moves(position: &Position) -> Vec<Move> {
    let moves: Vec<Move> = position
        .chess()
        .legal_moves()
        .iter()
        .filter_map(|m| Move::from_uci(&UciMove::from_move(m, CastlingMode::Standard)))
        .collect();
    debug!(count = moves.len(), "Enumerated legal moves");
    moves
}

/// Applies a move, returning the successor position.
///
/// The input position is untouched whether or not the move is legal.
#[instrument(skip(position), fields(fen = %position, mv = %mv))]
pub fn apply(position: &Position, mv: Move) -> Result<Position, IllegalMoveError> {
    let not_legal = || IllegalMoveError::NotLegal {
        mv,
        fen: position.to_fen(),
    };

    let m = mv.to_uci().to_move(position.chess()).map_err(|_| {
        debug!("Rules engine rejected move");
        not_legal()
    })?;

    let next = position.chess().clone().play(&m).map_err(|_| not_legal())?;
    Ok(Position::from_chess(next))
}

/// Parses notation against a position and returns the canonical legal move.
///
/// Alternate spellings the engine understands (for example king-takes-rook
/// castling) are normalized to the form `legal_moves` produces.
#[instrument(skip(position), fields(fen = %position))]
pub fn parse_move(position: &Position, notation: &str) -> Result<Move, IllegalMoveError> {
    let uci: UciMove = notation
        .parse()
        .map_err(|_| IllegalMoveError::Notation(notation.to_string()))?;
    let requested =
        Move::from_uci(&uci).ok_or_else(|| IllegalMoveError::Notation(notation.to_string()))?;

    let m = uci
        .to_move(position.chess())
        .map_err(|_| IllegalMoveError::NotLegal {
            mv: requested,
            fen: position.to_fen(),
        })?;

    Move::from_uci(&UciMove::from_move(&m, CastlingMode::Standard))
        .ok_or_else(|| IllegalMoveError::Notation(notation.to_string()))
}

/// Checks whether a move is legal in the position.
pub fn is_legal(position: &Position, mv: Move) -> bool {
    mv.to_uci().to_move(position.chess()).is_ok()
}

/// Checks whether the side to move is in check.
pub fn is_check(position: &Position) -> bool {
    position.chess().is_check()
}
