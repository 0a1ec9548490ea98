//! Mate detection for chess.

use super::super::Position;
use shakmaty::Position as _;
use tracing::instrument;

/// Checks if the side to move is checkmated.
///
/// The side to move has no legal moves and is in check.
#[instrument(skip(position), fields(fen = %position))]
pub fn is_checkmate(position: &Position) -> bool {
    position.chess().is_checkmate()
}

/// Checks if the side to move is stalemated.
///
/// The side to move has no legal moves and is not in check.
#[instrument(skip(position), fields(fen = %position))]
pub fn is_stalemate(position: &Position) -> bool {
    position.chess().is_stalemate()
}

#[cfg(test)]
mod tests {
    use super::super::{apply, legal_moves};
    use super::*;

    fn play(moves: &[&str]) -> Position {
        moves.iter().fold(Position::new(), |position, mv| {
            apply(&position, mv.parse().unwrap()).unwrap()
        })
    }

    #[test]
    fn test_start_is_not_mate() {
        let position = Position::new();
        assert!(!is_checkmate(&position));
        assert!(!is_stalemate(&position));
    }

    #[test]
    fn test_fools_mate() {
        let position = play(&["f2f3", "e7e5", "g2g4", "d8h4"]);
        assert!(is_checkmate(&position));
        assert!(!is_stalemate(&position));
        assert!(legal_moves(&position).is_empty());
    }

    #[test]
    fn test_queen_stalemate() {
        let position = Position::from_fen("7k/5Q2/6K1/8/8/8/8/8 b - - 0 1").unwrap();
        assert!(is_stalemate(&position));
        assert!(!is_checkmate(&position));
    }
}
