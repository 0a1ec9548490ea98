//! Draw detection logic for chess.

use super::super::Position;
use shakmaty::Position as _;
use tracing::{debug, instrument};

/// Half-moves without a capture or pawn move after which the game is drawn.
pub const FIFTY_MOVE_HALFMOVES: u32 = 100;

/// Occurrences of the same position that draw the game.
pub const REPETITION_LIMIT: usize = 3;

/// Checks if neither side can possibly deliver mate.
#[instrument(skip(position), fields(fen = %position))]
pub fn is_insufficient_material(position: &Position) -> bool {
    position.chess().is_insufficient_material()
}

/// Checks if the current position has occurred three times.
///
/// `history` holds every earlier position of the game, oldest first.
#[instrument(skip_all, fields(fen = %position, plies = history.len()))]
pub fn is_threefold_repetition(position: &Position, history: &[Position]) -> bool {
    let key = position.repetition_key();
    let occurrences = 1 + history
        .iter()
        .filter(|earlier| earlier.repetition_key() == key)
        .count();
    debug!(occurrences, "Counted repetitions");
    occurrences >= REPETITION_LIMIT
}

/// Checks if fifty moves passed without a capture or pawn move.
#[instrument(skip(position), fields(fen = %position))]
pub fn is_fifty_move_draw(position: &Position) -> bool {
    position.halfmove_clock() >= FIFTY_MOVE_HALFMOVES
}

#[cfg(test)]
mod tests {
    use super::super::apply;
    use super::*;

    #[test]
    fn test_bare_kings_insufficient() {
        let position = Position::from_fen("8/8/8/4k3/8/8/8/4K3 w - - 0 1").unwrap();
        assert!(is_insufficient_material(&position));
    }

    #[test]
    fn test_lone_bishop_insufficient() {
        let position = Position::from_fen("8/8/8/4k3/8/8/8/2B1K3 w - - 0 1").unwrap();
        assert!(is_insufficient_material(&position));
    }

    #[test]
    fn test_rook_is_sufficient() {
        let position = Position::from_fen("8/8/8/4k3/8/8/R7/4K3 w - - 0 1").unwrap();
        assert!(!is_insufficient_material(&position));
        assert!(!is_insufficient_material(&Position::new()));
    }

    #[test]
    fn test_knight_shuffle_repeats() {
        let mut history = Vec::new();
        let mut position = Position::new();
        let shuffle = ["g1f3", "g8f6", "f3g1", "f6g8"];

        for (ply, mv) in shuffle.iter().cycle().take(8).enumerate() {
            let next = apply(&position, mv.parse().unwrap()).unwrap();
            history.push(position);
            position = next;
            let expected = ply == 7;
            assert_eq!(
                is_threefold_repetition(&position, &history),
                expected,
                "ply {}",
                ply + 1
            );
        }
    }

    #[test]
    fn test_fifty_move_clock() {
        let fresh = Position::from_fen("8/8/8/4k3/8/8/R7/4K3 w - - 99 80").unwrap();
        assert!(!is_fifty_move_draw(&fresh));
        let stale = Position::from_fen("8/8/8/4k3/8/8/R7/4K3 w - - 100 80").unwrap();
        assert!(is_fifty_move_draw(&stale));
    }
}
