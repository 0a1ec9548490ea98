//! Game-end classification.
//!
//! Runs after every accepted move. Checks are ordered so that exactly one
//! verdict is reported even when several conditions hold at once.

use super::rules;
use super::{Position, Side};
use derive_more::Display;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

/// Draw rules that are not covered by a dedicated verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
#[serde(rename_all = "snake_case")]
pub enum DrawRule {
    /// Fifty moves by each side without a capture or pawn move.
    #[display("fifty-move rule")]
    FiftyMoveRule,
}

/// Terminal outcome of a game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum Verdict {
    /// The side to move is mated.
    #[display("checkmate, {} wins", winner)]
    Checkmate {
        /// The side that delivered mate.
        winner: Side,
    },
    /// The side to move has no legal moves and is not in check.
    #[display("stalemate")]
    Stalemate,
    /// The same position occurred three times.
    #[display("draw by threefold repetition")]
    ThreefoldRepetition,
    /// Neither side can mate.
    #[display("draw by insufficient material")]
    InsufficientMaterial,
    /// Any other draw rule.
    #[display("draw by {}", rule)]
    OtherDraw {
        /// The rule that ended the game.
        rule: DrawRule,
    },
}

impl Verdict {
    /// Returns the winning side, if the game was decisive.
    pub fn winner(&self) -> Option<Side> {
        match self {
            Verdict::Checkmate { winner } => Some(*winner),
            _ => None,
        }
    }

    /// Returns true for every verdict except checkmate.
    pub fn is_draw(&self) -> bool {
        self.winner().is_none()
    }

    /// Stable name of the reason the game ended.
    pub fn reason(&self) -> &'static str {
        match self {
            Verdict::Checkmate { .. } => "checkmate",
            Verdict::Stalemate => "stalemate",
            Verdict::ThreefoldRepetition => "threefold_repetition",
            Verdict::InsufficientMaterial => "insufficient_material",
            Verdict::OtherDraw {
                rule: DrawRule::FiftyMoveRule,
            } => "fifty_move_rule",
        }
    }
}

/// Classifies a position, returning `None` while the game continues.
///
/// `history` holds every earlier position of the game, oldest first.
#[instrument(skip_all, fields(fen = %position, plies = history.len()))]
pub fn classify(position: &Position, history: &[Position]) -> Option<Verdict> {
    let verdict = if rules::is_checkmate(position) {
        Some(Verdict::Checkmate {
            winner: position.side_to_move().opponent(),
        })
    } else if rules::is_stalemate(position) {
        Some(Verdict::Stalemate)
    } else if rules::is_threefold_repetition(position, history) {
        Some(Verdict::ThreefoldRepetition)
    } else if rules::is_insufficient_material(position) {
        Some(Verdict::InsufficientMaterial)
    } else if rules::is_fifty_move_draw(position) {
        Some(Verdict::OtherDraw {
            rule: DrawRule::FiftyMoveRule,
        })
    } else {
        None
    };

    debug!(?verdict, "Classified position");
    verdict
}
