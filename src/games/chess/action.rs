//! First-class move types for chess.
//!
//! A move is a coordinate pair plus an optional promotion piece. It carries
//! no legality on its own: a move is only legal relative to a specific
//! position, and the rules adapter decides that.

use serde::{Deserialize, Serialize};
use shakmaty::uci::UciMove;
use shakmaty::{Role, Square};
use std::str::FromStr;
use tracing::instrument;

/// A candidate move in canonical coordinate notation (`e2e4`, `e7e8q`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Move {
    from: Square,
    to: Square,
    promotion: Option<Role>,
}

impl Move {
    /// Creates a new move.
    pub fn new(from: Square, to: Square, promotion: Option<Role>) -> Self {
        Self {
            from,
            to,
            promotion,
        }
    }

    /// Returns the origin square.
    pub fn from(&self) -> Square {
        self.from
    }

    /// Returns the destination square.
    pub fn to(&self) -> Square {
        self.to
    }

    /// Returns the promotion piece, if any.
    pub fn promotion(&self) -> Option<Role> {
        self.promotion
    }

    /// Converts to the rules engine's coordinate move.
    pub(crate) fn to_uci(self) -> UciMove {
        UciMove::Normal {
            from: self.from,
            to: self.to,
            promotion: self.promotion,
        }
    }

    /// Converts from the rules engine's coordinate move.
    ///
    /// Drop moves and null moves have no meaning in standard chess.
    pub(crate) fn from_uci(uci: &UciMove) -> Option<Self> {
        match *uci {
            UciMove::Normal {
                from,
                to,
                promotion,
            } => Some(Self::new(from, to, promotion)),
            _ => None,
        }
    }
}

impl std::fmt::Display for Move {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_uci())
    }
}

impl FromStr for Move {
    type Err = IllegalMoveError;

    #[instrument]
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let uci: UciMove = s
            .parse()
            .map_err(|_| IllegalMoveError::Notation(s.to_string()))?;
        Self::from_uci(&uci).ok_or_else(|| IllegalMoveError::Notation(s.to_string()))
    }
}

impl TryFrom<String> for Move {
    type Error = IllegalMoveError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Move> for String {
    fn from(mv: Move) -> Self {
        mv.to_string()
    }
}

/// A move the rules engine refused.
#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display)]
pub enum IllegalMoveError {
    /// The text is not a coordinate move at all.
    #[display("'{}' is not a coordinate move", _0)]
    Notation(String),

    /// The move is well formed but not legal in the position.
    #[display("{} is not legal in {}", mv, fen)]
    NotLegal {
        /// The rejected move.
        mv: Move,
        /// The position it was checked against.
        fen: String,
    },
}

impl std::error::Error for IllegalMoveError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_simple_move() {
        let mv: Move = "e2e4".parse().unwrap();
        assert_eq!(mv.from(), Square::E2);
        assert_eq!(mv.to(), Square::E4);
        assert_eq!(mv.promotion(), None);
        assert_eq!(mv.to_string(), "e2e4");
    }

    #[test]
    fn test_parse_promotion() {
        let mv: Move = "a7a8q".parse().unwrap();
        assert_eq!(mv.promotion(), Some(Role::Queen));
        assert_eq!(mv.to_string(), "a7a8q");
    }

    #[test]
    fn test_reject_garbage() {
        assert!(matches!(
            "Nf3".parse::<Move>(),
            Err(IllegalMoveError::Notation(_))
        ));
        assert!("".parse::<Move>().is_err());
        assert!("0000".parse::<Move>().is_err());
    }

    #[test]
    fn test_serde_as_string() {
        let mv: Move = "g1f3".parse().unwrap();
        assert_eq!(serde_json::to_string(&mv).unwrap(), "\"g1f3\"");
        let back: Move = serde_json::from_str("\"g1f3\"").unwrap();
        assert_eq!(back, mv);
    }
}
