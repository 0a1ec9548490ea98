//! Standard chess: positions, moves, rules and verdicts.

mod action;
mod position;
pub mod rules;
mod types;
mod verdict;

pub use action::{IllegalMoveError, Move};
pub use position::{Position, PositionError};
pub use types::{Provenance, Side};
pub use verdict::{DrawRule, Verdict, classify};
