//! Core domain types for chess arbitration.

use serde::{Deserialize, Serialize};
use shakmaty::Color;

/// Side in the game.
///
/// The wire format and config files name sides by move order rather than
/// by piece color.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, strum::Display,
    strum::EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Side {
    /// The side that moves first (white).
    First,
    /// The side that moves second (black).
    Second,
}

impl Side {
    /// Returns the opposing side.
    pub fn opponent(self) -> Self {
        match self {
            Side::First => Side::Second,
            Side::Second => Side::First,
        }
    }

    /// Returns the piece color this side plays.
    pub fn color(self) -> Color {
        match self {
            Side::First => Color::White,
            Side::Second => Color::Black,
        }
    }
}

impl From<Color> for Side {
    fn from(color: Color) -> Self {
        match color {
            Color::White => Side::First,
            Color::Black => Side::Second,
        }
    }
}

/// Where an applied move came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, strum::Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Provenance {
    /// Submitted from board interaction.
    Human,
    /// Suggested by the move oracle and re-validated.
    Oracle,
    /// Chosen by the fallback selector.
    Fallback,
}
