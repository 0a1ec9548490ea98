//! Fallback move selection.
//!
//! Used whenever the oracle fails, times out or suggests something unusable.
//! Selectors only ever choose from the legal-move set they are handed.

use crate::games::chess::{Move, Position, rules};
use rand::SeedableRng;
use rand::prelude::IndexedRandom;
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};
use shakmaty::{Position as _, Role};
use tracing::{debug, instrument};

/// Picks a legal move without consulting the oracle.
pub trait FallbackSelector: Send {
    /// Chooses one of `legal_moves`.
    ///
    /// Returns `None` only when `legal_moves` is empty.
    fn pick_move(&mut self, position: &Position, legal_moves: &[Move]) -> Option<Move>;

    /// Display name used in logs.
    fn name(&self) -> &str;
}

/// Selectable fallback policies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, strum::Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum FallbackPolicy {
    /// Uniformly random legal move.
    #[default]
    Random,
    /// One-ply static evaluation.
    Greedy,
}

impl FallbackPolicy {
    /// Builds the selector, seeded for reproducible games when `seed` is set.
    pub fn build(self, seed: Option<u64>) -> Box<dyn FallbackSelector> {
        match self {
            FallbackPolicy::Random => Box::new(RandomFallback::from_seed(seed)),
            FallbackPolicy::Greedy => Box::new(GreedyFallback::from_seed(seed)),
        }
    }
}

fn rng_from_seed(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    }
}

/// Uniform random choice among legal moves.
#[derive(Debug)]
pub struct RandomFallback {
    rng: StdRng,
}

impl RandomFallback {
    /// Creates a selector seeded from the operating system.
    pub fn new() -> Self {
        Self::from_seed(None)
    }

    /// Creates a selector with an optional fixed seed.
    pub fn from_seed(seed: Option<u64>) -> Self {
        Self {
            rng: rng_from_seed(seed),
        }
    }
}

impl Default for RandomFallback {
    fn default() -> Self {
        Self::new()
    }
}

impl FallbackSelector for RandomFallback {
    #[instrument(skip_all, fields(count = legal_moves.len()))]
    fn pick_move(&mut self, _position: &Position, legal_moves: &[Move]) -> Option<Move> {
        let choice = legal_moves.choose(&mut self.rng).copied();
        debug!(?choice, "Random fallback chose");
        choice
    }

    fn name(&self) -> &str {
        "random"
    }
}

/// Prefers mate, then material, then checks; ties broken at random.
#[derive(Debug)]
pub struct GreedyFallback {
    rng: StdRng,
}

impl GreedyFallback {
    /// Creates a selector with an optional fixed seed.
    pub fn from_seed(seed: Option<u64>) -> Self {
        Self {
            rng: rng_from_seed(seed),
        }
    }

    fn piece_value(role: Role) -> i32 {
        match role {
            Role::Pawn => 100,
            Role::Knight => 320,
            Role::Bishop => 330,
            Role::Rook => 500,
            Role::Queen => 900,
            Role::King => 0,
        }
    }

    /// Scores a move from the mover's point of view.
    fn score(position: &Position, mv: Move) -> i32 {
        let Ok(m) = mv.to_uci().to_move(position.chess()) else {
            return i32::MIN;
        };
        let Ok(next) = rules::apply(position, mv) else {
            return i32::MIN;
        };
        if rules::is_checkmate(&next) {
            return i32::MAX;
        }

        let mut score = m.capture().map_or(0, Self::piece_value);
        if let Some(promoted) = m.promotion() {
            score += Self::piece_value(promoted) - Self::piece_value(Role::Pawn);
        }
        if next.chess().is_check() {
            score += 50;
        }
        if rules::is_stalemate(&next) {
            // Throwing away a game we might win.
            score -= 1000;
        }
        score
    }
}

impl FallbackSelector for GreedyFallback {
    #[instrument(skip_all, fields(count = legal_moves.len()))]
    fn pick_move(&mut self, position: &Position, legal_moves: &[Move]) -> Option<Move> {
        let scored: Vec<(Move, i32)> = legal_moves
            .iter()
            .map(|mv| (*mv, Self::score(position, *mv)))
            .collect();
        let best = scored.iter().map(|(_, score)| *score).max()?;
        let candidates: Vec<Move> = scored
            .into_iter()
            .filter(|(_, score)| *score == best)
            .map(|(mv, _)| mv)
            .collect();
        let choice = candidates.choose(&mut self.rng).copied();
        debug!(?choice, best, candidates = candidates.len(), "Greedy fallback chose");
        choice
    }

    fn name(&self) -> &str {
        "greedy"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_random_picks_from_set() {
        let position = Position::new();
        let moves = rules::legal_moves(&position);
        let mut selector = RandomFallback::from_seed(Some(7));
        for _ in 0..20 {
            let mv = selector.pick_move(&position, &moves).unwrap();
            assert!(moves.contains(&mv));
        }
    }

    #[test]
    fn test_empty_set_yields_none() {
        let position = Position::new();
        assert_eq!(RandomFallback::new().pick_move(&position, &[]), None);
        assert_eq!(
            GreedyFallback::from_seed(Some(1)).pick_move(&position, &[]),
            None
        );
    }

    #[test]
    fn test_seeded_random_is_reproducible() {
        let position = Position::new();
        let moves = rules::legal_moves(&position);
        let mut a = RandomFallback::from_seed(Some(42));
        let mut b = RandomFallback::from_seed(Some(42));
        for _ in 0..10 {
            assert_eq!(
                a.pick_move(&position, &moves),
                b.pick_move(&position, &moves)
            );
        }
    }

    #[test]
    fn test_greedy_takes_the_queen() {
        // White rook can capture an undefended queen on a8.
        let position = Position::from_fen("q3k3/8/8/8/8/8/8/R3K3 w - - 0 1").unwrap();
        let moves = rules::legal_moves(&position);
        let mv = GreedyFallback::from_seed(Some(3))
            .pick_move(&position, &moves)
            .unwrap();
        assert_eq!(mv.to_string(), "a1a8");
    }

    #[test]
    fn test_greedy_finds_mate_in_one() {
        // Back-rank mate: Ra1-a8.
        let position = Position::from_fen("6k1/5ppp/8/8/8/8/8/R5K1 w - - 0 1").unwrap();
        let moves = rules::legal_moves(&position);
        let mv = GreedyFallback::from_seed(None)
            .pick_move(&position, &moves)
            .unwrap();
        assert_eq!(mv.to_string(), "a1a8");
    }

    #[test]
    fn test_policy_builds_named_selector() {
        assert_eq!(FallbackPolicy::Greedy.build(Some(1)).name(), "greedy");
        assert_eq!(FallbackPolicy::default().build(None).name(), "random");
    }
}
