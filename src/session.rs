//! Game session aggregate.
//!
//! A session owns the authoritative position, the game log and the verdict.
//! Only the turn coordinator mutates it; a reset replaces the session
//! instead of rewriting its history.

use crate::games::chess::{Move, Position, Provenance, Side, Verdict};
use chrono::{DateTime, Utc};
use derive_getters::Getters;
use derive_new::new;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};
use uuid::Uuid;

/// Unique identity of a game session.
///
/// Oracle replies carry the identity of the session that asked, so a reply
/// that outlives its session can be recognized and dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, derive_more::Display)]
pub struct SessionId(Uuid);

impl SessionId {
    /// Generates a fresh identity.
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }
}

/// A move accepted into the game log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Getters, new)]
pub struct PlayedMove {
    /// Side that made the move.
    side: Side,
    /// The move in coordinate notation.
    mv: Move,
    /// Where the move came from.
    provenance: Provenance,
}

/// A single game from start to verdict.
#[derive(Debug, Clone, Getters)]
pub struct GameSession {
    /// Session identity.
    id: SessionId,
    /// Current position.
    position: Position,
    /// Earlier positions, oldest first.
    history: Vec<Position>,
    /// Accepted moves in order.
    moves: Vec<PlayedMove>,
    /// Side played by the human.
    human_side: Side,
    /// Terminal verdict, `None` while in progress.
    verdict: Option<Verdict>,
    /// When the session began.
    started_at: DateTime<Utc>,
    /// When the verdict was reached.
    ended_at: Option<DateTime<Utc>>,
}

impl GameSession {
    /// Creates a new session starting from `start`.
    #[instrument(skip(start), fields(fen = %start))]
    pub fn new(human_side: Side, start: Position) -> Self {
        let id = SessionId::generate();
        info!(session_id = %id, ?human_side, "Creating new game session");
        Self {
            id,
            position: start,
            history: Vec::new(),
            moves: Vec::new(),
            human_side,
            verdict: None,
            started_at: Utc::now(),
            ended_at: None,
        }
    }

    /// Side played by the automated opponent.
    pub fn automated_side(&self) -> Side {
        self.human_side.opponent()
    }

    /// Returns true once a verdict has been reached.
    pub fn is_terminal(&self) -> bool {
        self.verdict.is_some()
    }

    /// Checks if the human is to move.
    pub fn is_human_turn(&self) -> bool {
        self.position.side_to_move() == self.human_side
    }

    /// Time from start to verdict, or to now while in progress.
    pub fn duration(&self) -> chrono::Duration {
        self.ended_at.unwrap_or_else(Utc::now) - self.started_at
    }

    /// Appends an accepted move and its resulting position.
    #[instrument(skip(self, next), fields(session_id = %self.id, mv = %played.mv))]
    pub(crate) fn record(&mut self, played: PlayedMove, next: Position) {
        let previous = std::mem::replace(&mut self.position, next);
        self.history.push(previous);
        self.moves.push(played);
        debug!(ply = self.moves.len(), "Move recorded");
    }

    /// Stores the verdict and closes the session.
    #[instrument(skip(self), fields(session_id = %self.id))]
    pub(crate) fn conclude(&mut self, verdict: Verdict) {
        info!(%verdict, plies = self.moves.len(), "Session concluded");
        self.verdict = Some(verdict);
        self.ended_at = Some(Utc::now());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::games::chess::rules;

    #[test]
    fn test_sessions_have_distinct_ids() {
        let a = GameSession::new(Side::First, Position::new());
        let b = GameSession::new(Side::First, Position::new());
        assert_ne!(a.id(), b.id());
    }

    #[test]
    fn test_record_keeps_previous_position() {
        let start = Position::new();
        let mut session = GameSession::new(Side::Second, start.clone());
        assert_eq!(session.automated_side(), Side::First);
        assert!(!session.is_human_turn());

        let mv: Move = "d2d4".parse().unwrap();
        let next = rules::apply(&start, mv).unwrap();
        session.record(
            PlayedMove::new(Side::First, mv, Provenance::Oracle),
            next.clone(),
        );

        assert_eq!(session.position(), &next);
        assert_eq!(session.history(), &vec![start]);
        assert_eq!(session.moves().len(), 1);
        assert!(session.is_human_turn());
    }

    #[test]
    fn test_conclude_sets_end() {
        let mut session = GameSession::new(Side::First, Position::new());
        assert!(!session.is_terminal());
        session.conclude(Verdict::Stalemate);
        assert!(session.is_terminal());
        assert!(session.ended_at().is_some());
        assert!(session.duration() >= chrono::Duration::zero());
    }
}
