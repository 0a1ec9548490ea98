//! JSON payloads exchanged with a remote move service.

use super::OracleRequest;
use crate::games::chess::Side;
use serde::{Deserialize, Serialize};

/// Request body sent to the move service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OracleRequestPayload {
    /// Position in FEN.
    pub position: String,
    /// Side the service should move for.
    pub side_to_move: Side,
    /// Every legal move, in coordinate notation.
    pub legal_moves: Vec<String>,
}

impl From<&OracleRequest> for OracleRequestPayload {
    fn from(request: &OracleRequest) -> Self {
        Self {
            position: request.position().to_fen(),
            side_to_move: *request.side_to_move(),
            legal_moves: request.legal_moves().iter().map(|m| m.to_string()).collect(),
        }
    }
}

/// Status reported by the move service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OracleStatus {
    /// A move was chosen.
    Success,
    /// The service found nothing to play.
    NoLegalMoves,
    /// The service failed internally.
    Error,
    /// The service's own model produced a move it could not vouch for.
    InvalidMoveSuggested,
}

/// Response body returned by the move service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OracleResponsePayload {
    /// Suggested move, free-form text.
    #[serde(rename = "move", default)]
    pub mv: Option<String>,
    /// Outcome reported by the service.
    pub status: OracleStatus,
}
