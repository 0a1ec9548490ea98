//! Move oracle client.
//!
//! An oracle is an untrusted, possibly slow source of moves. Every backend
//! implements [`MoveOracle`] and returns raw text; [`OracleClient`] bounds
//! the wait and classifies the answer. A suggestion is only ever reported as
//! a success after it has been re-validated against the exact position and
//! legal-move set that were sent.

mod engine;
mod error;
mod http;
mod llm;
mod offline;
pub mod wire;

pub use engine::EngineOracle;
pub use error::{OracleError, OracleErrorKind};
pub use http::HttpOracle;
pub use llm::LlmOracle;
pub use offline::OfflineOracle;

use crate::games::chess::{IllegalMoveError, Move, Position, Side, rules};
use derive_getters::Getters;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

/// Default bound on a single oracle call.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// A single decision request.
///
/// Carries the complete legal-move set so a suggestion outside it can be
/// detected.
#[derive(Debug, Clone, Getters)]
pub struct OracleRequest {
    /// Position to move in.
    position: Position,
    /// Side to move.
    side_to_move: Side,
    /// Every legal move for the side to move.
    legal_moves: Vec<Move>,
}

impl OracleRequest {
    /// Builds a request for the side to move in `position`.
    #[instrument(skip(position), fields(fen = %position))]
    pub fn for_position(position: &Position) -> Self {
        Self {
            position: position.clone(),
            side_to_move: position.side_to_move(),
            legal_moves: rules::legal_moves(position),
        }
    }
}

/// Classified result of an oracle call.
#[derive(Debug, Clone)]
pub enum OracleResponse {
    /// A re-validated legal move.
    Success(Move),
    /// The legal-move set was empty; nothing was asked.
    NoLegalMoves,
    /// The oracle answered, but not with a usable move.
    InvalidSuggestion {
        /// Sanitized suggestion, if the oracle named one.
        suggestion: Option<String>,
    },
    /// Timeout, transport or parse failure.
    Failure(OracleError),
}

impl OracleResponse {
    /// Returns the move on success.
    pub fn success(&self) -> Option<Move> {
        match self {
            OracleResponse::Success(mv) => Some(*mv),
            _ => None,
        }
    }
}

/// A backend able to suggest a move.
#[async_trait::async_trait]
pub trait MoveOracle: Send + Sync {
    /// Display name used in logs.
    fn name(&self) -> &str;

    /// Asks the backend for a move.
    ///
    /// Returns the raw suggestion text, or `None` when the backend answered
    /// without naming a move. Implementations must not retry.
    async fn suggest(&self, request: &OracleRequest) -> Result<Option<String>, OracleError>;
}

/// Issues bounded, validated requests to a [`MoveOracle`].
#[derive(Clone)]
pub struct OracleClient {
    oracle: Arc<dyn MoveOracle>,
    timeout: Duration,
}

impl std::fmt::Debug for OracleClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OracleClient")
            .field("oracle", &self.oracle.name())
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl OracleClient {
    /// Creates a client with the given timeout.
    #[instrument(skip(oracle), fields(oracle = %oracle.name()))]
    pub fn new(oracle: Arc<dyn MoveOracle>, timeout: Duration) -> Self {
        info!("Creating oracle client");
        Self { oracle, timeout }
    }

    /// Returns the backend name.
    pub fn name(&self) -> &str {
        self.oracle.name()
    }

    /// Returns the configured timeout.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Requests one move and classifies the outcome.
    ///
    /// Never contacts the backend when the legal-move set is empty.
    #[instrument(skip_all, fields(oracle = %self.oracle.name(), fen = %request.position()))]
    pub async fn request_move(&self, request: &OracleRequest) -> OracleResponse {
        if request.legal_moves().is_empty() {
            debug!("No legal moves, skipping oracle call");
            return OracleResponse::NoLegalMoves;
        }

        let started = std::time::Instant::now();
        let outcome = tokio::time::timeout(self.timeout, self.oracle.suggest(request)).await;
        let elapsed_ms = started.elapsed().as_millis() as u64;

        let response = match outcome {
            Err(_) => OracleResponse::Failure(OracleError::new(OracleErrorKind::Timeout(
                self.timeout.as_millis() as u64,
            ))),
            Ok(Err(e)) => OracleResponse::Failure(e),
            Ok(Ok(None)) => OracleResponse::InvalidSuggestion { suggestion: None },
            Ok(Ok(Some(raw))) => validate_suggestion(request, &raw),
        };

        debug!(elapsed_ms, ?response, "Oracle call classified");
        response
    }
}

/// Strips whitespace, quoting, emphasis, code fences and trailing
/// punctuation from a suggestion.
pub fn sanitize(raw: &str) -> String {
    const WRAPPERS: &[char] = &['"', '\'', '`', '*', '_'];
    const TRAILING: &[char] = &['.', ',', '!', ';', ':'];
    let mut text = raw.trim();
    loop {
        let stripped = text
            .trim_matches(WRAPPERS)
            .trim_end_matches(TRAILING)
            .trim();
        if stripped == text {
            break;
        }
        text = stripped;
    }
    text.to_ascii_lowercase()
}

/// Re-validates a raw suggestion against the request it answers.
///
/// The move must be legal in the request's position and a member of the
/// request's legal-move set.
#[instrument(skip(request), fields(fen = %request.position()))]
pub fn validate_suggestion(request: &OracleRequest, raw: &str) -> OracleResponse {
    let suggestion = sanitize(raw);
    match rules::parse_move(request.position(), &suggestion) {
        Ok(mv) if request.legal_moves().contains(&mv) => OracleResponse::Success(mv),
        Ok(mv) => {
            warn!(%mv, "Suggestion is legal but was not offered");
            OracleResponse::InvalidSuggestion {
                suggestion: Some(suggestion),
            }
        }
        Err(IllegalMoveError::NotLegal { mv, .. }) => {
            warn!(%mv, "Oracle suggested an illegal move");
            OracleResponse::InvalidSuggestion {
                suggestion: Some(suggestion),
            }
        }
        Err(IllegalMoveError::Notation(text)) => OracleResponse::Failure(OracleError::malformed(
            format!("'{}' is not a coordinate move", text),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_strips_quoting() {
        assert_eq!(sanitize("  e2e4\n"), "e2e4");
        assert_eq!(sanitize("\"e2e4\""), "e2e4");
        assert_eq!(sanitize("'E7E8Q'"), "e7e8q");
        assert_eq!(sanitize("```\ng1f3\n```"), "g1f3");
        assert_eq!(sanitize("\" 'b1c3' \""), "b1c3");
    }

    #[test]
    fn test_sanitize_strips_emphasis_and_punctuation() {
        assert_eq!(sanitize("e2e4."), "e2e4");
        assert_eq!(sanitize("**e2e4**"), "e2e4");
        assert_eq!(sanitize("__g8f6__!"), "g8f6");
        assert_eq!(sanitize("`e7e8q`."), "e7e8q");
    }

    #[test]
    fn test_validate_punctuated_suggestion() {
        let request = OracleRequest::for_position(&Position::new());
        let response = validate_suggestion(&request, "**d2d4**.");
        assert_eq!(response.success(), Some("d2d4".parse().unwrap()));
    }

    #[test]
    fn test_validate_success() {
        let request = OracleRequest::for_position(&Position::new());
        let response = validate_suggestion(&request, " `e2e4` ");
        assert_eq!(response.success(), Some("e2e4".parse().unwrap()));
    }

    #[test]
    fn test_validate_illegal_is_invalid_suggestion() {
        let request = OracleRequest::for_position(&Position::new());
        assert!(matches!(
            validate_suggestion(&request, "e2e5"),
            OracleResponse::InvalidSuggestion {
                suggestion: Some(ref s)
            } if s == "e2e5"
        ));
    }

    #[test]
    fn test_validate_requires_membership() {
        // A legal move that was left out of the offered set.
        let position = Position::new();
        let mut request = OracleRequest::for_position(&position);
        let e4: Move = "e2e4".parse().unwrap();
        request.legal_moves.retain(|m| *m != e4);
        assert!(matches!(
            validate_suggestion(&request, "e2e4"),
            OracleResponse::InvalidSuggestion { .. }
        ));
    }

    #[test]
    fn test_validate_prose_is_failure() {
        let request = OracleRequest::for_position(&Position::new());
        assert!(matches!(
            validate_suggestion(&request, "I would play the king's pawn"),
            OracleResponse::Failure(_)
        ));
    }
}
