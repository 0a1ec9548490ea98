//! Oracle that asks a hosted language model for a move.

use super::{MoveOracle, OracleError, OracleRequest, sanitize};
use crate::games::chess::Move;
use crate::llm_client::LlmClient;
use tracing::{debug, instrument};

const SYSTEM_PROMPT: &str = "You are a chess engine. You are given a position in FEN and the \
complete list of legal moves in UCI notation. Reply with exactly one move copied from that \
list and nothing else.";

/// Oracle backed by an LLM chat endpoint.
#[derive(Debug, Clone)]
pub struct LlmOracle {
    client: LlmClient,
}

impl LlmOracle {
    /// Wraps an LLM client.
    pub fn new(client: LlmClient) -> Self {
        Self { client }
    }

    /// Renders the user message for a request.
    pub fn prompt(request: &OracleRequest) -> String {
        let moves: Vec<String> = request
            .legal_moves()
            .iter()
            .map(|m| m.to_string())
            .collect();
        format!(
            "Position (FEN): {}\nYou are playing the {} side.\nLegal moves: {}\n\nYour move:",
            request.position(),
            request.side_to_move(),
            moves.join(" ")
        )
    }

    /// Picks the move out of a free-form reply.
    ///
    /// Models pad the move with labels, emphasis or prose, so the first
    /// token that reads as coordinate notation wins. Without one, the first
    /// token is returned so validation can report it.
    pub fn extract_move(reply: &str) -> Option<&str> {
        reply
            .split_whitespace()
            .find(|token| sanitize(token).parse::<Move>().is_ok())
            .or_else(|| reply.split_whitespace().next())
    }
}

#[async_trait::async_trait]
impl MoveOracle for LlmOracle {
    fn name(&self) -> &str {
        "llm"
    }

    #[instrument(skip_all, fields(model = %self.client.config().model()))]
    async fn suggest(&self, request: &OracleRequest) -> Result<Option<String>, OracleError> {
        let reply = self
            .client
            .generate(SYSTEM_PROMPT, &Self::prompt(request))
            .await
            .map_err(|e| OracleError::transport(e.message))?;

        let token = Self::extract_move(&reply).map(str::to_string);
        debug!(reply_length = reply.len(), ?token, "LLM replied");
        Ok(token)
    }
}
