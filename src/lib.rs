//! Strictly Chess library - race-free move arbitration
//!
//! A human plays chess against an automated opponent whose moves come from
//! an untrusted, possibly slow oracle. Every move, whatever its source, is
//! validated by the rules engine before it touches the game.
//!
//! # Architecture
//!
//! - **Rules**: legal-move generation and validation (`rules`, backed by `shakmaty`)
//! - **Oracle**: bounded, re-validated move requests ([`OracleClient`], [`MoveOracle`])
//! - **Fallback**: legal moves when the oracle cannot deliver ([`FallbackSelector`])
//! - **Coordinator**: explicit turn state machine ([`TurnCoordinator`])
//! - **Verdicts**: checkmate and draw classification ([`classify`])
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use strictly_chess::{OfflineOracle, OracleClient, Side, TurnCoordinator};
//!
//! # async fn example() -> anyhow::Result<()> {
//! let client = OracleClient::new(Arc::new(OfflineOracle), std::time::Duration::from_secs(10));
//! let mut coordinator = TurnCoordinator::builder(client)
//!     .human_side(Side::First)
//!     .build()?;
//!
//! coordinator.submit_human_notation("e2e4")?;
//! coordinator.settle().await;
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![forbid(unsafe_code)]

// Private module declarations
mod config;
mod coordinator;
mod fallback;
mod games;
mod history;
mod llm_client;
mod oracle;
mod session;

// Crate-level exports - Chess model and rules
pub use games::chess::{
    DrawRule, IllegalMoveError, Move, Position, PositionError, Provenance, Side, Verdict, classify,
    rules,
};

// Crate-level exports - Session
pub use session::{GameSession, PlayedMove, SessionId};

// Crate-level exports - Oracle
pub use oracle::wire::{OracleRequestPayload, OracleResponsePayload, OracleStatus};
pub use oracle::{
    DEFAULT_TIMEOUT, EngineOracle, HttpOracle, LlmOracle, MoveOracle, OfflineOracle, OracleClient,
    OracleError, OracleErrorKind, OracleRequest, OracleResponse, sanitize, validate_suggestion,
};

// Crate-level exports - LLM client
pub use llm_client::{LlmClient, LlmConfig, LlmError, LlmProvider};

// Crate-level exports - Fallback
pub use fallback::{FallbackPolicy, FallbackSelector, GreedyFallback, RandomFallback};

// Crate-level exports - Coordinator
pub use coordinator::{
    Command, CoordinatorError, FallbackReason, GameEvent, OracleReply, Step, TurnCoordinator,
    TurnCoordinatorBuilder, TurnState,
};

// Crate-level exports - History
pub use history::{
    GameOutcome, GameRecord, HistoryError, JsonlResultSink, NullResultSink, ResultSink,
};

// Crate-level exports - Configuration
pub use config::{ArbiterConfig, ConfigError, OracleBackend};
