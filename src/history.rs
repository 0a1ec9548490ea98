//! Finished-game records.
//!
//! When a game reaches a verdict the coordinator hands a [`GameRecord`] to a
//! [`ResultSink`] on a detached task. Sink failures are logged and never
//! reach gameplay.

use crate::games::chess::{Side, Verdict};
use crate::session::{GameSession, SessionId};
use derive_getters::Getters;
use derive_more::{Display, Error};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, instrument};

/// Game outcome from the human's perspective.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, strum::Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum GameOutcome {
    /// The human won.
    Win,
    /// The human lost.
    Loss,
    /// The game was drawn.
    Draw,
}

impl GameOutcome {
    /// Outcome of `verdict` for the player of `side`.
    pub fn for_side(verdict: &Verdict, side: Side) -> Self {
        match verdict.winner() {
            Some(winner) if winner == side => Self::Win,
            Some(_) => Self::Loss,
            None => Self::Draw,
        }
    }
}

/// Summary of a finished game.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Getters)]
#[serde(rename_all = "camelCase")]
pub struct GameRecord {
    /// Session the game was played in.
    session_id: SessionId,
    /// Result for the human.
    result: GameOutcome,
    /// Side the human played.
    side: Side,
    /// Why the game ended.
    reason: String,
    /// Wall-clock length of the game.
    duration_ms: i64,
    /// Number of plies played.
    moves: usize,
}

impl GameRecord {
    /// Summarizes a concluded session, or `None` if it is still running.
    #[instrument(skip(session), fields(session_id = %session.id()))]
    pub fn from_session(session: &GameSession) -> Option<Self> {
        let verdict = session.verdict().as_ref()?;
        Some(Self {
            session_id: *session.id(),
            result: GameOutcome::for_side(verdict, *session.human_side()),
            side: *session.human_side(),
            reason: verdict.reason().to_string(),
            duration_ms: session.duration().num_milliseconds(),
            moves: session.moves().len(),
        })
    }
}

/// Destination for finished-game records.
#[async_trait::async_trait]
pub trait ResultSink: Send + Sync {
    /// Stores one record.
    async fn record(&self, record: &GameRecord) -> Result<(), HistoryError>;
}

/// Sink that discards records.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullResultSink;

#[async_trait::async_trait]
impl ResultSink for NullResultSink {
    async fn record(&self, record: &GameRecord) -> Result<(), HistoryError> {
        debug!(session_id = %record.session_id, "Discarding game record");
        Ok(())
    }
}

/// Appends one JSON object per line to a file.
#[derive(Debug, Clone)]
pub struct JsonlResultSink {
    path: PathBuf,
}

impl JsonlResultSink {
    /// Creates a sink writing to `path`; the file is created on first write.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Returns the output path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads every record back, oldest first.
    #[instrument(skip(self), fields(path = %self.path.display()))]
    pub async fn load(&self) -> Result<Vec<GameRecord>, HistoryError> {
        let text = match tokio::fs::read_to_string(&self.path).await {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };
        text.lines()
            .filter(|line| !line.trim().is_empty())
            .map(|line| serde_json::from_str(line).map_err(HistoryError::from))
            .collect()
    }
}

#[async_trait::async_trait]
impl ResultSink for JsonlResultSink {
    #[instrument(skip_all, fields(path = %self.path.display(), session_id = %record.session_id))]
    async fn record(&self, record: &GameRecord) -> Result<(), HistoryError> {
        let mut line = serde_json::to_string(record)?;
        line.push('\n');

        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await?;
        file.write_all(line.as_bytes()).await?;
        file.flush().await?;

        info!(result = %record.result, reason = %record.reason, "Game record stored");
        Ok(())
    }
}

/// History error with location tracking.
#[derive(Debug, Clone, Display, Error)]
#[display("History error: {} at {}:{}", message, file, line)]
pub struct HistoryError {
    /// Error message.
    pub message: String,
    /// Line number where error occurred.
    pub line: u32,
    /// Source file where error occurred.
    pub file: &'static str,
}

impl HistoryError {
    /// Creates a new history error with caller location tracking.
    #[track_caller]
    #[instrument(skip(message))]
    pub fn new(message: impl Into<String>) -> Self {
        let loc = std::panic::Location::caller();
        Self {
            message: message.into(),
            line: loc.line(),
            file: loc.file(),
        }
    }
}

impl From<std::io::Error> for HistoryError {
    #[track_caller]
    fn from(err: std::io::Error) -> Self {
        Self::new(format!("I/O error: {}", err))
    }
}

impl From<serde_json::Error> for HistoryError {
    #[track_caller]
    fn from(err: serde_json::Error) -> Self {
        Self::new(format!("Serialization error: {}", err))
    }
}
