//! Oracle error types.

use derive_more::{Display, Error};
use tracing::{instrument, warn};

/// What went wrong talking to an oracle.
#[derive(Debug, Clone, PartialEq, Eq, Display)]
pub enum OracleErrorKind {
    /// No answer within the configured bound.
    #[display("timed out after {}ms", _0)]
    Timeout(u64),
    /// The request never completed (connection, process or HTTP failure).
    #[display("transport failure: {}", _0)]
    Transport(String),
    /// An answer arrived but could not be understood.
    #[display("malformed response: {}", _0)]
    Malformed(String),
    /// The service answered with an explicit error status.
    #[display("service error: {}", _0)]
    Service(String),
}

/// Oracle error with location tracking.
#[derive(Debug, Clone, Display, Error)]
#[display("Oracle error: {} at {}:{}", kind, file, line)]
pub struct OracleError {
    /// Error classification.
    pub kind: OracleErrorKind,
    /// Line number where error occurred.
    pub line: u32,
    /// Source file where error occurred.
    pub file: &'static str,
}

impl OracleError {
    /// Creates a new oracle error with caller location tracking.
    #[track_caller]
    #[instrument]
    pub fn new(kind: OracleErrorKind) -> Self {
        let loc = std::panic::Location::caller();
        warn!(error_kind = %kind, "Oracle error created");
        Self {
            kind,
            line: loc.line(),
            file: loc.file(),
        }
    }

    /// Shorthand for a transport failure.
    #[track_caller]
    pub fn transport(message: impl Into<String>) -> Self {
        Self::new(OracleErrorKind::Transport(message.into()))
    }

    /// Shorthand for a malformed response.
    #[track_caller]
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::new(OracleErrorKind::Malformed(message.into()))
    }

    /// Returns true when the failure was a timeout.
    pub fn is_timeout(&self) -> bool {
        matches!(self.kind, OracleErrorKind::Timeout(_))
    }
}

impl From<reqwest::Error> for OracleError {
    #[track_caller]
    fn from(err: reqwest::Error) -> Self {
        Self::transport(format!("HTTP request failed: {}", err))
    }
}

impl From<std::io::Error> for OracleError {
    #[track_caller]
    fn from(err: std::io::Error) -> Self {
        Self::transport(format!("I/O error: {}", err))
    }
}
