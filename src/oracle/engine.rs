//! Oracle backed by a local UCI engine process.
//!
//! The engine is spawned on first use and kept alive across requests. If a
//! request is abandoned mid-search (the client timed out), the next request
//! stops the search and drains its output before asking again.

use super::{MoveOracle, OracleError, OracleRequest};
use std::process::Stdio;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines};
use tokio::process::{Child, ChildStdin, ChildStdout, Command};
use tokio::sync::Mutex;
use tracing::{debug, info, instrument, warn};

/// Handle to a running engine.
struct EngineProcess {
    _child: Child,
    stdin: ChildStdin,
    lines: Lines<BufReader<ChildStdout>>,
}

impl EngineProcess {
    async fn spawn(program: &str, args: &[String]) -> Result<Self, OracleError> {
        info!(program, "Spawning UCI engine");
        let mut child = Command::new(program)
            .args(args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| OracleError::transport("engine stdin unavailable"))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| OracleError::transport("engine stdout unavailable"))?;

        let mut process = Self {
            _child: child,
            stdin,
            lines: BufReader::new(stdout).lines(),
        };
        process.send("uci").await?;
        process.read_until(|line| line == "uciok").await?;
        Ok(process)
    }

    async fn send(&mut self, command: &str) -> Result<(), OracleError> {
        debug!(command, "To engine");
        self.stdin.write_all(command.as_bytes()).await?;
        self.stdin.write_all(b"\n").await?;
        self.stdin.flush().await?;
        Ok(())
    }

    /// Reads lines until one satisfies `done`, returning it.
    async fn read_until(&mut self, done: impl Fn(&str) -> bool) -> Result<String, OracleError> {
        while let Some(line) = self.lines.next_line().await? {
            let line = line.trim();
            if done(line) {
                return Ok(line.to_string());
            }
        }
        Err(OracleError::transport("engine closed its output"))
    }

    /// Stops any abandoned search and waits until the engine is idle.
    async fn synchronize(&mut self) -> Result<(), OracleError> {
        self.send("stop").await?;
        self.send("isready").await?;
        self.read_until(|line| line == "readyok").await?;
        Ok(())
    }

    async fn best_move(
        &mut self,
        fen: &str,
        movetime: Duration,
    ) -> Result<Option<String>, OracleError> {
        self.synchronize().await?;
        self.send(&format!("position fen {}", fen)).await?;
        let go = format!("go movetime {}", movetime.as_millis());
        self.send(&go).await?;
        let line = self.read_until(|line| line.starts_with("bestmove")).await?;
        Ok(parse_bestmove(&line))
    }
}

/// Extracts the move from a `bestmove` line.
fn parse_bestmove(line: &str) -> Option<String> {
    line.split_whitespace()
        .nth(1)
        .filter(|mv| *mv != "(none)" && *mv != "0000")
        .map(str::to_string)
}

/// Oracle driving a UCI engine such as Stockfish.
pub struct EngineOracle {
    program: String,
    args: Vec<String>,
    movetime: Duration,
    process: Mutex<Option<EngineProcess>>,
}

impl std::fmt::Debug for EngineOracle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EngineOracle")
            .field("program", &self.program)
            .field("args", &self.args)
            .field("movetime", &self.movetime)
            .finish()
    }
}

impl EngineOracle {
    /// Creates an oracle that will launch `program` on first use.
    pub fn new(program: impl Into<String>, args: Vec<String>, movetime: Duration) -> Self {
        Self {
            program: program.into(),
            args,
            movetime,
            process: Mutex::new(None),
        }
    }
}

#[async_trait::async_trait]
impl MoveOracle for EngineOracle {
    fn name(&self) -> &str {
        "engine"
    }

    #[instrument(skip_all, fields(program = %self.program))]
    async fn suggest(&self, request: &OracleRequest) -> Result<Option<String>, OracleError> {
        let mut slot = self.process.lock().await;
        if slot.is_none() {
            *slot = Some(EngineProcess::spawn(&self.program, &self.args).await?);
        }

        let Some(process) = slot.as_mut() else {
            return Err(OracleError::transport("engine unavailable"));
        };

        match process
            .best_move(&request.position().to_fen(), self.movetime)
            .await
        {
            Ok(mv) => Ok(mv),
            Err(e) => {
                warn!(error = %e, "Engine failed, discarding process");
                *slot = None;
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::games::chess::Position;
    use crate::oracle::OracleErrorKind;

    #[test]
    fn test_parse_bestmove() {
        assert_eq!(
            parse_bestmove("bestmove e2e4 ponder e7e5").as_deref(),
            Some("e2e4")
        );
        assert_eq!(parse_bestmove("bestmove a7a8q").as_deref(), Some("a7a8q"));
        assert_eq!(parse_bestmove("bestmove (none)"), None);
        assert_eq!(parse_bestmove("bestmove 0000"), None);
        assert_eq!(parse_bestmove("bestmove"), None);
    }

    #[tokio::test]
    async fn test_missing_engine_is_transport_error() {
        let oracle = EngineOracle::new(
            "/nonexistent/uci-engine",
            Vec::new(),
            Duration::from_millis(10),
        );
        let request = OracleRequest::for_position(&Position::new());
        let err = oracle.suggest(&request).await.unwrap_err();
        assert!(matches!(err.kind, OracleErrorKind::Transport(_)));
    }
}
