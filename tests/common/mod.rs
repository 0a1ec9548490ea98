//! Scripted in-process oracle shared by the integration tests.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use strictly_chess::{MoveOracle, OracleClient, OracleError, OracleRequest};
use tokio::sync::Notify;

/// One scripted answer.
#[derive(Debug, Clone)]
pub enum Behavior {
    /// Answer with this text.
    Reply(String),
    /// Answer with the first move of the offered set.
    FirstLegal,
    /// Answer without naming a move.
    Silent,
    /// Fail with a transport error.
    Fail,
    /// Never answer.
    Hang,
    /// Wait for the notify, then answer with this text.
    Gated(Arc<Notify>, String),
}

/// Oracle that plays back a script, then answers with the first legal move.
#[derive(Debug, Default)]
pub struct ScriptedOracle {
    script: Mutex<VecDeque<Behavior>>,
    calls: AtomicUsize,
}

impl ScriptedOracle {
    pub fn new(script: impl IntoIterator<Item = Behavior>) -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(script.into_iter().collect()),
            calls: AtomicUsize::new(0),
        })
    }

    pub fn replying(moves: &[&str]) -> Arc<Self> {
        Self::new(moves.iter().map(|m| Behavior::Reply(m.to_string())))
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl MoveOracle for ScriptedOracle {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn suggest(&self, request: &OracleRequest) -> Result<Option<String>, OracleError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let next = self
            .script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Behavior::FirstLegal);
        match next {
            Behavior::Reply(text) => Ok(Some(text)),
            Behavior::FirstLegal => Ok(request.legal_moves().first().map(|m| m.to_string())),
            Behavior::Silent => Ok(None),
            Behavior::Fail => Err(OracleError::transport("scripted failure")),
            Behavior::Hang => {
                tokio::time::sleep(Duration::from_secs(3600)).await;
                Ok(None)
            }
            Behavior::Gated(gate, text) => {
                gate.notified().await;
                Ok(Some(text))
            }
        }
    }
}

/// Wraps a scripted oracle in a client with the given timeout.
pub fn client(oracle: &Arc<ScriptedOracle>, timeout: Duration) -> OracleClient {
    OracleClient::new(oracle.clone(), timeout)
}
