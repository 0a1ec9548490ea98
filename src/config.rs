//! Arbiter configuration loaded from TOML.

use crate::fallback::FallbackPolicy;
use crate::games::chess::Side;
use crate::history::{JsonlResultSink, NullResultSink, ResultSink};
use crate::llm_client::{LlmClient, LlmConfig, LlmProvider};
use crate::oracle::{EngineOracle, HttpOracle, LlmOracle, MoveOracle, OfflineOracle, OracleClient};
use derive_getters::Getters;
use derive_more::{Display, Error};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, instrument};

/// Which backend answers oracle requests.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum OracleBackend {
    /// No oracle; every automated move comes from the fallback selector.
    #[default]
    Offline,
    /// Remote JSON move service.
    Http {
        /// Endpoint receiving the request payload.
        url: String,
    },
    /// Hosted language model.
    Llm {
        /// Provider to call.
        #[serde(default = "default_provider")]
        provider: LlmProvider,
        /// Model name.
        #[serde(default = "default_model")]
        model: String,
        /// Maximum tokens per completion.
        #[serde(default = "default_max_tokens")]
        max_tokens: u32,
        /// Alternative API root, e.g. a local OpenAI-compatible server.
        #[serde(default)]
        base_url: Option<String>,
    },
    /// Local UCI engine process.
    Engine {
        /// Executable to launch.
        program: String,
        /// Extra command-line arguments.
        #[serde(default)]
        args: Vec<String>,
        /// Thinking time per move.
        #[serde(default = "default_movetime_ms")]
        movetime_ms: u64,
    },
}

fn default_provider() -> LlmProvider {
    LlmProvider::OpenAI
}

fn default_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_max_tokens() -> u32 {
    16
}

fn default_movetime_ms() -> u64 {
    500
}

fn default_timeout_ms() -> u64 {
    10_000
}

fn default_human_side() -> Side {
    Side::First
}

/// Settings for one arbiter instance.
#[derive(Debug, Clone, PartialEq, Eq, Getters, Serialize, Deserialize)]
pub struct ArbiterConfig {
    /// Side the human plays.
    #[serde(default = "default_human_side")]
    human_side: Side,

    /// Bound on a single oracle call, in milliseconds.
    #[serde(default = "default_timeout_ms")]
    oracle_timeout_ms: u64,

    /// Selector used when the oracle cannot supply a move.
    #[serde(default)]
    fallback: FallbackPolicy,

    /// Fixed seed for the fallback selector.
    #[serde(default)]
    fallback_seed: Option<u64>,

    /// Oracle backend.
    #[serde(default)]
    oracle: OracleBackend,

    /// JSON-lines file receiving finished-game records.
    #[serde(default)]
    history_path: Option<PathBuf>,
}

impl Default for ArbiterConfig {
    fn default() -> Self {
        Self {
            human_side: default_human_side(),
            oracle_timeout_ms: default_timeout_ms(),
            fallback: FallbackPolicy::default(),
            fallback_seed: None,
            oracle: OracleBackend::default(),
            history_path: None,
        }
    }
}

impl ArbiterConfig {
    /// Loads configuration from TOML file.
    #[instrument(skip(path), fields(path = %path.as_ref().display()))]
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        debug!("Loading config from file");
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::new(format!("Failed to read config file: {}", e)))?;
        Self::from_toml_str(&content)
    }

    /// Parses configuration from TOML text.
    #[instrument(skip(content))]
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)
            .map_err(|e| ConfigError::new(format!("Failed to parse config: {}", e)))?;
        if config.oracle_timeout_ms == 0 {
            return Err(ConfigError::new("oracle_timeout_ms must be positive".to_string()));
        }
        info!(oracle = ?config.oracle, fallback = %config.fallback, "Config loaded successfully");
        Ok(config)
    }

    /// Overrides the human's side.
    pub fn with_human_side(mut self, side: Side) -> Self {
        self.human_side = side;
        self
    }

    /// Oracle timeout as a duration.
    pub fn oracle_timeout(&self) -> Duration {
        Duration::from_millis(self.oracle_timeout_ms)
    }

    /// Instantiates the configured oracle backend.
    ///
    /// The LLM backend reads its API key from the provider's environment
    /// variable.
    #[instrument(skip(self), fields(oracle = ?self.oracle))]
    pub fn build_oracle(&self) -> Result<Arc<dyn MoveOracle>, ConfigError> {
        let oracle: Arc<dyn MoveOracle> = match &self.oracle {
            OracleBackend::Offline => Arc::new(OfflineOracle),
            OracleBackend::Http { url } => Arc::new(HttpOracle::new(url)),
            OracleBackend::Llm {
                provider,
                model,
                max_tokens,
                base_url,
            } => {
                let api_key = std::env::var(provider.api_key_var()).map_err(|_| {
                    ConfigError::new(format!(
                        "{} environment variable not set",
                        provider.api_key_var()
                    ))
                })?;
                let mut llm = LlmConfig::new(*provider, api_key, model.clone(), *max_tokens);
                if let Some(base_url) = base_url {
                    llm = llm.with_base_url(base_url.clone());
                }
                Arc::new(LlmOracle::new(LlmClient::new(llm)))
            }
            OracleBackend::Engine {
                program,
                args,
                movetime_ms,
            } => Arc::new(EngineOracle::new(
                program.clone(),
                args.clone(),
                Duration::from_millis(*movetime_ms),
            )),
        };
        Ok(oracle)
    }

    /// Builds the bounded oracle client.
    pub fn build_client(&self) -> Result<OracleClient, ConfigError> {
        Ok(OracleClient::new(self.build_oracle()?, self.oracle_timeout()))
    }

    /// Builds the finished-game sink.
    pub fn build_sink(&self) -> Arc<dyn ResultSink> {
        match &self.history_path {
            Some(path) => Arc::new(JsonlResultSink::new(path.clone())),
            None => Arc::new(NullResultSink),
        }
    }
}

/// Configuration error.
#[derive(Debug, Clone, Display, Error)]
#[display("Config error: {} at {}:{}", message, file, line)]
pub struct ConfigError {
    /// Error message.
    pub message: String,
    /// Line number where error occurred.
    pub line: u32,
    /// Source file where error occurred.
    pub file: &'static str,
}

impl ConfigError {
    /// Creates a new configuration error.
    #[track_caller]
    #[instrument(skip(message))]
    pub fn new(message: String) -> Self {
        let loc = std::panic::Location::caller();
        Self {
            message,
            line: loc.line(),
            file: loc.file(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = ArbiterConfig::from_toml_str("").unwrap();
        assert_eq!(config, ArbiterConfig::default());
        assert_eq!(config.oracle_timeout(), Duration::from_secs(10));
        assert_eq!(*config.oracle(), OracleBackend::Offline);
    }

    #[test]
    fn test_tagged_backends() {
        let config = ArbiterConfig::from_toml_str(
            r#"
            human_side = "second"
            fallback = "greedy"
            fallback_seed = 9

            [oracle]
            kind = "engine"
            program = "stockfish"
            "#,
        )
        .unwrap();
        assert_eq!(*config.human_side(), Side::Second);
        assert_eq!(*config.fallback(), FallbackPolicy::Greedy);
        assert_eq!(
            *config.oracle(),
            OracleBackend::Engine {
                program: "stockfish".into(),
                args: vec![],
                movetime_ms: 500,
            }
        );

        let http = ArbiterConfig::from_toml_str(
            "[oracle]\nkind = \"http\"\nurl = \"http://localhost:9000/move\"\n",
        )
        .unwrap();
        assert_eq!(http.build_oracle().unwrap().name(), "http");
    }

    #[test]
    fn test_rejects_zero_timeout() {
        let result = ArbiterConfig::from_toml_str("oracle_timeout_ms = 0");
        assert!(result.is_err());
    }

    #[test]
    fn test_rejects_unknown_backend() {
        let err = ArbiterConfig::from_toml_str("[oracle]\nkind = \"telepathy\"\n").unwrap_err();
        assert!(err.message.contains("Failed to parse config"));
    }
}
