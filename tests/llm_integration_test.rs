//! Integration test for the LLM-backed oracle.

use std::sync::Arc;
use std::time::Duration;
use strictly_chess::{
    LlmClient, LlmConfig, LlmOracle, LlmProvider, OracleClient, OracleRequest, OracleResponse,
    Position,
};
use tracing::instrument;

async fn ask(provider: LlmProvider, model: &str) -> OracleResponse {
    dotenvy::dotenv().ok();

    let api_key = std::env::var(provider.api_key_var())
        .unwrap_or_else(|_| panic!("{} not set", provider.api_key_var()));
    let config = LlmConfig::new(provider, api_key, model.to_string(), 16);
    let oracle = LlmOracle::new(LlmClient::new(config));
    let client = OracleClient::new(Arc::new(oracle), Duration::from_secs(30));

    client
        .request_move(&OracleRequest::for_position(&Position::new()))
        .await
}

#[tokio::test]
#[cfg_attr(not(feature = "api"), ignore)]
#[instrument]
async fn test_anthropic_suggests_opening_move() {
    let response = ask(LlmProvider::Anthropic, "claude-3-5-haiku-20241022").await;
    eprintln!("Response: {:?}", response);
    assert!(!matches!(response, OracleResponse::Failure(_)));
}

#[tokio::test]
#[cfg_attr(not(feature = "api"), ignore)]
#[instrument]
async fn test_openai_suggests_opening_move() {
    let response = ask(LlmProvider::OpenAI, "gpt-4o-mini").await;
    eprintln!("Response: {:?}", response);
    assert!(!matches!(response, OracleResponse::Failure(_)));
}
