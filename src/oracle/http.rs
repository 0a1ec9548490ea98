//! Remote move service reached over JSON/HTTP.

use super::wire::{OracleRequestPayload, OracleResponsePayload, OracleStatus};
use super::{MoveOracle, OracleError, OracleErrorKind, OracleRequest};
use tracing::{debug, info, instrument, warn};

/// Oracle backed by a remote move-selection service.
#[derive(Debug, Clone)]
pub struct HttpOracle {
    url: String,
    client: reqwest::Client,
}

impl HttpOracle {
    /// Creates an oracle posting requests to `url`.
    #[instrument(skip_all, fields(url = %url.as_ref()))]
    pub fn new(url: impl AsRef<str>) -> Self {
        info!("Creating HTTP oracle");
        Self {
            url: url.as_ref().to_string(),
            client: reqwest::Client::new(),
        }
    }

    /// Returns the service URL.
    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait::async_trait]
impl MoveOracle for HttpOracle {
    fn name(&self) -> &str {
        "http"
    }

    #[instrument(skip_all, fields(url = %self.url))]
    async fn suggest(&self, request: &OracleRequest) -> Result<Option<String>, OracleError> {
        let payload = OracleRequestPayload::from(request);
        debug!(
            legal_moves = payload.legal_moves.len(),
            "Posting oracle request"
        );

        let response = self.client.post(&self.url).json(&payload).send().await?;

        let status = response.status();
        if !status.is_success() {
            warn!(%status, "Move service returned HTTP error");
            return Err(OracleError::transport(format!("HTTP {}", status)));
        }

        let text = response.text().await?;
        let body: OracleResponsePayload = serde_json::from_str(&text)
            .map_err(|e| OracleError::malformed(format!("{}: {}", e, text)))?;

        debug!(status = ?body.status, suggestion = ?body.mv, "Move service answered");
        match body.status {
            OracleStatus::Success => body
                .mv
                .map(Some)
                .ok_or_else(|| OracleError::malformed("success without a move")),
            OracleStatus::NoLegalMoves | OracleStatus::InvalidMoveSuggested => Ok(None),
            OracleStatus::Error => Err(OracleError::new(OracleErrorKind::Service(
                body.mv.unwrap_or_else(|| "unspecified".to_string()),
            ))),
        }
    }
}
