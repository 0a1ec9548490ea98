//! Oracle used when no backend is configured.

use super::{MoveOracle, OracleError, OracleRequest};

/// Oracle that always fails, so every automated move comes from the fallback.
#[derive(Debug, Clone, Copy, Default)]
pub struct OfflineOracle;

#[async_trait::async_trait]
impl MoveOracle for OfflineOracle {
    fn name(&self) -> &str {
        "offline"
    }

    async fn suggest(&self, _request: &OracleRequest) -> Result<Option<String>, OracleError> {
        Err(OracleError::transport("no oracle configured"))
    }
}
