//! HTTP adapter for the embedded-preview availability check.

use std::time::Duration;

use crate::domain::errors::EmbedError;
use crate::domain::ports::EmbedProbePort;

/// `EmbedProbePort` adapter over `reqwest`.
#[derive(Debug, Clone)]
pub struct HttpEmbedChecker {
    client: reqwest::Client,
}

impl HttpEmbedChecker {
    /// Creates a checker with a transport-level timeout.
    ///
    /// # Errors
    /// Returns error if the HTTP client cannot be built.
    pub fn new(timeout: Duration) -> Result<Self, EmbedError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| EmbedError::Unavailable(format!("failed to create HTTP client: {e}")))?;
        Ok(Self { client })
    }
}

#[async_trait::async_trait]
impl EmbedProbePort for HttpEmbedChecker {
    async fn check(&self, preview_url: &str) -> Result<(), EmbedError> {
        tracing::debug!(url = preview_url, "Checking embedded preview");

        let response = self
            .client
            .get(preview_url)
            .send()
            .await
            .map_err(|e| EmbedError::Unavailable(format!("request failed: {e}")))?;

        if response.status().is_success() {
            Ok(())
        } else {
            Err(EmbedError::Unavailable(format!(
                "http status {}",
                response.status()
            )))
        }
    }
}
