//! HTTP byte-retrieval adapter for materialization.

use std::time::Duration;

use bytes::Bytes;

use crate::domain::errors::FetchError;
use crate::domain::ports::{ByteFetchPort, FetchMode};

/// `ByteFetchPort` adapter over `reqwest`.
///
/// The permissive shape demands a readable success response; the opaque
/// shape mirrors a no-cors fetch and accepts whatever comes back, including
/// an empty body, leaving the later decode step to judge usability.
#[derive(Debug, Clone)]
pub struct HttpByteFetcher {
    client: reqwest::Client,
}

impl HttpByteFetcher {
    /// Creates a fetcher with a transport-level timeout.
    ///
    /// # Errors
    /// Returns error if the HTTP client cannot be built.
    pub fn new(timeout: Duration) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| FetchError::Network(format!("failed to create HTTP client: {e}")))?;
        Ok(Self { client })
    }
}

#[async_trait::async_trait]
impl ByteFetchPort for HttpByteFetcher {
    async fn fetch(&self, url: &str, mode: FetchMode) -> Result<Bytes, FetchError> {
        tracing::debug!(url, %mode, "Fetching candidate bytes");

        let response = self
            .client
            .get(url)
            .header(reqwest::header::ACCEPT, "image/*,*/*;q=0.8")
            .send()
            .await
            .map_err(|e| FetchError::Network(format!("request failed: {e}")))?;

        match mode {
            FetchMode::Permissive => {
                if !response.status().is_success() {
                    return Err(FetchError::Rejected(format!(
                        "http status {}",
                        response.status()
                    )));
                }
                response
                    .bytes()
                    .await
                    .map_err(|e| FetchError::Network(format!("failed to read body: {e}")))
            }
            // Opaque mode swallows the status; an unusable body surfaces
            // later as a decode failure of the current candidate.
            FetchMode::Opaque => Ok(response.bytes().await.unwrap_or_default()),
        }
    }
}
