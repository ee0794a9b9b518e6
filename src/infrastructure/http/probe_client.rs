//! HTTP image-decode probe adapter.

use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;

use crate::domain::errors::ProbeError;
use crate::domain::ports::ImageProbePort;

/// Decoded images wider than this are downscaled so a hostile reference
/// cannot balloon memory.
pub const MAX_DECODE_WIDTH: u32 = 1600;

/// Height paired with [`MAX_DECODE_WIDTH`] for the downscale bound.
pub const MAX_DECODE_HEIGHT: u32 = 1200;

/// `ImageProbePort` adapter over `reqwest` and the `image` decoder.
#[derive(Debug, Clone)]
pub struct HttpProbeClient {
    client: reqwest::Client,
}

impl HttpProbeClient {
    /// Creates a probe client with a transport-level timeout.
    ///
    /// # Errors
    /// Returns error if the HTTP client cannot be built.
    pub fn new(timeout: Duration) -> Result<Self, ProbeError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ProbeError::Network(format!("failed to create HTTP client: {e}")))?;
        Ok(Self { client })
    }

    async fn download(&self, url: &str) -> Result<Bytes, ProbeError> {
        let response = self
            .client
            .get(url)
            .header(reqwest::header::ACCEPT, "image/*")
            .send()
            .await
            .map_err(|e| ProbeError::Network(format!("request failed: {e}")))?;

        if !response.status().is_success() {
            return Err(ProbeError::Status(response.status().as_u16()));
        }

        response
            .bytes()
            .await
            .map_err(|e| ProbeError::Network(format!("failed to read body: {e}")))
    }
}

#[async_trait::async_trait]
impl ImageProbePort for HttpProbeClient {
    async fn probe(&self, url: &str) -> Result<Arc<image::DynamicImage>, ProbeError> {
        tracing::debug!(url, "Probing image URL");
        let bytes = self.download(url).await?;
        self.decode(bytes).await
    }

    async fn decode(&self, bytes: Bytes) -> Result<Arc<image::DynamicImage>, ProbeError> {
        let decoded = tokio::task::spawn_blocking(move || {
            let img = image::load_from_memory(&bytes)
                .map_err(|e| ProbeError::Decode(format!("failed to decode image: {e}")))?;

            if img.width() > MAX_DECODE_WIDTH {
                Ok(img.resize(
                    MAX_DECODE_WIDTH,
                    MAX_DECODE_HEIGHT,
                    image::imageops::FilterType::Lanczos3,
                ))
            } else {
                Ok(img)
            }
        })
        .await
        .map_err(|e| ProbeError::Decode(format!("decode task panicked: {e}")))??;

        Ok(Arc::new(decoded))
    }
}
