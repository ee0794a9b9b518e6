//! Port definitions for the resolution pipeline.
//!
//! The engine only ever talks to the network through these traits, which
//! keeps every probe sequence scriptable in tests.

use std::sync::Arc;

use bytes::Bytes;

use crate::domain::errors::{EmbedError, FetchError, ProbeError};

/// Request shape for out-of-band byte retrieval.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchMode {
    /// Cross-origin-permissive: the response must be readable and carry a
    /// success status.
    Permissive,
    /// Cross-origin-opaque: any non-error transport outcome is accepted,
    /// and the body may be empty.
    Opaque,
}

impl std::fmt::Display for FetchMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Permissive => write!(f, "permissive"),
            Self::Opaque => write!(f, "opaque"),
        }
    }
}

/// Port for asynchronous image-decode probes.
/// Implementations must be thread-safe.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait ImageProbePort: Send + Sync {
    /// Fetches the URL and decodes the body as an image.
    async fn probe(&self, url: &str) -> Result<Arc<image::DynamicImage>, ProbeError>;

    /// Decodes already-retrieved bytes as an image.
    async fn decode(&self, bytes: Bytes) -> Result<Arc<image::DynamicImage>, ProbeError>;
}

/// Port for out-of-band byte retrieval used by materialization.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait ByteFetchPort: Send + Sync {
    /// Retrieves the raw bytes behind a URL in the given mode.
    async fn fetch(&self, url: &str, mode: FetchMode) -> Result<Bytes, FetchError>;
}

/// Port for checking whether the provider's embedded preview loads.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait EmbedProbePort: Send + Sync {
    /// Loads the preview URL; `Ok` means the viewer would display.
    async fn check(&self, preview_url: &str) -> Result<(), EmbedError>;
}
