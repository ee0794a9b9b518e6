//! Local materialization of candidate bytes.
//!
//! Retrieves the raw bytes behind a candidate URL out-of-band and wraps
//! them in a locally-owned [`ResourceHandle`], bypassing the embedding and
//! cross-origin restrictions that block direct image loading. Exactly one
//! attempt is made per candidate: a permissive fetch, falling back once to
//! an opaque fetch when the permissive request is rejected. Failures
//! propagate to the engine, which advances to normal probing.

use std::sync::Arc;

use crate::application::engine::events::{ObserverRef, PipelineEvent};
use crate::domain::entities::{HandleId, ResourceHandle};
use crate::domain::errors::{FetchError, ResolveError};
use crate::domain::ports::{ByteFetchPort, FetchMode, ImageProbePort};

/// A successfully materialized candidate: the owning handle plus the image
/// decoded from its bytes.
#[derive(Debug)]
pub struct Materialized {
    /// Handle owning the retrieved bytes.
    pub handle: ResourceHandle,
    /// Image decoded from those bytes.
    pub image: Arc<image::DynamicImage>,
}

/// The Local Materialization Helper.
pub struct Materializer {
    fetcher: Arc<dyn ByteFetchPort>,
    probe: Arc<dyn ImageProbePort>,
    observer: ObserverRef,
}

impl Materializer {
    /// Creates a helper over the given ports.
    #[must_use]
    pub fn new(
        fetcher: Arc<dyn ByteFetchPort>,
        probe: Arc<dyn ImageProbePort>,
        observer: ObserverRef,
    ) -> Self {
        Self {
            fetcher,
            probe,
            observer,
        }
    }

    /// Attempts to materialize one candidate URL.
    ///
    /// An opaque (possibly zero-length) response still produces a handle;
    /// if its bytes then fail to decode, the handle is revoked and the
    /// failure is reported as a soft failure of the current candidate.
    ///
    /// # Errors
    /// Returns `ResolveError::MaterializationFailure` when retrieval is
    /// rejected in both modes or the retrieved bytes are not a displayable
    /// image.
    pub async fn materialize(&self, url: &str) -> Result<Materialized, ResolveError> {
        self.observer.on_event(&PipelineEvent::MaterializationStarted {
            url: url.to_string(),
        });

        let bytes = match self.fetcher.fetch(url, FetchMode::Permissive).await {
            Ok(bytes) => bytes,
            Err(FetchError::Rejected(reason)) => {
                tracing::debug!(url, reason, "Permissive fetch rejected, retrying opaque");
                match self.fetcher.fetch(url, FetchMode::Opaque).await {
                    Ok(bytes) => bytes,
                    Err(e) => return Err(self.fail(e.to_string())),
                }
            }
            Err(e) => return Err(self.fail(e.to_string())),
        };

        let mut handle = ResourceHandle::new(HandleId::from_url(url), bytes.clone());
        self.observer.on_event(&PipelineEvent::HandleCreated {
            handle_id: handle.id().clone(),
            len: bytes.len(),
        });

        match self.probe.decode(bytes).await {
            Ok(image) => Ok(Materialized { handle, image }),
            Err(e) => {
                let handle_id = handle.id().clone();
                handle.revoke();
                self.observer
                    .on_event(&PipelineEvent::HandleRevoked { handle_id });
                Err(self.fail(format!("retrieved bytes not displayable: {e}")))
            }
        }
    }

    fn fail(&self, reason: String) -> ResolveError {
        self.observer.on_event(&PipelineEvent::MaterializationFailed {
            reason: reason.clone(),
        });
        ResolveError::materialization(reason)
    }
}
