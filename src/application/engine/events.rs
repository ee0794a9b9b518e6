//! Pipeline diagnostics.
//!
//! Every classification decision, probe attempt, materialization attempt,
//! and handle transition is reported through [`PipelineObserver`]. The hook
//! is operational visibility only; nothing in the functional contract
//! depends on it.

use std::sync::Arc;

use crate::domain::entities::{HandleId, ProbeMethod, ProviderKind};

/// One diagnostic event emitted by the resolution pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PipelineEvent {
    /// The reference was classified.
    Classified {
        /// Provider kind, or `None` for empty input.
        kind: Option<ProviderKind>,
        /// Extracted resource id, if any.
        resource_id: Option<String>,
    },
    /// A probe of the candidate at `index` started.
    ProbeStarted {
        /// Candidate index.
        index: usize,
        /// Delivery mechanism being tried.
        method: ProbeMethod,
        /// Candidate URL.
        url: String,
    },
    /// The probe at `index` failed and the engine will advance.
    ProbeFailed {
        /// Candidate index.
        index: usize,
        /// Decode error or timeout text.
        reason: String,
    },
    /// Out-of-band byte retrieval started for a candidate URL.
    MaterializationStarted {
        /// Candidate URL being fetched.
        url: String,
    },
    /// Byte retrieval (or the later decode of the bytes) failed.
    MaterializationFailed {
        /// Failure text.
        reason: String,
    },
    /// A resource handle was created around retrieved bytes.
    HandleCreated {
        /// Id of the new handle.
        handle_id: HandleId,
        /// Size of the retrieved body.
        len: usize,
    },
    /// A resource handle was revoked.
    HandleRevoked {
        /// Id of the revoked handle.
        handle_id: HandleId,
    },
    /// A candidate produced a displayable image.
    Resolved {
        /// Winning candidate index.
        index: usize,
        /// Delivery mechanism that succeeded.
        method: ProbeMethod,
    },
    /// All candidates failed; the embedded preview is being attempted.
    EmbedStarted {
        /// Provider preview URL.
        preview_url: String,
    },
    /// The embedded preview loaded.
    EmbedResolved,
    /// The embedded preview failed; the placeholder is next.
    EmbedFailed {
        /// Load failure text.
        reason: String,
    },
    /// The pipeline ended in the placeholder state.
    FallingBack {
        /// Why no other display was possible.
        reason: String,
    },
}

impl std::fmt::Display for PipelineEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Classified { kind, resource_id } => match kind {
                Some(kind) => write!(
                    f,
                    "classified as {kind} (id: {})",
                    resource_id.as_deref().unwrap_or("none")
                ),
                None => write!(f, "classified as empty"),
            },
            Self::ProbeStarted { index, method, url } => {
                write!(f, "probe {index} ({method}) -> {url}")
            }
            Self::ProbeFailed { index, reason } => write!(f, "probe {index} failed: {reason}"),
            Self::MaterializationStarted { url } => write!(f, "materializing {url}"),
            Self::MaterializationFailed { reason } => {
                write!(f, "materialization failed: {reason}")
            }
            Self::HandleCreated { handle_id, len } => {
                write!(f, "handle {handle_id} created ({len} bytes)")
            }
            Self::HandleRevoked { handle_id } => write!(f, "handle {handle_id} revoked"),
            Self::Resolved { index, method } => write!(f, "resolved at {index} via {method}"),
            Self::EmbedStarted { preview_url } => write!(f, "embedding {preview_url}"),
            Self::EmbedResolved => write!(f, "embed resolved"),
            Self::EmbedFailed { reason } => write!(f, "embed failed: {reason}"),
            Self::FallingBack { reason } => write!(f, "falling back: {reason}"),
        }
    }
}

/// Injectable observability hook for pipeline diagnostics.
pub trait PipelineObserver: Send + Sync {
    /// Called once per diagnostic event, in emission order.
    fn on_event(&self, event: &PipelineEvent);
}

/// Default observer forwarding events to `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingObserver;

impl PipelineObserver for TracingObserver {
    fn on_event(&self, event: &PipelineEvent) {
        match event {
            PipelineEvent::ProbeFailed { .. }
            | PipelineEvent::MaterializationFailed { .. }
            | PipelineEvent::EmbedFailed { .. } => {
                tracing::warn!(event = %event, "Pipeline event");
            }
            PipelineEvent::FallingBack { .. } => {
                tracing::info!(event = %event, "Pipeline event");
            }
            _ => tracing::debug!(event = %event, "Pipeline event"),
        }
    }
}

/// Shared observer handle.
pub type ObserverRef = Arc<dyn PipelineObserver>;
