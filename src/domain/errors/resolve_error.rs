//! Resolution error taxonomy.
//!
//! None of these errors ever escape the pipeline: everything up to and
//! including an embed failure is recovered internally, and the worst
//! user-visible outcome is the placeholder render. The variants exist for
//! diagnostics and for deciding which recovery step comes next.

use thiserror::Error;

/// Failures that can occur while resolving an image reference.
#[derive(Debug, Clone, Error)]
pub enum ResolveError {
    /// Empty or null input; nothing to classify.
    #[error("unclassifiable reference: empty input")]
    UnclassifiableReference,

    /// The provider domain matched but no known link shape yielded an id.
    #[error("ambiguous provider reference: no extractable resource id")]
    AmbiguousProviderReference,

    /// One candidate failed to decode or timed out.
    #[error("probe failure at candidate {index}: {reason}")]
    ProbeFailure {
        /// Index of the failed candidate.
        index: usize,
        /// Decode error text, or a timeout note.
        reason: String,
    },

    /// Out-of-band byte retrieval for one candidate failed.
    #[error("materialization failure: {reason}")]
    MaterializationFailure {
        /// Transport or platform rejection text.
        reason: String,
    },

    /// The embedded preview itself failed to load.
    #[error("embed failure: {reason}")]
    EmbedFailure {
        /// Load error text.
        reason: String,
    },
}

impl ResolveError {
    /// Creates a probe failure for the given candidate index.
    #[must_use]
    pub fn probe(index: usize, reason: impl Into<String>) -> Self {
        Self::ProbeFailure {
            index,
            reason: reason.into(),
        }
    }

    /// Creates a materialization failure.
    #[must_use]
    pub fn materialization(reason: impl Into<String>) -> Self {
        Self::MaterializationFailure {
            reason: reason.into(),
        }
    }

    /// Creates an embed failure.
    #[must_use]
    pub fn embed(reason: impl Into<String>) -> Self {
        Self::EmbedFailure {
            reason: reason.into(),
        }
    }

    /// Returns true when the engine recovers by advancing to the next
    /// candidate rather than falling back.
    #[must_use]
    pub const fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::ProbeFailure { .. } | Self::MaterializationFailure { .. }
        )
    }
}

/// Failure of one asynchronous decode probe.
#[derive(Debug, Clone, Error)]
pub enum ProbeError {
    /// The request could not be sent or the transport failed.
    #[error("network error: {0}")]
    Network(String),
    /// The server answered with a non-success status.
    #[error("http status {0}")]
    Status(u16),
    /// The body could not be decoded as an image.
    #[error("decode error: {0}")]
    Decode(String),
}

/// Failure of one out-of-band byte retrieval.
#[derive(Debug, Clone, Error)]
pub enum FetchError {
    /// The platform rejected the request outright.
    #[error("request rejected: {0}")]
    Rejected(String),
    /// The transport failed mid-flight.
    #[error("network error: {0}")]
    Network(String),
}

/// Failure of the embedded preview load.
#[derive(Debug, Clone, Error)]
pub enum EmbedError {
    /// The preview endpoint is unreachable or refused.
    #[error("preview unavailable: {0}")]
    Unavailable(String),
}
