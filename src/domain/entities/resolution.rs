//! Resolution state machine types.

use super::strategy::ProbeMethod;

/// Identifier of a locally materialized resource handle.
/// Derived from a hash of the candidate URL that produced the bytes.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct HandleId(pub String);

impl HandleId {
    /// Creates a `HandleId` from a URL by hashing it.
    #[must_use]
    pub fn from_url(url: &str) -> Self {
        use sha2::{Digest, Sha256};
        let mut hasher = Sha256::new();
        hasher.update(url.as_bytes());
        let result = hasher.finalize();
        Self(hex::encode(&result[..16]))
    }

    /// Returns the inner string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for HandleId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// How a resolved image is being displayed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolvedVia {
    /// Directly from the remote URL that survived probing.
    Remote {
        /// The winning candidate URL.
        url: String,
        /// The delivery mechanism that succeeded.
        method: ProbeMethod,
    },
    /// From locally materialized bytes owned by the shell instance.
    Materialized {
        /// Id of the handle holding the bytes.
        handle_id: HandleId,
    },
}

impl std::fmt::Display for ResolvedVia {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Remote { url, method } => write!(f, "remote {method} {url}"),
            Self::Materialized { handle_id } => write!(f, "materialized {handle_id}"),
        }
    }
}

/// Current position of one shell instance in the pipeline.
///
/// Exactly one state is active per instance; transitions only move forward,
/// except that a reference change resets the instance to `Idle`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ResolutionState {
    /// No reference set yet.
    #[default]
    Idle,
    /// The reference is being classified.
    Classifying,
    /// Candidate at the given index is being probed.
    Probing(usize),
    /// An image is displayed.
    Resolved(ResolvedVia),
    /// All candidates failed; the embedded preview is loading.
    Embedding,
    /// The embedded preview is displayed behind the interaction overlay.
    EmbeddedResolved {
        /// The provider preview URL being embedded.
        preview_url: String,
    },
    /// The embedded preview failed to load.
    EmbeddedFailed,
    /// Terminal placeholder state.
    Fallback,
}

impl ResolutionState {
    /// Returns true while the pipeline is still working.
    #[must_use]
    pub const fn is_loading(&self) -> bool {
        matches!(
            self,
            Self::Idle | Self::Classifying | Self::Probing(_) | Self::Embedding
        )
    }

    /// Returns true once a direct image is displayed.
    #[must_use]
    pub const fn is_resolved(&self) -> bool {
        matches!(self, Self::Resolved(_))
    }

    /// Returns true while the embedded viewer is displayed.
    #[must_use]
    pub const fn is_embedded(&self) -> bool {
        matches!(self, Self::EmbeddedResolved { .. })
    }

    /// Returns true in any state that no longer changes on its own.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::Resolved(_) | Self::EmbeddedResolved { .. } | Self::Fallback
        )
    }
}

impl std::fmt::Display for ResolutionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Idle => write!(f, "idle"),
            Self::Classifying => write!(f, "classifying"),
            Self::Probing(i) => write!(f, "probing[{i}]"),
            Self::Resolved(via) => write!(f, "resolved ({via})"),
            Self::Embedding => write!(f, "embedding"),
            Self::EmbeddedResolved { preview_url } => write!(f, "embedded ({preview_url})"),
            Self::EmbeddedFailed => write!(f, "embed-failed"),
            Self::Fallback => write!(f, "fallback"),
        }
    }
}

/// Monotonic counter tagging one pipeline run per shell instance.
///
/// Every reference change bumps the generation; completions carrying a stale
/// generation are discarded instead of applied.
pub type Generation = u64;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_handle_id_consistency() {
        let a = HandleId::from_url("https://example.com/a.png");
        let b = HandleId::from_url("https://example.com/a.png");
        assert_eq!(a, b);
        assert_eq!(a.as_str().len(), 32);
    }

    #[test]
    fn test_handle_id_distinct() {
        let a = HandleId::from_url("https://example.com/a.png");
        let b = HandleId::from_url("https://example.com/b.png");
        assert_ne!(a, b);
    }

    #[test]
    fn test_state_predicates() {
        assert!(ResolutionState::Idle.is_loading());
        assert!(ResolutionState::Probing(2).is_loading());
        assert!(ResolutionState::Embedding.is_loading());
        assert!(!ResolutionState::Fallback.is_loading());

        let resolved = ResolutionState::Resolved(ResolvedVia::Remote {
            url: "https://example.com/a.png".into(),
            method: ProbeMethod::DirectFetch,
        });
        assert!(resolved.is_resolved());
        assert!(resolved.is_terminal());

        let embedded = ResolutionState::EmbeddedResolved {
            preview_url: "https://host/preview".into(),
        };
        assert!(embedded.is_embedded());
        assert!(embedded.is_terminal());

        assert!(ResolutionState::Fallback.is_terminal());
        assert!(!ResolutionState::Embedding.is_terminal());
    }
}
