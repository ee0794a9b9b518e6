//! Domain types for image reference classification.

/// Canonical identifier extracted from a document-share provider link.
///
/// Provider file ids are URL-safe tokens; the classifier only accepts
/// `[A-Za-z0-9_-]` so the id can be substituted into endpoint templates
/// without escaping.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResourceId(String);

impl ResourceId {
    /// Creates a new `ResourceId` from any string-like input.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the inner string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ResourceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for ResourceId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// Which family of host a reference points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderKind {
    /// A plain direct-fetchable URL with no special handling.
    Generic,
    /// A known document-sharing provider serving files via share links.
    DocumentShare,
}

impl std::fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Generic => write!(f, "generic"),
            Self::DocumentShare => write!(f, "document-share"),
        }
    }
}

/// Outcome of classifying a raw image reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Classification {
    /// Empty or whitespace-only input; the pipeline goes straight to the
    /// placeholder without issuing any probe.
    Empty,
    /// A direct-fetchable URL, probed as-is.
    Generic {
        /// The original reference string.
        url: String,
    },
    /// A document-share provider reference. `resource_id` is `None` when the
    /// provider domain matched but no known link shape did; that is a
    /// diagnosable failure, never demoted to `Generic`.
    DocumentShare {
        /// The extracted file id, if any link shape matched.
        resource_id: Option<ResourceId>,
    },
}

impl Classification {
    /// Returns the provider kind, or `None` for empty input.
    #[must_use]
    pub const fn kind(&self) -> Option<ProviderKind> {
        match self {
            Self::Empty => None,
            Self::Generic { .. } => Some(ProviderKind::Generic),
            Self::DocumentShare { .. } => Some(ProviderKind::DocumentShare),
        }
    }

    /// Returns the extracted resource id, if any.
    #[must_use]
    pub const fn resource_id(&self) -> Option<&ResourceId> {
        match self {
            Self::DocumentShare {
                resource_id: Some(id),
            } => Some(id),
            _ => None,
        }
    }

    /// Returns true if this classification can produce no candidates and
    /// must render the placeholder immediately.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::Empty | Self::DocumentShare { resource_id: None }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resource_id_roundtrip() {
        let id = ResourceId::new("ABC123");
        assert_eq!(id.as_str(), "ABC123");
        assert_eq!(id.to_string(), "ABC123");
    }

    #[test]
    fn test_classification_kind() {
        assert_eq!(Classification::Empty.kind(), None);
        assert_eq!(
            Classification::Generic {
                url: "https://example.com/a.png".into()
            }
            .kind(),
            Some(ProviderKind::Generic)
        );
        assert_eq!(
            Classification::DocumentShare { resource_id: None }.kind(),
            Some(ProviderKind::DocumentShare)
        );
    }

    #[test]
    fn test_terminal_classifications() {
        assert!(Classification::Empty.is_terminal());
        assert!(Classification::DocumentShare { resource_id: None }.is_terminal());
        assert!(
            !Classification::DocumentShare {
                resource_id: Some(ResourceId::new("x"))
            }
            .is_terminal()
        );
        assert!(
            !Classification::Generic {
                url: "https://example.com/a.png".into()
            }
            .is_terminal()
        );
    }
}
