//! Candidate resolution strategies.

/// Delivery mechanism behind a candidate URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProbeMethod {
    /// Fetch the URL exactly as given.
    DirectFetch,
    /// The provider's thumbnail service (most permissive under typical
    /// sharing permissions).
    Thumbnail,
    /// The provider's user-content mirror host.
    UserContentMirror,
    /// The provider's plain export endpoint.
    Export,
}

impl std::fmt::Display for ProbeMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::DirectFetch => write!(f, "direct"),
            Self::Thumbnail => write!(f, "thumbnail"),
            Self::UserContentMirror => write!(f, "usercontent"),
            Self::Export => write!(f, "export"),
        }
    }
}

/// One entry of the ordered probe list: a concrete URL plus the delivery
/// mechanism it represents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateStrategy {
    /// The URL to probe.
    pub url: String,
    /// The delivery mechanism this URL uses.
    pub method: ProbeMethod,
}

impl CandidateStrategy {
    /// Creates a new candidate.
    #[must_use]
    pub fn new(url: impl Into<String>, method: ProbeMethod) -> Self {
        Self {
            url: url.into(),
            method,
        }
    }

    /// Creates the single direct-fetch candidate used for generic
    /// references.
    #[must_use]
    pub fn direct(url: impl Into<String>) -> Self {
        Self::new(url, ProbeMethod::DirectFetch)
    }
}

impl std::fmt::Display for CandidateStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.url, self.method)
    }
}
