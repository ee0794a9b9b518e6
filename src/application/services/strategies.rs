//! Candidate strategy generation.
//!
//! Expands a provider resource id into the fixed, ordered list of delivery
//! endpoints worth probing, ranked by observed reliability. The ordering is
//! policy, not protocol: it may be retuned, but it must stay deterministic
//! and total so that retries are reproducible.

use crate::domain::entities::{CandidateStrategy, ProbeMethod, ResourceId};

/// Width hint requested from the thumbnail service.
pub const THUMBNAIL_WIDTH: u32 = 1000;

/// Number of candidates generated per resource id.
pub const CANDIDATES_PER_ID: usize = 4;

/// Stateless generator of ordered candidate lists.
pub struct StrategyGenerator;

impl StrategyGenerator {
    /// Expands a resource id into the ordered candidate list.
    ///
    /// The thumbnail service goes first because it answers under the widest
    /// range of sharing permissions; the user-content mirror and the static
    /// content proxy follow; the plain export endpoint goes last because it
    /// interposes a confirmation page for large files.
    #[must_use]
    pub fn candidates_for(id: &ResourceId) -> Vec<CandidateStrategy> {
        vec![
            CandidateStrategy::new(
                format!(
                    "https://drive.google.com/thumbnail?id={id}&sz=w{THUMBNAIL_WIDTH}"
                ),
                ProbeMethod::Thumbnail,
            ),
            CandidateStrategy::new(
                format!("https://drive.usercontent.google.com/download?id={id}&export=view"),
                ProbeMethod::UserContentMirror,
            ),
            CandidateStrategy::new(
                format!("https://lh3.googleusercontent.com/d/{id}"),
                ProbeMethod::DirectFetch,
            ),
            CandidateStrategy::new(
                format!("https://drive.google.com/uc?export=view&id={id}"),
                ProbeMethod::Export,
            ),
        ]
    }

    /// Builds the single candidate used for a generic reference.
    #[must_use]
    pub fn direct_candidate(url: &str) -> Vec<CandidateStrategy> {
        vec![CandidateStrategy::direct(url)]
    }

    /// Builds the provider's native embeddable preview URL for the
    /// embedding fallback. This is a viewer surface, not an image endpoint,
    /// so it is deliberately absent from the candidate list.
    #[must_use]
    pub fn embed_preview_url(id: &ResourceId) -> String {
        format!("https://drive.google.com/file/d/{id}/preview")
    }
}
