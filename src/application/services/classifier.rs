//! Reference classification.
//!
//! Decides whether a raw reference string is a plain direct-fetchable URL or
//! a document-share provider link, and extracts the canonical file id from
//! the provider's known link shapes.

use std::sync::LazyLock;

use regex::Regex;

use crate::domain::entities::{Classification, ResourceId};

/// Host substrings that mark a reference as belonging to the provider.
const PROVIDER_DOMAINS: [&str; 3] = [
    "drive.google.com",
    "drive.usercontent.google.com",
    "docs.google.com",
];

/// Stateless classifier for raw image references.
pub struct ReferenceClassifier;

impl ReferenceClassifier {
    /// Classifies a raw reference string.
    ///
    /// Extractors are tried in fixed priority order: the file-view path
    /// shape, the user-content mirror shape, then the id query parameter.
    /// A reference on a provider domain that matches none of them is still
    /// reported as a provider reference with an absent id, never demoted to
    /// generic.
    #[must_use]
    pub fn classify(reference: &str) -> Classification {
        // "/file/d/{id}/view" share links
        static FILE_VIEW_RE: LazyLock<Regex> =
            LazyLock::new(|| Regex::new(r"/file/d/([A-Za-z0-9_-]+)").unwrap());

        // drive.usercontent.google.com/download?id={id}
        static USERCONTENT_RE: LazyLock<Regex> = LazyLock::new(|| {
            Regex::new(r"drive\.usercontent\.google\.com/[^?\s]*\?(?:[^&\s#]*&)*id=([A-Za-z0-9_-]+)")
                .unwrap()
        });

        // "open?id={id}" / "uc?export=view&id={id}" query forms
        static ID_PARAM_RE: LazyLock<Regex> =
            LazyLock::new(|| Regex::new(r"[?&]id=([A-Za-z0-9_-]+)").unwrap());

        let reference = reference.trim();
        if reference.is_empty() {
            return Classification::Empty;
        }

        if !Self::is_provider_reference(reference) {
            return Classification::Generic {
                url: reference.to_string(),
            };
        }

        let resource_id = [&*FILE_VIEW_RE, &*USERCONTENT_RE, &*ID_PARAM_RE]
            .iter()
            .find_map(|re| re.captures(reference))
            .and_then(|cap| cap.get(1))
            .map(|m| ResourceId::new(m.as_str()));

        Classification::DocumentShare { resource_id }
    }

    /// Returns true if the reference carries a provider domain substring.
    #[must_use]
    pub fn is_provider_reference(reference: &str) -> bool {
        PROVIDER_DOMAINS.iter().any(|d| reference.contains(d))
    }
}
