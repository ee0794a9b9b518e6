//! Pixprobe - resilient remote image resolution.
//!
//! Resolves an arbitrary, untrusted image reference to a displayable state:
//! plain URLs are probed directly, while document-share provider links are
//! expanded into an ordered list of delivery strategies that are probed
//! sequentially with timeouts, materialized locally when direct linking is
//! blocked, and degraded to an interaction-blocked embedded preview before
//! falling back to a placeholder. The pipeline never surfaces an error to
//! its caller; the worst outcome is the placeholder render.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

/// Application layer containing the resolution engine and services.
pub mod application;
/// Domain layer containing entities, errors, and port definitions.
pub mod domain;
/// Infrastructure layer containing adapters for external services.
pub mod infrastructure;
/// Presentation layer containing the shell widget and run orchestration.
pub mod presentation;

/// Current version of the crate.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name.
pub const NAME: &str = "pixprobe";
