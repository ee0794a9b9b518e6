//! Domain entity definitions.

mod handle;
mod reference;
mod resolution;
mod strategy;

pub use handle::{HandleSlot, ResourceHandle};
pub use reference::{Classification, ProviderKind, ResourceId};
pub use resolution::{Generation, HandleId, ResolutionState, ResolvedVia};
pub use strategy::{CandidateStrategy, ProbeMethod};
