//! Application services.

mod classifier;
mod materializer;
mod strategies;

pub use classifier::ReferenceClassifier;
pub use materializer::{Materialized, Materializer};
pub use strategies::{CANDIDATES_PER_ID, StrategyGenerator, THUMBNAIL_WIDTH};
