//! Application layer with the resolution engine and its services.

/// The ordered-fallback resolution engine.
pub mod engine;
/// Classification, strategy generation, and materialization services.
pub mod services;

pub use engine::events::{ObserverRef, PipelineEvent, PipelineObserver, TracingObserver};
pub use engine::{EngineConfig, PipelineOutcome, ResolutionEngine};
pub use services::{ReferenceClassifier, StrategyGenerator};
