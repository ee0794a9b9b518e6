//! Resolution engine.
//!
//! Drives an ordered, strictly sequential probe loop over the candidate
//! URLs derived from one reference: classification, per-candidate decode
//! probes with a finite timeout, opportunistic local materialization for
//! the top-ranked provider candidate, the embedded-preview fallback once
//! probing is exhausted, and finally the placeholder. The engine never
//! returns an error; a broken image must never crash the surrounding UI,
//! so every failure is absorbed into the outcome's terminal state.

pub mod events;

use std::sync::Arc;
use std::time::Duration;

use tokio::time::timeout;

use crate::application::services::{Materializer, ReferenceClassifier, StrategyGenerator};
use crate::domain::entities::{
    CandidateStrategy, Classification, ResolutionState, ResolvedVia, ResourceHandle, ResourceId,
};
use crate::domain::errors::ResolveError;
use crate::domain::ports::{ByteFetchPort, EmbedProbePort, ImageProbePort};
use events::{ObserverRef, PipelineEvent, TracingObserver};

/// Engine tuning knobs. All bounds are finite and explicit.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Budget for one decode probe (network fetch plus decode).
    pub probe_timeout: Duration,
    /// Budget for the embedded-preview load check.
    pub embed_timeout: Duration,
    /// Attempt materialization before direct probing for the top-ranked
    /// provider candidate.
    pub materialize_first: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            probe_timeout: Duration::from_secs(8),
            embed_timeout: Duration::from_secs(8),
            materialize_first: true,
        }
    }
}

/// Terminal result of one pipeline run.
///
/// `state` is always terminal; `image` is present for `Resolved`, and
/// `handle` is present when the image came from materialized bytes. The
/// caller owns the handle from this point and must install it in its
/// lifecycle slot.
#[derive(Debug)]
pub struct PipelineOutcome {
    /// Terminal display state.
    pub state: ResolutionState,
    /// Decoded image for `Resolved` states.
    pub image: Option<Arc<image::DynamicImage>>,
    /// Handle owning materialized bytes, when applicable.
    pub handle: Option<ResourceHandle>,
    /// Index of the winning candidate for `Resolved` states. Lets a caller
    /// resume past this index if the display source later dies.
    pub resolved_index: Option<usize>,
}

impl PipelineOutcome {
    fn fallback() -> Self {
        Self {
            state: ResolutionState::Fallback,
            image: None,
            handle: None,
            resolved_index: None,
        }
    }
}

/// The ordered-fallback resolution engine.
///
/// One engine serves any number of shell instances; it holds no per-run
/// state, so concurrent `resolve` calls are independent.
pub struct ResolutionEngine {
    probe: Arc<dyn ImageProbePort>,
    embed: Arc<dyn EmbedProbePort>,
    materializer: Materializer,
    observer: ObserverRef,
    config: EngineConfig,
}

impl ResolutionEngine {
    /// Creates an engine over the given ports.
    #[must_use]
    pub fn new(
        probe: Arc<dyn ImageProbePort>,
        fetcher: Arc<dyn ByteFetchPort>,
        embed: Arc<dyn EmbedProbePort>,
        observer: ObserverRef,
        config: EngineConfig,
    ) -> Self {
        let materializer = Materializer::new(fetcher, probe.clone(), observer.clone());
        Self {
            probe,
            embed,
            materializer,
            observer,
            config,
        }
    }

    /// Creates an engine logging through `tracing` with default tuning.
    #[must_use]
    pub fn with_defaults(
        probe: Arc<dyn ImageProbePort>,
        fetcher: Arc<dyn ByteFetchPort>,
        embed: Arc<dyn EmbedProbePort>,
    ) -> Self {
        Self::new(
            probe,
            fetcher,
            embed,
            Arc::new(TracingObserver),
            EngineConfig::default(),
        )
    }

    /// Resolves one reference to a terminal display state.
    ///
    /// Infallible by design: classification dead-ends, probe failures,
    /// materialization failures, and embed failures all degrade internally,
    /// and the worst outcome is the placeholder state.
    pub async fn resolve(&self, reference: &str) -> PipelineOutcome {
        self.resolve_from(reference, 0).await
    }

    /// Resolves one reference, skipping candidates before `start_index`.
    ///
    /// Used when a previously resolved display source dies after the fact:
    /// the caller resumes past the index that failed instead of restarting
    /// from the top of the candidate list.
    pub async fn resolve_from(&self, reference: &str, start_index: usize) -> PipelineOutcome {
        let classification = ReferenceClassifier::classify(reference);
        self.observer.on_event(&PipelineEvent::Classified {
            kind: classification.kind(),
            resource_id: classification.resource_id().map(ToString::to_string),
        });

        match classification {
            Classification::Empty => self.fall_back(&ResolveError::UnclassifiableReference),
            Classification::DocumentShare { resource_id: None } => {
                self.fall_back(&ResolveError::AmbiguousProviderReference)
            }
            Classification::Generic { url } => {
                let candidates = StrategyGenerator::direct_candidate(&url);
                match self.probe_loop(&candidates, start_index, false).await {
                    Some(outcome) => outcome,
                    None => self.fall_back(&ResolveError::probe(
                        candidates.len().saturating_sub(1),
                        "no candidate produced a displayable image",
                    )),
                }
            }
            Classification::DocumentShare {
                resource_id: Some(id),
            } => {
                let candidates = StrategyGenerator::candidates_for(&id);
                match self
                    .probe_loop(&candidates, start_index, self.config.materialize_first)
                    .await
                {
                    Some(outcome) => outcome,
                    None => self.try_embed(&id).await,
                }
            }
        }
    }

    /// Probes candidates strictly in order, one at a time, starting at
    /// `start_index`. Returns `None` when every visited candidate failed.
    async fn probe_loop(
        &self,
        candidates: &[CandidateStrategy],
        start_index: usize,
        materialize_first: bool,
    ) -> Option<PipelineOutcome> {
        for (index, candidate) in candidates.iter().enumerate().skip(start_index) {
            self.observer.on_event(&PipelineEvent::ProbeStarted {
                index,
                method: candidate.method,
                url: candidate.url.clone(),
            });

            // Materialization is tried for the top-ranked candidate only;
            // on failure the same candidate is probed directly below.
            if index == 0 && materialize_first {
                if let Some(outcome) = self.try_materialize(index, candidate).await {
                    return Some(outcome);
                }
            }

            match timeout(self.config.probe_timeout, self.probe.probe(&candidate.url)).await {
                Ok(Ok(image)) => {
                    self.observer.on_event(&PipelineEvent::Resolved {
                        index,
                        method: candidate.method,
                    });
                    return Some(PipelineOutcome {
                        state: ResolutionState::Resolved(ResolvedVia::Remote {
                            url: candidate.url.clone(),
                            method: candidate.method,
                        }),
                        image: Some(image),
                        handle: None,
                        resolved_index: Some(index),
                    });
                }
                Ok(Err(e)) => {
                    self.observer.on_event(&PipelineEvent::ProbeFailed {
                        index,
                        reason: e.to_string(),
                    });
                }
                Err(_) => {
                    self.observer.on_event(&PipelineEvent::ProbeFailed {
                        index,
                        reason: format!(
                            "timed out after {}s",
                            self.config.probe_timeout.as_secs()
                        ),
                    });
                }
            }
        }
        None
    }

    /// One materialization attempt, bounded by the probe timeout.
    async fn try_materialize(
        &self,
        index: usize,
        candidate: &CandidateStrategy,
    ) -> Option<PipelineOutcome> {
        match timeout(
            self.config.probe_timeout,
            self.materializer.materialize(&candidate.url),
        )
        .await
        {
            Ok(Ok(materialized)) => {
                self.observer.on_event(&PipelineEvent::Resolved {
                    index,
                    method: candidate.method,
                });
                Some(PipelineOutcome {
                    state: ResolutionState::Resolved(ResolvedVia::Materialized {
                        handle_id: materialized.handle.id().clone(),
                    }),
                    image: Some(materialized.image),
                    handle: Some(materialized.handle),
                    resolved_index: Some(index),
                })
            }
            // Failure already reported by the materializer.
            Ok(Err(_)) => None,
            Err(_) => {
                self.observer.on_event(&PipelineEvent::MaterializationFailed {
                    reason: format!(
                        "timed out after {}s",
                        self.config.probe_timeout.as_secs()
                    ),
                });
                None
            }
        }
    }

    /// Degrades to the provider's embedded preview surface.
    async fn try_embed(&self, id: &ResourceId) -> PipelineOutcome {
        let preview_url = StrategyGenerator::embed_preview_url(id);
        self.observer.on_event(&PipelineEvent::EmbedStarted {
            preview_url: preview_url.clone(),
        });

        match timeout(self.config.embed_timeout, self.embed.check(&preview_url)).await {
            Ok(Ok(())) => {
                self.observer.on_event(&PipelineEvent::EmbedResolved);
                PipelineOutcome {
                    state: ResolutionState::EmbeddedResolved { preview_url },
                    image: None,
                    handle: None,
                    resolved_index: None,
                }
            }
            Ok(Err(e)) => {
                self.observer.on_event(&PipelineEvent::EmbedFailed {
                    reason: e.to_string(),
                });
                self.fall_back(&ResolveError::embed(e.to_string()))
            }
            Err(_) => {
                let reason = format!("timed out after {}s", self.config.embed_timeout.as_secs());
                self.observer.on_event(&PipelineEvent::EmbedFailed {
                    reason: reason.clone(),
                });
                self.fall_back(&ResolveError::embed(reason))
            }
        }
    }

    fn fall_back(&self, error: &ResolveError) -> PipelineOutcome {
        self.observer.on_event(&PipelineEvent::FallingBack {
            reason: error.to_string(),
        });
        PipelineOutcome::fallback()
    }
}

impl std::fmt::Debug for ResolutionEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResolutionEngine")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
