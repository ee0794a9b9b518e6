//! Pipeline run orchestration for shells.
//!
//! Bridges the async resolution engine to a [`RemoteImage`] shell: each run
//! executes on the tokio runtime and streams generation-tagged updates over
//! an unbounded channel. The shell discards anything tagged with an old
//! generation, which is what makes source changes and teardown safe while
//! probes are still in flight.
//!
//! [`RemoteImage`]: super::widgets::RemoteImage

use std::sync::Arc;

use tokio::sync::mpsc;

use crate::application::engine::events::{PipelineEvent, PipelineObserver, TracingObserver};
use crate::application::engine::{EngineConfig, ResolutionEngine};
use crate::domain::entities::Generation;
use crate::domain::ports::{ByteFetchPort, EmbedProbePort, ImageProbePort};
use crate::presentation::widgets::ShellUpdate;

/// Observer forwarding events to one shell, tagged with the run's
/// generation, while also logging through `tracing`.
struct ShellObserver {
    generation: Generation,
    tx: mpsc::UnboundedSender<ShellUpdate>,
    log: TracingObserver,
}

impl PipelineObserver for ShellObserver {
    fn on_event(&self, event: &PipelineEvent) {
        self.log.on_event(event);
        // The receiver may already be gone on teardown; that is a no-op.
        let _ = self
            .tx
            .send(ShellUpdate::Event(self.generation, event.clone()));
    }
}

/// Spawns generation-tagged pipeline runs.
#[derive(Clone)]
pub struct PipelineRunner {
    probe: Arc<dyn ImageProbePort>,
    fetcher: Arc<dyn ByteFetchPort>,
    embed: Arc<dyn EmbedProbePort>,
    config: EngineConfig,
}

impl PipelineRunner {
    /// Creates a runner over the given ports.
    #[must_use]
    pub fn new(
        probe: Arc<dyn ImageProbePort>,
        fetcher: Arc<dyn ByteFetchPort>,
        embed: Arc<dyn EmbedProbePort>,
        config: EngineConfig,
    ) -> Self {
        Self {
            probe,
            fetcher,
            embed,
            config,
        }
    }

    /// Starts one pipeline run for `reference`, streaming updates to `tx`.
    /// Candidates before `start_index` are skipped; pass 0 for a fresh run.
    ///
    /// The run always terminates with a `ShellUpdate::Outcome`. If the
    /// receiver has been dropped by then (shell torn down mid-run), any
    /// handle the outcome carries is revoked here instead of reaching the
    /// shell's lifecycle slot.
    pub fn spawn(
        &self,
        generation: Generation,
        reference: String,
        start_index: usize,
        tx: mpsc::UnboundedSender<ShellUpdate>,
    ) -> tokio::task::JoinHandle<()> {
        let engine = ResolutionEngine::new(
            self.probe.clone(),
            self.fetcher.clone(),
            self.embed.clone(),
            Arc::new(ShellObserver {
                generation,
                tx: tx.clone(),
                log: TracingObserver,
            }),
            self.config.clone(),
        );

        tokio::spawn(async move {
            let outcome = engine.resolve_from(&reference, start_index).await;
            if let Err(mpsc::error::SendError(ShellUpdate::Outcome(_, undelivered))) =
                tx.send(ShellUpdate::Outcome(generation, outcome))
            {
                if let Some(mut handle) = undelivered.handle {
                    tracing::debug!(handle = %handle.id(), "Shell gone, revoking undeliverable handle");
                    handle.revoke();
                }
            }
        })
    }
}

impl std::fmt::Debug for PipelineRunner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PipelineRunner")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use bytes::Bytes;

    use super::*;
    use crate::domain::entities::ResolutionState;
    use crate::domain::errors::{EmbedError, FetchError, ProbeError};
    use crate::domain::ports::FetchMode;
    use crate::presentation::widgets::RemoteImage;

    /// Probe port that fails a scripted number of times, then succeeds.
    struct ScriptedProbe {
        failures_left: Mutex<usize>,
    }

    #[async_trait::async_trait]
    impl ImageProbePort for ScriptedProbe {
        async fn probe(&self, _url: &str) -> Result<Arc<image::DynamicImage>, ProbeError> {
            let mut left = self.failures_left.lock().unwrap();
            if *left > 0 {
                *left -= 1;
                Err(ProbeError::Status(403))
            } else {
                Ok(Arc::new(image::DynamicImage::new_rgb8(2, 2)))
            }
        }

        async fn decode(&self, _bytes: Bytes) -> Result<Arc<image::DynamicImage>, ProbeError> {
            Err(ProbeError::Decode("scripted".into()))
        }
    }

    struct RejectingFetcher;

    #[async_trait::async_trait]
    impl ByteFetchPort for RejectingFetcher {
        async fn fetch(&self, _url: &str, _mode: FetchMode) -> Result<Bytes, FetchError> {
            Err(FetchError::Network("blocked".into()))
        }
    }

    struct HealthyEmbed;

    #[async_trait::async_trait]
    impl EmbedProbePort for HealthyEmbed {
        async fn check(&self, _preview_url: &str) -> Result<(), EmbedError> {
            Ok(())
        }
    }

    struct BrokenEmbed;

    #[async_trait::async_trait]
    impl EmbedProbePort for BrokenEmbed {
        async fn check(&self, _preview_url: &str) -> Result<(), EmbedError> {
            Err(EmbedError::Unavailable("404".into()))
        }
    }

    /// Fetcher that hands back decodable-looking bytes so a run
    /// materializes a live handle.
    struct YieldingFetcher;

    #[async_trait::async_trait]
    impl ByteFetchPort for YieldingFetcher {
        async fn fetch(&self, _url: &str, _mode: FetchMode) -> Result<Bytes, FetchError> {
            Ok(Bytes::from_static(b"img-bytes"))
        }
    }

    struct DecodingProbe;

    #[async_trait::async_trait]
    impl ImageProbePort for DecodingProbe {
        async fn probe(&self, _url: &str) -> Result<Arc<image::DynamicImage>, ProbeError> {
            Ok(Arc::new(image::DynamicImage::new_rgb8(2, 2)))
        }

        async fn decode(&self, _bytes: Bytes) -> Result<Arc<image::DynamicImage>, ProbeError> {
            Ok(Arc::new(image::DynamicImage::new_rgb8(2, 2)))
        }
    }

    fn runner(failures: usize) -> PipelineRunner {
        PipelineRunner::new(
            Arc::new(ScriptedProbe {
                failures_left: Mutex::new(failures),
            }),
            Arc::new(RejectingFetcher),
            Arc::new(HealthyEmbed),
            EngineConfig::default(),
        )
    }

    async fn drain_into(
        shell: &mut RemoteImage,
        rx: &mut mpsc::UnboundedReceiver<ShellUpdate>,
    ) {
        while !shell.state().is_terminal() {
            let update = rx.recv().await.expect("run always sends an outcome");
            shell.apply(update);
        }
    }

    #[tokio::test]
    async fn test_run_resolves_after_scripted_failures() {
        let mut shell = RemoteImage::new("https://drive.google.com/file/d/ABC/view", "alt");
        let (tx, mut rx) = mpsc::unbounded_channel();

        runner(2).spawn(shell.generation(), shell.reference().to_string(), 0, tx);
        drain_into(&mut shell, &mut rx).await;

        assert!(shell.state().is_resolved());
    }

    #[tokio::test]
    async fn test_run_degrades_to_embed_when_exhausted() {
        let mut shell = RemoteImage::new("https://drive.google.com/file/d/ABC/view", "alt");
        let (tx, mut rx) = mpsc::unbounded_channel();

        // More failures than candidates: every probe fails.
        runner(16).spawn(shell.generation(), shell.reference().to_string(), 0, tx);
        drain_into(&mut shell, &mut rx).await;

        assert!(shell.state().is_embedded());
    }

    #[tokio::test]
    async fn test_source_change_mid_run_discards_old_updates() {
        let mut shell = RemoteImage::new("https://drive.google.com/file/d/OLD/view", "alt");
        let (tx, mut rx) = mpsc::unbounded_channel();

        let old_generation = shell.generation();
        runner(16).spawn(old_generation, shell.reference().to_string(), 0, tx.clone());

        // The source changes before the old run finishes.
        let new_generation = shell.set_reference("https://drive.google.com/file/d/NEW/view");
        runner(0).spawn(new_generation, shell.reference().to_string(), 0, tx);

        drain_into(&mut shell, &mut rx).await;
        assert!(shell.state().is_resolved());

        // The abandoned run still terminates with an old-generation
        // outcome; applying it must be a no-op.
        while shell.stale_discards() == 0 {
            let update = rx.recv().await.expect("old run always sends an outcome");
            shell.apply(update);
        }
        assert!(shell.state().is_resolved());
        assert_eq!(shell.handles_created(), 0);
    }

    #[tokio::test]
    async fn test_teardown_mid_run_completes_and_revokes() {
        // The shell (and its receiver) disappears while the run is in
        // flight; the run must still finish cleanly, with the materialized
        // handle revoked on the undeliverable-outcome path.
        let runner = PipelineRunner::new(
            Arc::new(DecodingProbe),
            Arc::new(YieldingFetcher),
            Arc::new(HealthyEmbed),
            EngineConfig::default(),
        );
        let (tx, rx) = mpsc::unbounded_channel();
        drop(rx);

        let join = runner.spawn(1, "https://drive.google.com/file/d/ABC/view".to_string(), 0, tx);
        join.await.expect("run must not panic on teardown");
    }

    #[tokio::test]
    async fn test_fallback_reference_resolves_after_exhaustion() {
        let mut shell = RemoteImage::new("https://drive.google.com/file/d/ABC/view", "alt")
            .with_fallback_reference("https://cdn.example.com/fallback.png");
        let (tx, mut rx) = mpsc::unbounded_channel();

        // Every candidate fails and the embed is broken too, so the first
        // run ends in the placeholder; the shell then asks for the
        // fallback reference, which resolves as a plain direct probe.
        let runner = PipelineRunner::new(
            Arc::new(ScriptedProbe {
                failures_left: Mutex::new(4),
            }),
            Arc::new(RejectingFetcher),
            Arc::new(BrokenEmbed),
            EngineConfig::default(),
        );
        runner.spawn(
            shell.generation(),
            shell.resolution_target().to_string(),
            shell.resume_index(),
            tx.clone(),
        );

        while !shell.state().is_terminal() {
            let update = rx.recv().await.expect("runs always send an outcome");
            let was_outcome = matches!(update, ShellUpdate::Outcome(..));
            shell.apply(update);
            if was_outcome && shell.needs_resolution() {
                runner.spawn(
                    shell.generation(),
                    shell.resolution_target().to_string(),
                    shell.resume_index(),
                    tx.clone(),
                );
            }
        }

        assert!(shell.state().is_resolved());
        assert_eq!(
            shell.resolution_target(),
            "https://cdn.example.com/fallback.png"
        );
    }
}
