use std::sync::Arc;

use clap::Parser;
use color_eyre::eyre::Result;
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use pixprobe::application::ResolutionEngine;
use pixprobe::application::engine::events::TracingObserver;
use pixprobe::domain::entities::ResolutionState;
use pixprobe::infrastructure::{
    AppConfig, CliArgs, HttpByteFetcher, HttpEmbedChecker, HttpProbeClient,
};

fn init_logging(config: &AppConfig) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.log_level.to_string()));

    if let Some(log_path) = config.effective_log_path() {
        if let Some(parent) = log_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&log_path)?;

        let file_layer = fmt::layer()
            .with_writer(file)
            .with_ansi(false)
            .with_target(true)
            .with_thread_ids(false);

        tracing_subscriber::registry()
            .with(filter)
            .with(file_layer)
            .init();

        info!(path = %log_path.display(), "Logging initialized");
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_writer(std::io::stderr))
            .init();
    }

    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;

    let args = CliArgs::parse();
    let config = AppConfig::load(&args)?;

    init_logging(&config)?;
    info!(version = pixprobe::VERSION, "Starting pixprobe");

    let engine_config = config.engine_config();
    let engine = ResolutionEngine::new(
        Arc::new(HttpProbeClient::new(engine_config.probe_timeout)?),
        Arc::new(HttpByteFetcher::new(engine_config.probe_timeout)?),
        Arc::new(HttpEmbedChecker::new(engine_config.embed_timeout)?),
        Arc::new(TracingObserver),
        engine_config,
    );

    let mut outcome = engine.resolve(&args.reference).await;
    if matches!(outcome.state, ResolutionState::Fallback) {
        if let Some(fallback_reference) = &config.fallback_reference {
            info!(fallback = %fallback_reference, "Primary reference exhausted, resolving fallback");
            outcome = engine.resolve(fallback_reference).await;
        }
    }

    match &outcome.state {
        ResolutionState::Resolved(via) => {
            let image = outcome.image.as_ref().map_or((0, 0), |img| {
                (img.width(), img.height())
            });
            println!("resolved: {via} ({}x{})", image.0, image.1);
        }
        ResolutionState::EmbeddedResolved { preview_url } => {
            println!("embedded: {preview_url}");
        }
        state => println!("{state}: {}", config.fallback_alt),
    }

    Ok(())
}
