//! Infrastructure layer with external service adapters.

/// Application configuration.
pub mod config;
/// HTTP adapters for probing, materialization, and embed checks.
pub mod http;

pub use config::{AppConfig, CliArgs, ConfigError, LogLevel};
pub use http::{HttpByteFetcher, HttpEmbedChecker, HttpProbeClient};
