//! Application configuration.

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use crate::application::EngineConfig;

const APP_NAME: &str = "pixprobe";
const APP_QUALIFIER: &str = "dev";
const APP_ORGANIZATION: &str = "pixprobe";

/// Log level configuration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Trace level.
    Trace,
    /// Debug level.
    Debug,
    /// Info level.
    #[default]
    Info,
    /// Warning level.
    Warn,
    /// Error level.
    Error,
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Trace => write!(f, "trace"),
            Self::Debug => write!(f, "debug"),
            Self::Info => write!(f, "info"),
            Self::Warn => write!(f, "warn"),
            Self::Error => write!(f, "error"),
        }
    }
}

/// Command-line arguments.
#[derive(Debug, Parser)]
#[command(
    name = "pixprobe",
    version,
    about = "Resolve an untrusted image reference through ordered fallback strategies",
    long_about = None
)]
pub struct CliArgs {
    /// The image reference to resolve.
    pub reference: String,

    /// Placeholder alt text used when the pipeline falls back.
    #[arg(long, value_name = "TEXT")]
    pub fallback: Option<String>,

    /// Secondary image reference resolved when the primary one falls back.
    #[arg(long = "fallback-ref", value_name = "URL")]
    pub fallback_reference: Option<String>,

    /// Configuration file path.
    #[arg(short, long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Log file path.
    #[arg(long, value_name = "PATH")]
    pub log_path: Option<PathBuf>,

    /// Log verbosity level.
    #[arg(long, value_enum)]
    pub log_level: Option<LogLevel>,

    /// Per-probe timeout in seconds.
    #[arg(long, value_name = "SECS")]
    pub probe_timeout: Option<u64>,

    /// Embedded-preview timeout in seconds.
    #[arg(long, value_name = "SECS")]
    pub embed_timeout: Option<u64>,

    /// Skip materialization and probe every candidate directly.
    #[arg(long)]
    pub no_materialize: bool,
}

/// Pipeline configuration merged from the config file and CLI flags.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Log file path.
    #[serde(skip)]
    pub log_path: Option<PathBuf>,

    /// Log verbosity level.
    #[serde(default)]
    pub log_level: LogLevel,

    /// Per-probe timeout in seconds.
    #[serde(default = "default_probe_timeout")]
    pub probe_timeout_secs: u64,

    /// Embedded-preview timeout in seconds.
    #[serde(default = "default_embed_timeout")]
    pub embed_timeout_secs: u64,

    /// Attempt materialization before direct probing for the top-ranked
    /// provider candidate.
    #[serde(default = "default_true")]
    pub materialize_first: bool,

    /// Placeholder alt text used when the pipeline falls back.
    #[serde(default = "default_fallback_alt")]
    pub fallback_alt: String,

    /// Secondary image reference resolved when the primary one falls back.
    #[serde(default)]
    pub fallback_reference: Option<String>,
}

const fn default_probe_timeout() -> u64 {
    8
}

const fn default_embed_timeout() -> u64 {
    8
}

const fn default_true() -> bool {
    true
}

fn default_fallback_alt() -> String {
    "image unavailable".to_string()
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            log_path: None,
            log_level: LogLevel::Info,
            probe_timeout_secs: default_probe_timeout(),
            embed_timeout_secs: default_embed_timeout(),
            materialize_first: true,
            fallback_alt: default_fallback_alt(),
            fallback_reference: None,
        }
    }
}

impl AppConfig {
    /// Loads configuration from the given (or default) TOML file and merges
    /// the CLI arguments over it.
    ///
    /// A missing file yields defaults; an unreadable or invalid file is an
    /// error so misconfiguration does not silently vanish.
    ///
    /// # Errors
    /// Returns an error if the config file exists but cannot be read or
    /// parsed.
    pub fn load(args: &CliArgs) -> Result<Self, ConfigError> {
        let path = args.config.clone().or_else(Self::default_config_path);

        let mut config = match path {
            Some(path) if path.exists() => {
                let raw = std::fs::read_to_string(&path).map_err(|e| ConfigError::Io {
                    path: path.clone(),
                    message: e.to_string(),
                })?;
                toml::from_str(&raw).map_err(|e| ConfigError::Parse {
                    path,
                    message: e.to_string(),
                })?
            }
            _ => Self::default(),
        };

        config.merge_with_args(args);
        Ok(config)
    }

    /// Merges CLI arguments into the configuration.
    pub fn merge_with_args(&mut self, args: &CliArgs) {
        if let Some(log_path) = &args.log_path {
            self.log_path = Some(log_path.clone());
        }
        if let Some(log_level) = args.log_level {
            self.log_level = log_level;
        }
        if let Some(probe_timeout) = args.probe_timeout {
            self.probe_timeout_secs = probe_timeout;
        }
        if let Some(embed_timeout) = args.embed_timeout {
            self.embed_timeout_secs = embed_timeout;
        }
        if args.no_materialize {
            self.materialize_first = false;
        }
        if let Some(fallback) = &args.fallback {
            self.fallback_alt = fallback.clone();
        }
        if let Some(fallback_reference) = &args.fallback_reference {
            self.fallback_reference = Some(fallback_reference.clone());
        }
    }

    /// Returns the engine tuning derived from this configuration.
    #[must_use]
    pub const fn engine_config(&self) -> EngineConfig {
        EngineConfig {
            probe_timeout: Duration::from_secs(self.probe_timeout_secs),
            embed_timeout: Duration::from_secs(self.embed_timeout_secs),
            materialize_first: self.materialize_first,
        }
    }

    /// Returns default config file path.
    #[must_use]
    pub fn default_config_path() -> Option<PathBuf> {
        ProjectDirs::from(APP_QUALIFIER, APP_ORGANIZATION, APP_NAME)
            .map(|dirs| dirs.config_dir().join("config.toml"))
    }

    /// Returns default log file path.
    #[must_use]
    pub fn default_log_path() -> Option<PathBuf> {
        ProjectDirs::from(APP_QUALIFIER, APP_ORGANIZATION, APP_NAME)
            .map(|dirs| dirs.data_dir().join("pixprobe.log"))
    }

    /// Returns effective log path.
    #[must_use]
    pub fn effective_log_path(&self) -> Option<PathBuf> {
        self.log_path.clone()
    }
}

/// Configuration loading errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The config file could not be read.
    #[error("cannot read config {path}: {message}")]
    Io {
        /// Offending file.
        path: PathBuf,
        /// Underlying error text.
        message: String,
    },
    /// The config file is not valid TOML.
    #[error("cannot parse config {path}: {message}")]
    Parse {
        /// Offending file.
        path: PathBuf,
        /// Underlying error text.
        message: String,
    },
}
