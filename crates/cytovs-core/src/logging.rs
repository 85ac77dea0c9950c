//! Logging configuration and initialization
//!
//! One place to set up `tracing` for the `cytovs` binary. Events always go to
//! stderr, since stdout carries the run summary or the classified CSV. When a
//! log directory is configured they are also written to a daily rolling file
//! `cytovs.<date>` in it.
//!
//! Diagnostics go through `trace!`/`debug!`/`info!`/`warn!`/`error!` with
//! structured fields, never `println!`:
//!
//! ```rust
//! use tracing::{info, warn};
//!
//! let batch = 2;
//! info!(batch, size = 1000, "Submitting identifier batch");
//! warn!(excluded = 3, "Identifiers without a network match");
//! ```
//!
//! # Example
//!
//! ```no_run
//! use cytovs_core::logging::{init_logging, LogConfig};
//!
//! let config = LogConfig::from_env().unwrap_or_default();
//! init_logging(&config).unwrap();
//! ```

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tracing::Level;
use tracing::Subscriber;
use tracing_subscriber::{
    fmt::{self, format::FmtSpan, MakeWriter},
    layer::SubscriberExt,
    registry::LookupSpan,
    util::SubscriberInitExt,
    EnvFilter, Layer,
};

/// Prefix of rolling log files
pub const LOG_FILE_PREFIX: &str = "cytovs";

/// Minimum level of emitted events
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl LogLevel {
    pub fn to_tracing_level(self) -> Level {
        match self {
            LogLevel::Trace => Level::TRACE,
            LogLevel::Debug => Level::DEBUG,
            LogLevel::Info => Level::INFO,
            LogLevel::Warn => Level::WARN,
            LogLevel::Error => Level::ERROR,
        }
    }
}

impl std::str::FromStr for LogLevel {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "trace" => Ok(LogLevel::Trace),
            "debug" => Ok(LogLevel::Debug),
            "info" => Ok(LogLevel::Info),
            "warn" | "warning" => Ok(LogLevel::Warn),
            "error" => Ok(LogLevel::Error),
            _ => Err(anyhow::anyhow!("Invalid log level: {}", s)),
        }
    }
}

/// Line format of emitted events
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Text,
    /// One JSON object per event
    Json,
}

impl std::str::FromStr for LogFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" | "pretty" => Ok(LogFormat::Text),
            "json" => Ok(LogFormat::Json),
            _ => Err(anyhow::anyhow!("Invalid log format: {}", s)),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LogConfig {
    pub level: LogLevel,
    pub format: LogFormat,
    /// Also write a rolling file here
    pub log_dir: Option<PathBuf>,
    /// Extra directives, e.g. `reqwest=warn,cytovs_cli::api=debug`
    pub filter_directives: Option<String>,
}

impl LogConfig {
    /// Defaults overridden by environment variables
    pub fn from_env() -> Result<Self> {
        Self::default().with_env_overrides()
    }

    /// Apply `LOG_LEVEL`, `LOG_FORMAT`, `LOG_DIR` and `LOG_FILTER`
    pub fn with_env_overrides(self) -> Result<Self> {
        self.with_overrides_from(|key| std::env::var(key).ok())
    }

    fn with_overrides_from<F>(mut self, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(level) = lookup("LOG_LEVEL") {
            self.level = level.parse()?;
        }
        if let Some(format) = lookup("LOG_FORMAT") {
            self.format = format.parse()?;
        }
        if let Some(dir) = lookup("LOG_DIR").filter(|d| !d.trim().is_empty()) {
            self.log_dir = Some(PathBuf::from(dir));
        }
        if let Some(filter) = lookup("LOG_FILTER") {
            self.filter_directives = Some(filter);
        }
        Ok(self)
    }
}

/// Install the global subscriber
///
/// Call once at startup. A second call fails because a global subscriber is
/// already set.
pub fn init_logging(config: &LogConfig) -> Result<()> {
    let filter = build_filter(config)?;

    let file = match &config.log_dir {
        Some(dir) => Some(fmt_layer(config, file_writer(dir)?, false)),
        None => None,
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer(config, std::io::stderr, true))
        .with(file)
        .try_init()?;

    Ok(())
}

fn build_filter(config: &LogConfig) -> Result<EnvFilter> {
    let mut filter =
        EnvFilter::from_default_env().add_directive(config.level.to_tracing_level().into());

    if let Some(ref directives) = config.filter_directives {
        for directive in directives.split(',').filter(|d| !d.trim().is_empty()) {
            filter = filter.add_directive(
                directive
                    .trim()
                    .parse()
                    .context("Failed to parse filter directive")?,
            );
        }
    }

    Ok(filter)
}

/// Daily rolling, non-blocking file writer
fn file_writer(dir: &Path) -> Result<tracing_appender::non_blocking::NonBlocking> {
    std::fs::create_dir_all(dir).context("Failed to create log directory")?;

    let appender = tracing_appender::rolling::daily(dir, LOG_FILE_PREFIX);
    let (non_blocking, guard) = tracing_appender::non_blocking(appender);

    // The guard flushes on drop; the writer has to live as long as the process.
    std::mem::forget(guard);

    Ok(non_blocking)
}

fn fmt_layer<S, W>(config: &LogConfig, writer: W, ansi: bool) -> Box<dyn Layer<S> + Send + Sync>
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    // Module targets only help when looking at debug output
    let layer = fmt::layer()
        .with_writer(writer)
        .with_ansi(ansi)
        .with_target(config.level <= LogLevel::Debug)
        .with_span_events(FmtSpan::CLOSE);

    match config.format {
        LogFormat::Text => layer.boxed(),
        LogFormat::Json => layer.json().boxed(),
    }
}
