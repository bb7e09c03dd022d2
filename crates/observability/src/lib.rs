//! Tracing setup shared by the job dashboard binaries.
//!
//! Logs go to stderr (stdout belongs to the table renderer) in either a
//! compact human format or JSON lines. An optional directory adds a
//! daily-rolling JSON file sink.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt as tfmt, EnvFilter, Layer, Registry};

/// Filter used when `RUST_LOG` is not set.
pub const DEFAULT_FILTER: &str = "warn,job_dashboard=info";

const LOG_FILE_PREFIX: &str = "job-dashboard.log";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    #[default]
    Compact,
    Json,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "compact" | "text" => Ok(LogFormat::Compact),
            "json" => Ok(LogFormat::Json),
            other => Err(format!("unknown log format `{other}` (expected `compact` or `json`)")),
        }
    }
}

impl fmt::Display for LogFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            LogFormat::Compact => "compact",
            LogFormat::Json => "json",
        })
    }
}

#[derive(Debug, Clone)]
pub struct LogConfig {
    pub format: LogFormat,
    pub default_filter: String,
    /// When set, JSON logs are also written to a daily-rolling file here.
    pub log_dir: Option<PathBuf>,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            format: LogFormat::Compact,
            default_filter: DEFAULT_FILTER.into(),
            log_dir: None,
        }
    }
}

/// Keeps the background file writer alive. Drop it last.
#[must_use = "dropping the guard stops the file log writer"]
pub struct LogGuard {
    _file: Option<WorkerGuard>,
}

/// Install the global tracing subscriber.
///
/// Fails if a global subscriber is already installed.
pub fn init_tracing(config: &LogConfig) -> anyhow::Result<LogGuard> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.default_filter));

    let mut layers: Vec<Box<dyn Layer<Registry> + Send + Sync>> = Vec::new();
    layers.push(match config.format {
        LogFormat::Compact => tfmt::layer()
            .compact()
            .with_writer(std::io::stderr)
            .boxed(),
        LogFormat::Json => tfmt::layer().json().with_writer(std::io::stderr).boxed(),
    });

    let file_guard = match &config.log_dir {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, LOG_FILE_PREFIX);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            layers.push(
                tfmt::layer()
                    .json()
                    .with_ansi(false)
                    .with_writer(writer)
                    .boxed(),
            );
            Some(guard)
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(layers)
        .with(filter)
        .try_init()?;

    Ok(LogGuard { _file: file_guard })
}
