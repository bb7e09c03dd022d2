//! Command-line surface.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use clap::{Args, Parser, Subcommand};
use job_dashboard_core::config::ws_url_for;
use job_dashboard_core::DashboardConfig;
use job_dashboard_observability::LogFormat;

#[derive(Debug, Parser)]
#[command(name = "job-dashboard", version, about = "Live view of a distributed job scheduler")]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalArgs,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Show the job table and keep it current from the update stream.
    Watch,
    /// Print the current job table once and exit.
    List,
    /// Submit a new job and print its id.
    Submit(SubmitArgs),
}

#[derive(Debug, Args)]
pub struct SubmitArgs {
    #[arg(long)]
    pub job_type: String,

    /// Job payload as a JSON document.
    #[arg(long, default_value = "{}")]
    pub payload: String,
}

/// Flags that override `JOB_DASHBOARD_*` environment configuration.
#[derive(Debug, Args)]
pub struct GlobalArgs {
    /// Base REST URL (snapshot and submission).
    #[arg(long, global = true)]
    pub api_url: Option<String>,

    /// Base stream URL. Derived from --api-url when only that is given.
    #[arg(long, global = true)]
    pub ws_url: Option<String>,

    #[arg(long, global = true)]
    pub reconnect_delay_ms: Option<u64>,

    #[arg(long, global = true, default_value_t = LogFormat::Compact)]
    pub log_format: LogFormat,

    /// Also write JSON logs to a daily-rolling file in this directory.
    #[arg(long, global = true)]
    pub log_dir: Option<PathBuf>,

    /// Serve Prometheus metrics on this address.
    #[arg(long, global = true)]
    pub metrics_addr: Option<SocketAddr>,
}

impl GlobalArgs {
    pub fn apply(&self, mut config: DashboardConfig) -> DashboardConfig {
        if let Some(api_url) = &self.api_url {
            config.api_url = api_url.clone();
            if self.ws_url.is_none() {
                config.ws_url = ws_url_for(api_url);
            }
        }
        if let Some(ws_url) = &self.ws_url {
            config.ws_url = ws_url.clone();
        }
        if let Some(ms) = self.reconnect_delay_ms {
            config.reconnect_delay = Duration::from_millis(ms);
        }
        config
    }
}
