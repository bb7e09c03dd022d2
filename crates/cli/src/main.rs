// crates/cli/src/main.rs
//! `job-dashboard` binary.
//!
//! `watch` keeps a session open and redraws the job table on every
//! projection change; `list` and `submit` are one-shot REST calls.

mod cli;
mod render;

use std::io::{IsTerminal, Write};
use std::net::SocketAddr;

use anyhow::{Context, Result};
use clap::Parser;
use job_dashboard_core::{DashboardConfig, Projection, ReconciliationStore};
use job_dashboard_live::{metrics, DashboardSession, JobSubmitter, SnapshotLoader};
use job_dashboard_observability::{init_tracing, LogConfig};
use job_dashboard_types::ConnectionState;
use metrics_exporter_prometheus::PrometheusBuilder;
use tracing::{info, warn};

use crate::cli::{Cli, Command, SubmitArgs};

const CLEAR_SCREEN: &str = "\x1b[2J\x1b[H";

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // reqwest and tokio-tungstenite both link rustls; pick the provider once.
    let _ = rustls::crypto::aws_lc_rs::default_provider().install_default();

    let _log_guard = init_tracing(&LogConfig {
        format: cli.global.log_format,
        log_dir: cli.global.log_dir.clone(),
        ..LogConfig::default()
    })?;

    if let Some(addr) = cli.global.metrics_addr {
        install_metrics(addr)?;
    }

    let config = cli.global.apply(DashboardConfig::from_env());
    match cli.command {
        Command::Watch => watch(config).await,
        Command::List => list(config).await,
        Command::Submit(args) => submit(config, args).await,
    }
}

fn install_metrics(addr: SocketAddr) -> Result<()> {
    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .with_context(|| format!("failed to start metrics exporter on {addr}"))?;
    metrics::describe_metrics();
    info!(%addr, "Prometheus metrics exporter listening");
    Ok(())
}

async fn watch(config: DashboardConfig) -> Result<()> {
    let session = DashboardSession::start(config).context("failed to start dashboard session")?;
    let retry_delay = session.config().reconnect_delay;
    let mut projections = session.subscribe();
    let mut state = session.connection_state();

    {
        let snapshot = async {
            loop {
                match session.load_snapshot().await {
                    Ok(jobs) => break jobs,
                    Err(e) => {
                        warn!(
                            error = %e,
                            delay_ms = retry_delay.as_millis() as u64,
                            "snapshot load failed, retrying"
                        );
                        tokio::time::sleep(retry_delay).await;
                    }
                }
            }
        };
        tokio::pin!(snapshot);
        let mut seeded = false;

        let shutdown = shutdown_signal();
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                _ = &mut shutdown => break,
                jobs = &mut snapshot, if !seeded => {
                    seeded = true;
                    info!(jobs, "snapshot applied");
                }
                Some(projection) = projections.next() => {
                    let current = *state.borrow();
                    draw(&projection, current)?;
                }
                changed = state.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    let current = *state.borrow_and_update();
                    draw(&projections.latest(), current)?;
                }
            }
        }
    }

    session.shutdown().await;
    Ok(())
}

fn draw(projection: &Projection, state: ConnectionState) -> Result<()> {
    let mut stdout = std::io::stdout().lock();
    if stdout.is_terminal() {
        stdout.write_all(CLEAR_SCREEN.as_bytes())?;
    }
    writeln!(stdout, "{}", render::screen(projection, state))?;
    stdout.flush()?;
    Ok(())
}

async fn list(config: DashboardConfig) -> Result<()> {
    let loader = SnapshotLoader::new(&config)?;
    let records = loader.load().await.context("failed to load jobs")?;

    let mut store = ReconciliationStore::new();
    store.seed(records);
    println!("{}", render::table(&store.project()));
    Ok(())
}

async fn submit(config: DashboardConfig, args: SubmitArgs) -> Result<()> {
    let payload: serde_json::Value =
        serde_json::from_str(&args.payload).context("--payload is not valid JSON")?;
    let submitter = JobSubmitter::new(&config)?;
    let job = submitter
        .submit(&args.job_type, &payload)
        .await
        .context("failed to submit job")?;
    println!("{}", job.id);
    Ok(())
}

/// Wait for SIGINT or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    _ = ctrl_c => {},
                    _ = sigterm.recv() => {},
                }
            }
            Err(e) => {
                warn!(error = %e, "failed to register SIGTERM handler");
                ctrl_c.await;
            }
        }
    }

    #[cfg(not(unix))]
    {
        ctrl_c.await;
    }
}
