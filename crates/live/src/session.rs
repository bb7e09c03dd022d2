//! A dashboard session: one store, one stream, one task.
//!
//! The session task is the only code that mutates the
//! [`ReconciliationStore`]. Snapshot seeds and stream events reach it over
//! channels and are applied one at a time, so every published projection is
//! complete. Dropping or shutting down the session cancels the task, which
//! closes the stream connection and stops any pending reconnect timer.

use job_dashboard_core::{
    DashboardConfig, FetchError, Projection, ProjectionPublisher, ProjectionSubscription,
    ReconciliationStore, Upsert,
};
use job_dashboard_types::{ConnectionState, JobRecord};
use tokio::sync::{broadcast, mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use crate::metrics;
use crate::snapshot::SnapshotLoader;
use crate::stream::{spawn_stream, OutboundSender, StreamConfig, StreamEvent, StreamHandle};

const TRANSITION_CHANNEL_CAPACITY: usize = 64;

enum Command {
    Seed {
        records: Vec<JobRecord>,
        done: oneshot::Sender<usize>,
    },
}

pub struct DashboardSession {
    config: DashboardConfig,
    loader: SnapshotLoader,
    publisher: ProjectionPublisher,
    commands: mpsc::Sender<Command>,
    state: watch::Receiver<ConnectionState>,
    transitions: broadcast::Sender<ConnectionState>,
    outbound: OutboundSender,
    cancel: CancellationToken,
    task: Option<JoinHandle<()>>,
}

impl DashboardSession {
    /// Start the session task and the stream connection. The store starts
    /// empty and unseeded; call [`load_snapshot`](Self::load_snapshot) to
    /// bootstrap it.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn start(config: DashboardConfig) -> Result<Self, FetchError> {
        let loader = SnapshotLoader::new(&config)?;
        let cancel = CancellationToken::new();
        let publisher = ProjectionPublisher::new();
        let store = ReconciliationStore::with_publisher(publisher.clone());

        let stream = spawn_stream(StreamConfig::from(&config), cancel.clone());
        let state = stream.state_watch();
        let outbound = stream.outbound();

        let (commands, commands_rx) = mpsc::channel(8);
        let (transitions, _) = broadcast::channel(TRANSITION_CHANNEL_CAPACITY);

        let task = tokio::spawn(run(
            store,
            stream,
            commands_rx,
            transitions.clone(),
            cancel.clone(),
        ));

        info!(
            api_url = %config.api_url,
            stream_url = %config.stream_url(),
            "dashboard session started"
        );

        Ok(Self {
            config,
            loader,
            publisher,
            commands,
            state,
            transitions,
            outbound,
            cancel,
            task: Some(task),
        })
    }

    pub fn config(&self) -> &DashboardConfig {
        &self.config
    }

    /// Observe the sorted job projection: the current one first, then every
    /// subsequent one.
    pub fn subscribe(&self) -> ProjectionSubscription {
        self.publisher.subscribe()
    }

    pub fn projection(&self) -> Projection {
        self.publisher.current()
    }

    /// Current connection state.
    pub fn connection_state(&self) -> watch::Receiver<ConnectionState> {
        self.state.clone()
    }

    /// Every connection state transition from now on, in order.
    pub fn connection_events(&self) -> broadcast::Receiver<ConnectionState> {
        self.transitions.subscribe()
    }

    /// Fetch the snapshot and seed the store with it.
    ///
    /// On failure the error is returned and the store keeps whatever it held
    /// before. Returns the number of distinct jobs now in the store.
    /// Fails with [`FetchError::SessionStopped`] if the session task is no
    /// longer running.
    pub async fn load_snapshot(&self) -> Result<usize, FetchError> {
        let records = self.loader.load().await?;
        let (done, seeded) = oneshot::channel();
        if self.commands.send(Command::Seed { records, done }).await.is_err() {
            error!("dashboard session stopped before the snapshot could be applied");
            return Err(FetchError::SessionStopped);
        }
        seeded.await.map_err(|_| FetchError::SessionStopped)
    }

    /// Send a message on the stream if it is open. Dropped otherwise.
    pub fn send(&self, message: impl Into<String>) -> bool {
        self.outbound.send(message)
    }

    /// Tear the session down and wait until the stream is closed.
    pub async fn shutdown(mut self) {
        self.cancel.cancel();
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                error!(error = %e, "dashboard session task ended abnormally");
            }
        }
        info!("dashboard session stopped");
    }
}

impl Drop for DashboardSession {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

async fn run(
    mut store: ReconciliationStore,
    mut stream: StreamHandle,
    mut commands: mpsc::Receiver<Command>,
    transitions: broadcast::Sender<ConnectionState>,
    cancel: CancellationToken,
) {
    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            Some(command) = commands.recv() => match command {
                Command::Seed { records, done } => {
                    let held = store.seed(records);
                    metrics::set_job_count(held);
                    let _ = done.send(held);
                }
            },
            event = stream.next_event() => match event {
                Some(StreamEvent::State(state)) => {
                    debug!(%state, "connection state changed");
                    let _ = transitions.send(state);
                }
                Some(StreamEvent::Job(record)) => {
                    let job_id = record.id.clone();
                    let status = record.status;
                    let upsert = store.apply(record);
                    metrics::record_applied();
                    if upsert == Upsert::Inserted {
                        metrics::set_job_count(store.len());
                    }
                    debug!(job_id = %job_id, %status, ?upsert, "job update applied");
                }
                None => break,
            },
        }
    }
    stream.shutdown().await;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_load_snapshot_after_task_stopped() {
        let mut rest = mockito::Server::new_async().await;
        rest.mock("GET", "/jobs")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body("[]")
            .create_async()
            .await;
        let config = DashboardConfig {
            api_url: rest.url(),
            ws_url: "ws://127.0.0.1:1".into(),
            ..DashboardConfig::default()
        };
        let mut session = DashboardSession::start(config).unwrap();

        let task = session.task.take().unwrap();
        task.abort();
        let _ = task.await;

        assert!(matches!(
            session.load_snapshot().await,
            Err(FetchError::SessionStopped)
        ));
        assert!(!session.projection().is_seeded());
    }

    #[tokio::test]
    async fn test_empty_snapshot_seeds_running_session() {
        let mut rest = mockito::Server::new_async().await;
        rest.mock("GET", "/jobs")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body("[]")
            .create_async()
            .await;
        let config = DashboardConfig {
            api_url: rest.url(),
            ws_url: "ws://127.0.0.1:1".into(),
            ..DashboardConfig::default()
        };
        let session = DashboardSession::start(config).unwrap();

        assert_eq!(session.load_snapshot().await.unwrap(), 0);
        assert!(session.projection().is_seeded());
        session.shutdown().await;
    }
}
