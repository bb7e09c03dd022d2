//! Lifecycle of the job update stream.
//!
//! One task owns one logical connection and walks the state machine
//!
//! ```text
//! Connecting ──handshake──▶ Open ──close/error──▶ Closed ──delay──▶ Connecting …
//!      └────────────connect failed───────────────────▲
//! ```
//!
//! forever, until its cancellation token fires. Decoded job updates and
//! state transitions are pushed to the owner through one ordered channel,
//! so a job update can never overtake the transition that preceded it.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use job_dashboard_core::{DashboardConfig, StreamError};
use job_dashboard_types::{ConnectionState, DecodeError, Envelope, JobRecord, StreamMessage};
use tokio::net::TcpStream;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace, warn};

use crate::metrics;

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

const EVENT_CHANNEL_CAPACITY: usize = 256;
const CLOSE_GRACE: Duration = Duration::from_millis(500);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamConfig {
    /// Full stream endpoint, e.g. `ws://localhost:8000/ws`.
    pub url: String,
    pub reconnect_delay: Duration,
    pub connect_timeout: Duration,
}

impl From<&DashboardConfig> for StreamConfig {
    fn from(config: &DashboardConfig) -> Self {
        Self {
            url: config.stream_url(),
            reconnect_delay: config.reconnect_delay,
            connect_timeout: config.connect_timeout,
        }
    }
}

/// What the stream hands its owner, in delivery order.
#[derive(Debug, Clone, PartialEq)]
pub enum StreamEvent {
    State(ConnectionState),
    Job(JobRecord),
}

/// Counters for one stream manager's lifetime.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StreamStats {
    pub connect_attempts: u64,
    pub connections_opened: u64,
    pub frames_discarded: u64,
}

#[derive(Debug, Default)]
struct Counters {
    connect_attempts: AtomicU64,
    connections_opened: AtomicU64,
    frames_discarded: AtomicU64,
}

impl Counters {
    fn snapshot(&self) -> StreamStats {
        StreamStats {
            connect_attempts: self.connect_attempts.load(Ordering::Relaxed),
            connections_opened: self.connections_opened.load(Ordering::Relaxed),
            frames_discarded: self.frames_discarded.load(Ordering::Relaxed),
        }
    }
}

/// Opportunistic outbound channel.
///
/// A message goes out only if the stream is `Open` when `send` is called.
/// Otherwise it is dropped; nothing is queued for a later connection.
#[derive(Debug, Clone)]
pub struct OutboundSender {
    tx: mpsc::UnboundedSender<String>,
    state: watch::Receiver<ConnectionState>,
}

impl OutboundSender {
    /// Returns whether the message was handed to the open connection.
    pub fn send(&self, message: impl Into<String>) -> bool {
        if !self.state.borrow().is_open() {
            debug!("stream not open, dropping outbound message");
            return false;
        }
        self.tx.send(message.into()).is_ok()
    }
}

/// Owner's handle on a running stream manager. Dropping it tears the
/// stream down.
pub struct StreamHandle {
    events: mpsc::Receiver<StreamEvent>,
    state: watch::Receiver<ConnectionState>,
    outbound: OutboundSender,
    counters: Arc<Counters>,
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

impl StreamHandle {
    /// Next event, or `None` once the manager has stopped.
    pub async fn next_event(&mut self) -> Option<StreamEvent> {
        self.events.recv().await
    }

    pub fn state(&self) -> ConnectionState {
        *self.state.borrow()
    }

    pub fn state_watch(&self) -> watch::Receiver<ConnectionState> {
        self.state.clone()
    }

    pub fn outbound(&self) -> OutboundSender {
        self.outbound.clone()
    }

    pub fn stats(&self) -> StreamStats {
        self.counters.snapshot()
    }

    /// Close the connection, stop the reconnect timer, and wait for the
    /// manager task to exit.
    pub async fn shutdown(mut self) {
        self.cancel.cancel();
        if let Err(e) = (&mut self.task).await {
            warn!(error = %e, "stream task ended abnormally");
        }
    }
}

impl Drop for StreamHandle {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

/// Start a stream manager. It stops when `cancel` (or the returned handle)
/// is cancelled.
pub fn spawn_stream(config: StreamConfig, cancel: CancellationToken) -> StreamHandle {
    let cancel = cancel.child_token();
    let (events_tx, events) = mpsc::channel(EVENT_CHANNEL_CAPACITY);
    let (state_tx, state) = watch::channel(ConnectionState::Connecting);
    let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();
    let counters = Arc::new(Counters::default());

    let manager = StreamManager {
        config,
        events: events_tx,
        state: state_tx,
        outbound: outbound_rx,
        counters: Arc::clone(&counters),
        cancel: cancel.clone(),
    };
    let task = tokio::spawn(manager.run());

    StreamHandle {
        events,
        outbound: OutboundSender {
            tx: outbound_tx,
            state: state.clone(),
        },
        state,
        counters,
        cancel,
        task,
    }
}

/// Why a connection ended.
enum Disconnect {
    /// Owner went away or cancelled; do not reconnect.
    Teardown,
    Lost(StreamError),
}

struct StreamManager {
    config: StreamConfig,
    events: mpsc::Sender<StreamEvent>,
    state: watch::Sender<ConnectionState>,
    outbound: mpsc::UnboundedReceiver<String>,
    counters: Arc<Counters>,
    cancel: CancellationToken,
}

impl StreamManager {
    async fn run(mut self) {
        let url = self.config.url.clone();
        loop {
            if !self.transition(ConnectionState::Connecting).await {
                break;
            }
            // Anything accepted while the previous connection was dying is stale.
            while self.outbound.try_recv().is_ok() {}

            let attempt = self.counters.connect_attempts.fetch_add(1, Ordering::Relaxed) + 1;
            let connected = tokio::select! {
                _ = self.cancel.cancelled() => break,
                result = self.connect() => result,
            };

            match connected {
                Ok(ws) => {
                    self.counters.connections_opened.fetch_add(1, Ordering::Relaxed);
                    metrics::record_connect("ok");
                    info!(%url, attempt, "job stream connected");
                    if !self.transition(ConnectionState::Open).await {
                        break;
                    }
                    match self.pump(ws).await {
                        Disconnect::Teardown => break,
                        Disconnect::Lost(e) => warn!(%url, error = %e, "job stream disconnected"),
                    }
                }
                Err(e) => {
                    metrics::record_connect("error");
                    warn!(%url, attempt, error = %e, "job stream connect failed");
                }
            }

            if !self.transition(ConnectionState::Closed).await {
                break;
            }
            debug!(
                delay_ms = self.config.reconnect_delay.as_millis() as u64,
                "scheduling stream reconnect"
            );
            tokio::select! {
                _ = self.cancel.cancelled() => break,
                _ = tokio::time::sleep(self.config.reconnect_delay) => {}
            }
        }

        self.state.send_replace(ConnectionState::Closed);
        info!(%url, "job stream stopped");
    }

    async fn connect(&self) -> Result<WsStream, StreamError> {
        let url = self.config.url.as_str();
        match tokio::time::timeout(self.config.connect_timeout, connect_async(url)).await {
            Ok(Ok((ws, _response))) => Ok(ws),
            Ok(Err(e)) => Err(StreamError::Connect {
                url: url.to_owned(),
                message: e.to_string(),
            }),
            Err(_) => Err(StreamError::ConnectTimeout {
                url: url.to_owned(),
                timeout_ms: self.config.connect_timeout.as_millis() as u64,
            }),
        }
    }

    /// Read frames and write outbound messages until the connection ends.
    async fn pump(&mut self, ws: WsStream) -> Disconnect {
        let (mut sink, mut frames) = ws.split();
        loop {
            tokio::select! {
                _ = self.cancel.cancelled() => {
                    let _ = tokio::time::timeout(CLOSE_GRACE, sink.close()).await;
                    return Disconnect::Teardown;
                }
                Some(message) = self.outbound.recv() => {
                    if let Err(e) = sink.send(Message::Text(message.into())).await {
                        return Disconnect::Lost(StreamError::Transport(e.to_string()));
                    }
                }
                frame = frames.next() => match frame {
                    Some(Ok(Message::Text(text))) => {
                        if let Some(record) = self.decode(text.as_str()) {
                            if !self.emit(StreamEvent::Job(record)).await {
                                let _ = tokio::time::timeout(CLOSE_GRACE, sink.close()).await;
                                return Disconnect::Teardown;
                            }
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => {
                        return Disconnect::Lost(StreamError::ClosedByPeer);
                    }
                    // Pings are answered by tungstenite; binary frames carry nothing for us.
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        return Disconnect::Lost(StreamError::Transport(e.to_string()));
                    }
                }
            }
        }
    }

    /// A bad frame is reported and dropped; it never closes the connection.
    fn decode(&self, text: &str) -> Option<JobRecord> {
        let reason = match Envelope::decode(text) {
            Ok(StreamMessage::JobUpdate(record)) => return Some(record),
            Ok(StreamMessage::Heartbeat) => {
                trace!("stream heartbeat");
                return None;
            }
            Err(DecodeError::UnsupportedType(kind)) => {
                debug!(kind = %kind, "ignoring unsupported stream envelope");
                "unsupported_type"
            }
            Err(DecodeError::InvalidEnvelope(e)) => {
                warn!(error = %e, "discarding invalid stream frame");
                "invalid_envelope"
            }
            Err(DecodeError::Record(e)) => {
                warn!(job_id = e.job_id(), error = %e, "discarding malformed job update");
                metrics::record_dropped("stream");
                "malformed_record"
            }
        };
        self.counters.frames_discarded.fetch_add(1, Ordering::Relaxed);
        metrics::record_frame_discarded(reason);
        None
    }

    /// Publish a new state, then tell the owner. Returns `false` when the
    /// owner is gone or the stream is being torn down.
    async fn transition(&self, state: ConnectionState) -> bool {
        self.state.send_replace(state);
        self.emit(StreamEvent::State(state)).await
    }

    async fn emit(&self, event: StreamEvent) -> bool {
        tokio::select! {
            _ = self.cancel.cancelled() => false,
            sent = self.events.send(event) => sent.is_ok(),
        }
    }
}
