//! Shared fixtures: a local WebSocket backend and job JSON builders.
#![allow(dead_code)]

use std::future::Future;
use std::time::Duration;

use serde_json::{json, Value};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tokio_tungstenite::WebSocketStream;

pub const WAIT: Duration = Duration::from_secs(5);

/// Minimal stand-in for the scheduler's `/ws` endpoint. Each accepted
/// connection is handed to the test through [`WsBackend::accept`].
pub struct WsBackend {
    pub base_url: String,
    conns: mpsc::UnboundedReceiver<WebSocketStream<TcpStream>>,
}

impl WsBackend {
    pub async fn start() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let (tx, conns) = mpsc::unbounded_channel();
        tokio::spawn(async move {
            while let Ok((tcp, _)) = listener.accept().await {
                if let Ok(ws) = tokio_tungstenite::accept_async(tcp).await {
                    if tx.send(ws).is_err() {
                        break;
                    }
                }
            }
        });
        Self {
            base_url: format!("ws://{addr}"),
            conns,
        }
    }

    pub fn stream_url(&self) -> String {
        format!("{}/ws", self.base_url)
    }

    pub async fn accept(&mut self) -> WebSocketStream<TcpStream> {
        within(self.conns.recv()).await.expect("backend listener stopped")
    }
}

/// A stream URL nothing listens on.
pub async fn dead_stream_url() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("ws://{addr}/ws")
}

/// A stream URL whose listener accepts TCP but never answers the
/// WebSocket handshake.
pub async fn stalled_stream_url() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let mut held = Vec::new();
        while let Ok((tcp, _)) = listener.accept().await {
            held.push(tcp);
        }
    });
    format!("ws://{addr}/ws")
}

pub fn job_json(id: &str, status: &str, created_at: &str) -> Value {
    json!({
        "id": id,
        "job_type": "process_data",
        "payload": {"user_id": 101},
        "status": status,
        "created_at": created_at,
        "started_at": null,
        "finished_at": null,
        "result": null,
        "worker_id": null,
    })
}

pub fn update_frame(id: &str, status: &str, created_at: &str) -> String {
    json!({"type": "JobStatusUpdate", "data": job_json(id, status, created_at)}).to_string()
}

pub async fn within<F: Future>(fut: F) -> F::Output {
    tokio::time::timeout(WAIT, fut)
        .await
        .expect("timed out waiting for the dashboard")
}
