//! End-to-end: snapshot seed, live updates, and teardown through one session.

mod common;

use std::time::Duration;

use common::{job_json, update_frame, within, WsBackend};
use futures_util::{SinkExt, StreamExt};
use job_dashboard_core::{DashboardConfig, FetchError, Projection};
use job_dashboard_live::DashboardSession;
use job_dashboard_types::{ConnectionState, JobStatus};
use pretty_assertions::assert_eq;
use serde_json::json;
use tokio_tungstenite::tungstenite::Message;

fn config(api_url: String, ws_url: String) -> DashboardConfig {
    DashboardConfig {
        api_url,
        ws_url,
        reconnect_delay: Duration::from_millis(100),
        connect_timeout: Duration::from_secs(2),
        request_timeout: Duration::from_secs(2),
    }
}

fn summary(projection: &Projection) -> Vec<(String, JobStatus)> {
    projection
        .jobs()
        .iter()
        .map(|r| (r.id.clone(), r.status))
        .collect()
}

async fn wait_open(session: &DashboardSession) {
    let mut state = session.connection_state();
    within(state.wait_for(|s| s.is_open())).await.unwrap();
}

#[tokio::test]
async fn snapshot_then_stream_updates_reconcile() {
    let mut rest = mockito::Server::new_async().await;
    rest.mock("GET", "/jobs")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(json!([job_json("a", "QUEUED", "2024-01-01T00:00:00Z")]).to_string())
        .create_async()
        .await;
    let mut backend = WsBackend::start().await;

    let session = DashboardSession::start(config(rest.url(), backend.base_url.clone())).unwrap();
    let mut projections = session.subscribe();
    let initial = within(projections.next()).await.unwrap();
    assert!(initial.is_empty());
    assert!(!initial.is_seeded());

    let mut conn = backend.accept().await;
    wait_open(&session).await;

    assert_eq!(session.load_snapshot().await.unwrap(), 1);
    let seeded = session.projection();
    assert!(seeded.is_seeded());
    assert_eq!(summary(&seeded), vec![("a".to_string(), JobStatus::Queued)]);

    conn.send(Message::Text(update_frame("a", "RUNNING", "2024-01-01T00:00:00Z").into()))
        .await
        .unwrap();
    conn.send(Message::Text(update_frame("b", "QUEUED", "2024-01-01T00:05:00Z").into()))
        .await
        .unwrap();

    let settled = within(async {
        loop {
            let projection = projections.next().await.unwrap();
            if projection.len() == 2 && projection.jobs()[1].status == JobStatus::Running {
                return projection;
            }
        }
    })
    .await;

    assert_eq!(
        summary(&settled),
        vec![
            ("b".to_string(), JobStatus::Queued),
            ("a".to_string(), JobStatus::Running),
        ]
    );
    assert!(settled.revision() > seeded.revision());
    let counts = settled.status_counts();
    assert_eq!((counts.queued, counts.running), (1, 1));

    session.shutdown().await;
}

#[tokio::test]
async fn failed_snapshot_leaves_store_unseeded() {
    let mut rest = mockito::Server::new_async().await;
    rest.mock("GET", "/jobs")
        .with_status(503)
        .create_async()
        .await;
    let mut backend = WsBackend::start().await;

    let session = DashboardSession::start(config(rest.url(), backend.base_url.clone())).unwrap();
    let _conn = backend.accept().await;

    let err = session.load_snapshot().await.unwrap_err();
    assert!(matches!(err, FetchError::Status { status: 503, .. }));

    let projection = session.projection();
    assert!(!projection.is_seeded());
    assert_eq!(projection.revision(), 0);
    assert!(projection.is_empty());

    session.shutdown().await;
}

#[tokio::test]
async fn connection_events_report_reconnects() {
    let rest = mockito::Server::new_async().await;
    let mut backend = WsBackend::start().await;

    let session = DashboardSession::start(config(rest.url(), backend.base_url.clone())).unwrap();
    let mut events = session.connection_events();

    let first = backend.accept().await;
    wait_open(&session).await;
    drop(first);
    let _second = backend.accept().await;

    let mut seen = Vec::new();
    while seen.last() != Some(&ConnectionState::Open) || seen.len() < 3 {
        seen.push(within(events.recv()).await.unwrap());
    }
    assert!(seen.ends_with(&[
        ConnectionState::Closed,
        ConnectionState::Connecting,
        ConnectionState::Open,
    ]));

    session.shutdown().await;
}

#[tokio::test]
async fn send_reaches_backend_and_shutdown_closes_stream() {
    let rest = mockito::Server::new_async().await;
    let mut backend = WsBackend::start().await;

    let session = DashboardSession::start(config(rest.url(), backend.base_url.clone())).unwrap();
    let state = session.connection_state();
    let mut conn = backend.accept().await;
    wait_open(&session).await;

    assert!(session.send(r#"{"type":"Ping"}"#));
    let received = within(conn.next()).await.unwrap().unwrap();
    assert_eq!(received, Message::Text(r#"{"type":"Ping"}"#.into()));

    within(session.shutdown()).await;
    assert_eq!(*state.borrow(), ConnectionState::Closed);

    loop {
        match within(conn.next()).await {
            Some(Ok(Message::Close(_))) | None | Some(Err(_)) => break,
            Some(Ok(_)) => continue,
        }
    }
}
