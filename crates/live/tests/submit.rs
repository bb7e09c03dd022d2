mod common;

use common::job_json;
use job_dashboard_core::{DashboardConfig, SubmitError};
use job_dashboard_live::JobSubmitter;
use job_dashboard_types::JobStatus;
use mockito::Matcher;
use pretty_assertions::assert_eq;
use serde_json::json;

fn submitter(api_url: String) -> JobSubmitter {
    JobSubmitter::new(&DashboardConfig {
        api_url,
        ..DashboardConfig::default()
    })
    .unwrap()
}

#[tokio::test]
async fn submit_posts_type_and_payload() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/jobs")
        .match_body(Matcher::Json(json!({
            "job_type": "send_email",
            "payload": {"to": "ops@example.com"},
        })))
        .with_status(201)
        .with_header("content-type", "application/json")
        .with_body(job_json("new-job", "QUEUED", "2024-01-01T00:00:00Z").to_string())
        .create_async()
        .await;

    let created = submitter(server.url())
        .submit("send_email", &json!({"to": "ops@example.com"}))
        .await
        .unwrap();

    mock.assert_async().await;
    assert_eq!(created.id, "new-job");
    assert_eq!(created.status, JobStatus::Queued);
}

#[tokio::test]
async fn rejected_submission_keeps_response_body() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("POST", "/jobs")
        .with_status(422)
        .with_body("unknown job_type")
        .create_async()
        .await;

    let err = submitter(server.url())
        .submit("bogus", &json!({}))
        .await
        .unwrap_err();
    match err {
        SubmitError::Status { status, body, .. } => {
            assert_eq!(status, 422);
            assert_eq!(body, "unknown job_type");
        }
        other => panic!("expected status failure, got {other:?}"),
    }
}

#[tokio::test]
async fn malformed_created_job_is_reported() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("POST", "/jobs")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"id":"x","status":"QUEUED"}"#)
        .create_async()
        .await;

    let err = submitter(server.url())
        .submit("process_data", &json!({}))
        .await
        .unwrap_err();
    assert!(matches!(err, SubmitError::Decode(_)));
}
