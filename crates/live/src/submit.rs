//! Job submission client (`POST {api_url}/jobs`).
//!
//! The created job is returned to the caller but not applied to any store:
//! it reaches the dashboard through the snapshot or stream like every other
//! job.

use job_dashboard_core::{DashboardConfig, SubmitError};
use job_dashboard_types::JobRecord;
use serde::Serialize;
use serde_json::Value;
use tracing::info;

use crate::snapshot::http_client;

#[derive(Debug, Serialize)]
struct CreateJobRequest<'a> {
    job_type: &'a str,
    payload: &'a Value,
}

#[derive(Debug, Clone)]
pub struct JobSubmitter {
    client: reqwest::Client,
    url: String,
}

impl JobSubmitter {
    pub fn new(config: &DashboardConfig) -> Result<Self, SubmitError> {
        let url = config.jobs_url();
        let client = http_client(config).map_err(|e| SubmitError::Transport {
            url: url.clone(),
            message: e.to_string(),
        })?;
        Ok(Self { client, url })
    }

    pub async fn submit(&self, job_type: &str, payload: &Value) -> Result<JobRecord, SubmitError> {
        let transport = |e: reqwest::Error| SubmitError::Transport {
            url: self.url.clone(),
            message: e.to_string(),
        };

        let response = self
            .client
            .post(&self.url)
            .json(&CreateJobRequest { job_type, payload })
            .send()
            .await
            .map_err(transport)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SubmitError::Status {
                url: self.url.clone(),
                status: status.as_u16(),
                body,
            });
        }

        let created: Value = response.json().await.map_err(transport)?;
        let job = JobRecord::from_wire(created)?;
        info!(job_id = %job.id, job_type = %job.job_type, "job submitted");
        Ok(job)
    }
}
