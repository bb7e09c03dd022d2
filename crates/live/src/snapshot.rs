//! One-shot bulk load of every job the backend currently knows about.

use std::time::Instant;

use job_dashboard_core::{DashboardConfig, FetchError};
use job_dashboard_types::JobRecord;
use serde_json::Value;
use tracing::{error, info};

use crate::metrics;

/// Build the REST client used for snapshot loads and job submission.
pub(crate) fn http_client(config: &DashboardConfig) -> reqwest::Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(config.request_timeout)
        .build()
}

/// Reads `GET {api_url}/jobs`.
///
/// Never retries on its own: the snapshot is a bootstrap, and whoever asked
/// for it decides whether and when to ask again.
#[derive(Debug, Clone)]
pub struct SnapshotLoader {
    client: reqwest::Client,
    url: String,
}

impl SnapshotLoader {
    pub fn new(config: &DashboardConfig) -> Result<Self, FetchError> {
        let url = config.jobs_url();
        let client = http_client(config).map_err(|e| FetchError::Transport {
            url: url.clone(),
            message: e.to_string(),
        })?;
        Ok(Self { client, url })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Fetch and decode the current job set, in whatever order the backend
    /// returns it. Jobs that fail to decode are dropped individually.
    pub async fn load(&self) -> Result<Vec<JobRecord>, FetchError> {
        let started = Instant::now();
        let result = self.fetch().await;
        let outcome = if result.is_ok() { "ok" } else { "error" };
        metrics::record_snapshot(outcome, started.elapsed());

        let items = result?;
        let received = items.len();
        let records = decode_snapshot(items);
        info!(
            url = %self.url,
            received,
            loaded = records.len(),
            "snapshot loaded"
        );
        Ok(records)
    }

    async fn fetch(&self) -> Result<Vec<Value>, FetchError> {
        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .map_err(|e| FetchError::Transport {
                url: self.url.clone(),
                message: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: self.url.clone(),
                status: status.as_u16(),
            });
        }

        response.json::<Vec<Value>>().await.map_err(|e| {
            if e.is_decode() {
                FetchError::Body {
                    url: self.url.clone(),
                    message: e.to_string(),
                }
            } else {
                FetchError::Transport {
                    url: self.url.clone(),
                    message: e.to_string(),
                }
            }
        })
    }
}

/// Decode a snapshot array, dropping (and reporting) each malformed element.
pub fn decode_snapshot(items: Vec<Value>) -> Vec<JobRecord> {
    items
        .into_iter()
        .enumerate()
        .filter_map(|(index, item)| match JobRecord::from_wire(item) {
            Ok(record) => Some(record),
            Err(e) => {
                error!(
                    index,
                    job_id = e.job_id(),
                    error = %e,
                    "dropping malformed snapshot record"
                );
                metrics::record_dropped("snapshot");
                None
            }
        })
        .collect()
}
