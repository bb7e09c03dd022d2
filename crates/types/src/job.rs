// crates/types/src/job.rs
//! Job records and the status lifecycle reported by the scheduler backend.

use std::fmt;

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::MalformedRecord;

/// Lifecycle status of a job.
///
/// Wire values are case-insensitive (`"QUEUED"`, `"Queued"`, `"queued"`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JobStatus {
    Queued,
    Running,
    Completed,
    Failed,
}

impl JobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Queued => "QUEUED",
            JobStatus::Running => "RUNNING",
            JobStatus::Completed => "COMPLETED",
            JobStatus::Failed => "FAILED",
        }
    }

    /// `Completed` and `Failed` are the only states a job never leaves.
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Failed)
    }

    /// Strict parse. Returns `None` for values outside the four known statuses.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_uppercase().as_str() {
            "QUEUED" => Some(JobStatus::Queued),
            "RUNNING" => Some(JobStatus::Running),
            "COMPLETED" => Some(JobStatus::Completed),
            "FAILED" => Some(JobStatus::Failed),
            _ => None,
        }
    }

    /// Lenient parse used for wire records: a status this client does not
    /// know yet is displayed as `Queued`.
    pub fn from_wire(raw: &str) -> Self {
        Self::parse(raw).unwrap_or_else(|| {
            tracing::debug!(status = raw, "unrecognized job status, displaying as QUEUED");
            JobStatus::Queued
        })
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One job as last reported by the backend.
///
/// Records are replaced wholesale on update; fields are never merged across
/// two reports of the same job.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JobRecord {
    /// Opaque identifier, stable for the job's lifetime. The merge key.
    pub id: String,
    pub job_type: String,
    pub status: JobStatus,
    pub created_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    /// Only meaningful once the job is `Completed` or `Failed`.
    pub finished_at: Option<DateTime<Utc>>,
    /// Opaque result payload, present in terminal states.
    pub result: Option<Value>,
    /// Backend worker that picked the job up, if reported.
    pub worker_id: Option<String>,
}

/// Raw shape of a job object as the backend serializes it. Every field is
/// optional here so that missing fields become [`MalformedRecord`] errors
/// with a job id attached instead of opaque serde messages.
#[derive(Debug, Deserialize)]
struct WireJob {
    id: Option<String>,
    job_type: Option<String>,
    status: Option<String>,
    created_at: Option<String>,
    started_at: Option<String>,
    finished_at: Option<String>,
    result: Option<Value>,
    worker_id: Option<String>,
}

impl JobRecord {
    /// Decode one job object from its JSON wire form.
    pub fn from_wire(value: Value) -> Result<Self, MalformedRecord> {
        if !value.is_object() {
            return Err(MalformedRecord::NotAnObject);
        }
        let raw_id = value.get("id").and_then(Value::as_str).map(str::to_owned);

        let wire: WireJob =
            serde_json::from_value(value).map_err(|e| MalformedRecord::InvalidShape {
                id: raw_id.clone(),
                message: e.to_string(),
            })?;

        let id = match wire.id {
            Some(id) if !id.is_empty() => id,
            _ => {
                return Err(MalformedRecord::MissingField {
                    id: None,
                    field: "id",
                })
            }
        };
        let status = match wire.status.as_deref() {
            Some(raw) => JobStatus::from_wire(raw),
            None => {
                return Err(MalformedRecord::MissingField {
                    id: Some(id),
                    field: "status",
                })
            }
        };
        let created_at = match wire.created_at.as_deref() {
            Some(raw) => timestamp(&id, "created_at", raw)?,
            None => {
                return Err(MalformedRecord::MissingField {
                    id: Some(id),
                    field: "created_at",
                })
            }
        };
        let started_at = wire
            .started_at
            .as_deref()
            .map(|raw| timestamp(&id, "started_at", raw))
            .transpose()?;
        let finished_at = wire
            .finished_at
            .as_deref()
            .map(|raw| timestamp(&id, "finished_at", raw))
            .transpose()?;

        let record = JobRecord {
            id,
            job_type: wire.job_type.unwrap_or_default(),
            status,
            created_at,
            started_at,
            finished_at,
            result: wire.result,
            worker_id: wire.worker_id,
        };
        record.warn_on_lifecycle_skew();
        Ok(record)
    }

    /// The backend is the only writer, so inconsistencies are reported
    /// rather than rejected.
    fn warn_on_lifecycle_skew(&self) {
        if let Some(started_at) = self.started_at {
            if started_at < self.created_at {
                tracing::warn!(job_id = %self.id, "job started_at precedes created_at");
            }
        }
        if self.finished_at.is_some() && !self.status.is_terminal() {
            tracing::warn!(
                job_id = %self.id,
                status = %self.status,
                "job has finished_at but a non-terminal status"
            );
        }
    }
}

fn timestamp(id: &str, field: &'static str, raw: &str) -> Result<DateTime<Utc>, MalformedRecord> {
    parse_timestamp(raw).ok_or_else(|| MalformedRecord::InvalidTimestamp {
        id: id.to_owned(),
        field,
        value: raw.to_owned(),
    })
}

/// Parse an ISO-8601 timestamp. Offsets are honoured; zone-less values are
/// taken as UTC.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Utc));
    }
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .map(|naive| naive.and_utc())
}
