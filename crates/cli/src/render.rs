//! Plain-text rendering of the job projection.

use std::fmt::Write as _;

use chrono::{DateTime, Utc};
use job_dashboard_core::{Projection, StatusCounts};
use job_dashboard_types::{ConnectionState, JobRecord};

pub const LOADING: &str = "Loading jobs...";
pub const EMPTY: &str = "No jobs found.";

const ID_PREFIX_CHARS: usize = 8;
const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
const NOT_AVAILABLE: &str = "N/A";

/// Header line, a blank line, then the table.
pub fn screen(projection: &Projection, state: ConnectionState) -> String {
    format!(
        "{}\n\n{}",
        header(state, &projection.status_counts()),
        table(projection)
    )
}

pub fn header(state: ConnectionState, counts: &StatusCounts) -> String {
    format!(
        "Job Dashboard [{state}] {} jobs: {} queued, {} running, {} completed, {} failed",
        counts.total(),
        counts.queued,
        counts.running,
        counts.completed,
        counts.failed
    )
}

pub fn table(projection: &Projection) -> String {
    if !projection.is_seeded() && projection.is_empty() {
        return LOADING.to_string();
    }
    if projection.is_empty() {
        return EMPTY.to_string();
    }

    let mut out = format!(
        "{:<11}  {:<16}  {:<9}  {:<19}  {:<19}  {}\n",
        "ID", "TYPE", "STATUS", "CREATED", "FINISHED", "RESULT"
    );
    for job in projection.jobs() {
        let _ = writeln!(out, "{}", row(job));
    }
    out.truncate(out.trim_end().len());
    out
}

pub fn row(job: &JobRecord) -> String {
    format!(
        "{:<11}  {:<16}  {:<9}  {:<19}  {:<19}  {}",
        short_id(&job.id),
        job.job_type,
        job.status.as_str(),
        time(Some(job.created_at)),
        time(job.finished_at),
        job.result
            .as_ref()
            .map(|v| v.to_string())
            .unwrap_or_else(|| NOT_AVAILABLE.to_string())
    )
}

fn short_id(id: &str) -> String {
    let prefix: String = id.chars().take(ID_PREFIX_CHARS).collect();
    format!("{prefix}...")
}

fn time(at: Option<DateTime<Utc>>) -> String {
    at.map(|t| t.format(TIME_FORMAT).to_string())
        .unwrap_or_else(|| NOT_AVAILABLE.to_string())
}
