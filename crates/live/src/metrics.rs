//! Dashboard metrics.
//!
//! Recorded through the `metrics` facade. Nothing is exported unless the
//! embedding binary installs a recorder (the CLI installs the Prometheus
//! exporter when asked to).

use std::time::Duration;

use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge, histogram};

pub const RECORDS_APPLIED: &str = "job_dashboard_records_applied_total";
pub const RECORDS_DROPPED: &str = "job_dashboard_records_dropped_total";
pub const FRAMES_DISCARDED: &str = "job_dashboard_frames_discarded_total";
pub const STREAM_CONNECTS: &str = "job_dashboard_stream_connects_total";
pub const SNAPSHOT_LOADS: &str = "job_dashboard_snapshot_loads_total";
pub const SNAPSHOT_DURATION: &str = "job_dashboard_snapshot_duration_seconds";
pub const JOBS: &str = "job_dashboard_jobs";

/// Register descriptions with the installed recorder.
pub fn describe_metrics() {
    describe_counter!(RECORDS_APPLIED, "Job updates applied to the store from the stream");
    describe_counter!(
        RECORDS_DROPPED,
        "Job objects dropped because they could not be decoded"
    );
    describe_counter!(
        FRAMES_DISCARDED,
        "Inbound stream frames discarded without a state change"
    );
    describe_counter!(STREAM_CONNECTS, "Stream connect attempts by outcome");
    describe_counter!(SNAPSHOT_LOADS, "Snapshot loads by outcome");
    describe_histogram!(SNAPSHOT_DURATION, "Duration of snapshot loads in seconds");
    describe_gauge!(JOBS, "Jobs currently held by the store");
}

/// `source` is `"snapshot"` or `"stream"`.
pub fn record_dropped(source: &'static str) {
    counter!(RECORDS_DROPPED, "source" => source).increment(1);
}

pub fn record_applied() {
    counter!(RECORDS_APPLIED).increment(1);
}

pub fn record_frame_discarded(reason: &'static str) {
    counter!(FRAMES_DISCARDED, "reason" => reason).increment(1);
}

pub fn record_connect(outcome: &'static str) {
    counter!(STREAM_CONNECTS, "outcome" => outcome).increment(1);
}

pub fn record_snapshot(outcome: &'static str, duration: Duration) {
    counter!(SNAPSHOT_LOADS, "outcome" => outcome).increment(1);
    histogram!(SNAPSHOT_DURATION).record(duration.as_secs_f64());
}

pub fn set_job_count(count: usize) {
    gauge!(JOBS).set(count as f64);
}
