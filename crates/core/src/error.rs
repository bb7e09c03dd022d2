// crates/core/src/error.rs
use thiserror::Error;

pub use job_dashboard_types::{DecodeError, MalformedRecord};

/// The snapshot load failed as a whole. The store is left untouched.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("snapshot request to {url} failed: {message}")]
    Transport { url: String, message: String },

    #[error("snapshot request to {url} returned HTTP {status}")]
    Status { url: String, status: u16 },

    #[error("snapshot from {url} is not a JSON array of jobs: {message}")]
    Body { url: String, message: String },

    /// The snapshot was fetched but the session owning the store is gone.
    #[error("dashboard session stopped before the snapshot was applied")]
    SessionStopped,
}

/// The update stream failed or closed. Always recovered by reconnecting.
#[derive(Debug, Error)]
pub enum StreamError {
    #[error("failed to connect to {url}: {message}")]
    Connect { url: String, message: String },

    #[error("connecting to {url} timed out after {timeout_ms}ms")]
    ConnectTimeout { url: String, timeout_ms: u64 },

    #[error("stream transport error: {0}")]
    Transport(String),

    #[error("stream closed by peer")]
    ClosedByPeer,
}

/// Job submission failed. Reported to whoever submitted the job.
#[derive(Debug, Error)]
pub enum SubmitError {
    #[error("job submission to {url} failed: {message}")]
    Transport { url: String, message: String },

    #[error("job submission to {url} returned HTTP {status}: {body}")]
    Status {
        url: String,
        status: u16,
        body: String,
    },

    #[error("job submission response was not a job: {0}")]
    Decode(#[from] MalformedRecord),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fetch_error_display() {
        let err = FetchError::Status {
            url: "http://localhost:8000/jobs".into(),
            status: 503,
        };
        assert_eq!(
            err.to_string(),
            "snapshot request to http://localhost:8000/jobs returned HTTP 503"
        );
    }

    #[test]
    fn test_stream_error_display() {
        let err = StreamError::ConnectTimeout {
            url: "ws://localhost:8000/ws".into(),
            timeout_ms: 250,
        };
        assert!(err.to_string().contains("250ms"));
        assert_eq!(StreamError::ClosedByPeer.to_string(), "stream closed by peer");
    }

    #[test]
    fn test_submit_error_from_malformed_record() {
        let err: SubmitError = MalformedRecord::NotAnObject.into();
        assert!(matches!(err, SubmitError::Decode(MalformedRecord::NotAnObject)));
    }
}
