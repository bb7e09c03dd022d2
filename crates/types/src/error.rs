// crates/types/src/error.rs
use thiserror::Error;

/// A single job object that could not be turned into a [`JobRecord`].
///
/// Always recoverable: the caller drops the record, reports it, and keeps
/// processing the rest of the batch or stream.
///
/// [`JobRecord`]: crate::JobRecord
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MalformedRecord {
    #[error("job record is not a JSON object")]
    NotAnObject,

    #[error("job record is missing required field `{field}`")]
    MissingField {
        id: Option<String>,
        field: &'static str,
    },

    #[error("job record has an invalid shape: {message}")]
    InvalidShape { id: Option<String>, message: String },

    #[error("job record {id}: `{field}` is not an ISO-8601 timestamp: {value:?}")]
    InvalidTimestamp {
        id: String,
        field: &'static str,
        value: String,
    },
}

impl MalformedRecord {
    /// The job id carried by the rejected object, when it had one.
    pub fn job_id(&self) -> Option<&str> {
        match self {
            Self::NotAnObject => None,
            Self::MissingField { id, .. } | Self::InvalidShape { id, .. } => id.as_deref(),
            Self::InvalidTimestamp { id, .. } => Some(id),
        }
    }
}

/// An inbound stream frame that was discarded without touching any state.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("invalid envelope: {0}")]
    InvalidEnvelope(String),

    #[error("unsupported envelope type `{0}`")]
    UnsupportedType(String),

    #[error(transparent)]
    Record(#[from] MalformedRecord),
}
