// crates/types/src/envelope.rs
//! The `{ "type": ..., "data": ... }` wrapper around every streamed frame.

use serde::Deserialize;
use serde_json::Value;

use crate::error::DecodeError;
use crate::job::JobRecord;

/// Envelope type carrying one job object in `data`.
pub const JOB_STATUS_UPDATE: &str = "JobStatusUpdate";
/// Keep-alive envelope the backend may emit; carries no data.
pub const SERVER_HEARTBEAT: &str = "ServerHeartbeat";

#[derive(Debug, Clone, Deserialize)]
pub struct Envelope {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub data: Value,
}

/// A frame the dashboard knows how to act on.
#[derive(Debug, Clone, PartialEq)]
pub enum StreamMessage {
    JobUpdate(JobRecord),
    Heartbeat,
}

impl Envelope {
    pub fn parse(text: &str) -> Result<Self, DecodeError> {
        serde_json::from_str(text).map_err(|e| DecodeError::InvalidEnvelope(e.to_string()))
    }

    pub fn into_message(self) -> Result<StreamMessage, DecodeError> {
        match self.kind.as_str() {
            JOB_STATUS_UPDATE => Ok(StreamMessage::JobUpdate(JobRecord::from_wire(self.data)?)),
            SERVER_HEARTBEAT => Ok(StreamMessage::Heartbeat),
            _ => Err(DecodeError::UnsupportedType(self.kind)),
        }
    }

    /// Parse a text frame and interpret it in one step.
    pub fn decode(text: &str) -> Result<StreamMessage, DecodeError> {
        Self::parse(text)?.into_message()
    }
}
