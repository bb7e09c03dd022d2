// crates/types/src/connection.rs
use std::fmt;

use serde::Serialize;

/// State of the job update stream.
///
/// `Connecting → Open → Closed → Connecting → …` with no terminal state; the
/// stream manager keeps reconnecting until its session is torn down.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionState {
    #[default]
    Connecting,
    Open,
    Closed,
}

impl ConnectionState {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConnectionState::Connecting => "connecting",
            ConnectionState::Open => "open",
            ConnectionState::Closed => "closed",
        }
    }

    pub fn is_open(&self) -> bool {
        matches!(self, ConnectionState::Open)
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initial_state_is_connecting() {
        assert_eq!(ConnectionState::default(), ConnectionState::Connecting);
    }

    #[test]
    fn test_connection_state_serialize() {
        assert_eq!(
            serde_json::to_string(&ConnectionState::Open).unwrap(),
            "\"open\""
        );
        assert_eq!(ConnectionState::Closed.to_string(), "closed");
        assert!(ConnectionState::Open.is_open());
        assert!(!ConnectionState::Connecting.is_open());
    }
}
