// crates/types/src/lib.rs
//! Wire and domain types shared by the job dashboard crates.
//!
//! Everything here is a pure data contract: job records and their status
//! lifecycle, the `{type, data}` stream envelope, and the connection state
//! enumeration. Decoding is lenient where the backend may evolve (unknown
//! statuses) and strict where the dashboard would otherwise show garbage
//! (missing ids, unparseable timestamps).

pub mod connection;
pub mod envelope;
pub mod error;
pub mod job;

pub use connection::ConnectionState;
pub use envelope::{Envelope, StreamMessage, JOB_STATUS_UPDATE, SERVER_HEARTBEAT};
pub use error::{DecodeError, MalformedRecord};
pub use job::{JobRecord, JobStatus};
