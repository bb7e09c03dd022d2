//! Network side of the job dashboard: the snapshot loader, the update stream
//! manager, job submission, and the session that wires them to the
//! reconciliation store.

pub mod metrics;
pub mod session;
pub mod snapshot;
pub mod stream;
pub mod submit;

pub use session::DashboardSession;
pub use snapshot::{decode_snapshot, SnapshotLoader};
pub use stream::{
    spawn_stream, OutboundSender, StreamConfig, StreamEvent, StreamHandle, StreamStats,
};
pub use submit::JobSubmitter;
