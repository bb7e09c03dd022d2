// crates/core/src/projection.rs
//! The sorted, read-only job view and the push channel that carries it to
//! presentation layers.

use std::sync::Arc;

use job_dashboard_types::{JobRecord, JobStatus};
use tokio::sync::watch;

/// Sorted snapshot of every known job.
///
/// Ordered by `created_at` descending, ties broken by `id` ascending.
/// Cloning is cheap: the job list is shared and never mutated in place.
#[derive(Debug, Clone)]
pub struct Projection {
    jobs: Arc<[JobRecord]>,
    revision: u64,
    seeded: bool,
}

/// Number of jobs per status, for header summaries.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatusCounts {
    pub queued: usize,
    pub running: usize,
    pub completed: usize,
    pub failed: usize,
}

impl StatusCounts {
    pub fn total(&self) -> usize {
        self.queued + self.running + self.completed + self.failed
    }
}

impl Projection {
    pub fn empty() -> Self {
        Self {
            jobs: Arc::from(Vec::<JobRecord>::new()),
            revision: 0,
            seeded: false,
        }
    }

    /// Sort `jobs` into display order and wrap them.
    pub(crate) fn build(mut jobs: Vec<JobRecord>, revision: u64, seeded: bool) -> Self {
        jobs.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| a.id.cmp(&b.id))
        });
        Self {
            jobs: Arc::from(jobs),
            revision,
            seeded,
        }
    }

    pub fn jobs(&self) -> &[JobRecord] {
        &self.jobs
    }

    /// Bumped on every successful seed or apply.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Whether a snapshot has landed. An unseeded empty projection means
    /// "still loading", not "no jobs".
    pub fn is_seeded(&self) -> bool {
        self.seeded
    }

    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }

    pub fn status_counts(&self) -> StatusCounts {
        self.jobs
            .iter()
            .fold(StatusCounts::default(), |mut counts, job| {
                match job.status {
                    JobStatus::Queued => counts.queued += 1,
                    JobStatus::Running => counts.running += 1,
                    JobStatus::Completed => counts.completed += 1,
                    JobStatus::Failed => counts.failed += 1,
                }
                counts
            })
    }
}

impl Default for Projection {
    fn default() -> Self {
        Self::empty()
    }
}

/// Cloneable handle through which projections are published and observed.
///
/// The store publishes; any number of presentation layers subscribe. A slow
/// subscriber only ever sees the most recent projection.
#[derive(Debug, Clone)]
pub struct ProjectionPublisher {
    tx: Arc<watch::Sender<Projection>>,
}

impl ProjectionPublisher {
    pub fn new() -> Self {
        let (tx, _) = watch::channel(Projection::empty());
        Self { tx: Arc::new(tx) }
    }

    /// Register a new subscriber. Its first [`next`](ProjectionSubscription::next)
    /// resolves immediately with the current projection.
    pub fn subscribe(&self) -> ProjectionSubscription {
        let mut rx = self.tx.subscribe();
        rx.mark_changed();
        ProjectionSubscription { rx }
    }

    pub fn current(&self) -> Projection {
        self.tx.borrow().clone()
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }

    pub(crate) fn publish(&self, projection: Projection) {
        self.tx.send_replace(projection);
    }
}

impl Default for ProjectionPublisher {
    fn default() -> Self {
        Self::new()
    }
}

/// A registered projection observer. Dropping it unregisters.
#[derive(Debug)]
pub struct ProjectionSubscription {
    rx: watch::Receiver<Projection>,
}

impl ProjectionSubscription {
    /// Wait for the next projection. Returns `None` once the publisher and
    /// every clone of it are gone.
    pub async fn next(&mut self) -> Option<Projection> {
        self.rx.changed().await.ok()?;
        Some(self.rx.borrow_and_update().clone())
    }

    /// Latest projection without waiting or marking it seen.
    pub fn latest(&self) -> Projection {
        self.rx.borrow().clone()
    }

    /// Whether a projection newer than the last one returned by `next` exists.
    pub fn has_update(&self) -> bool {
        self.rx.has_changed().unwrap_or(false)
    }

    pub fn unsubscribe(self) {}
}
