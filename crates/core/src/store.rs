// crates/core/src/store.rs
//! Authoritative in-memory job collection.
//!
//! `ReconciliationStore` merges the bulk snapshot and the incremental update
//! stream into one keyed map. It is owned by a single task and mutated
//! through `&mut self`, so no locking is involved: a seed or apply runs to
//! completion before the next one starts, and the projection is rebuilt
//! before it is published. Subscribers therefore never see a torn view.

use std::collections::HashMap;

use job_dashboard_types::JobRecord;

use crate::projection::{Projection, ProjectionPublisher, ProjectionSubscription};

/// What `apply` did with a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Upsert {
    Inserted,
    Replaced,
}

#[derive(Debug)]
pub struct ReconciliationStore {
    jobs: HashMap<String, JobRecord>,
    projection: Projection,
    publisher: ProjectionPublisher,
    seeded: bool,
}

impl ReconciliationStore {
    pub fn new() -> Self {
        Self::with_publisher(ProjectionPublisher::new())
    }

    /// Build a store that publishes through an existing handle, so
    /// subscribers can register before the store is moved into its task.
    pub fn with_publisher(publisher: ProjectionPublisher) -> Self {
        Self {
            jobs: HashMap::new(),
            projection: Projection::empty(),
            publisher,
            seeded: false,
        }
    }

    pub fn subscribe(&self) -> ProjectionSubscription {
        self.publisher.subscribe()
    }

    /// Replace the whole collection with a fresh snapshot.
    ///
    /// A snapshot is authoritative: anything not in it is gone afterwards.
    /// If an id appears twice, the later element wins. Returns the number of
    /// distinct jobs now held.
    pub fn seed(&mut self, records: impl IntoIterator<Item = JobRecord>) -> usize {
        let jobs: HashMap<String, JobRecord> = records
            .into_iter()
            .map(|record| (record.id.clone(), record))
            .collect();
        let previous = std::mem::replace(&mut self.jobs, jobs);
        self.seeded = true;
        tracing::debug!(
            previous = previous.len(),
            seeded = self.jobs.len(),
            "store seeded from snapshot"
        );
        self.republish();
        self.jobs.len()
    }

    /// Insert or wholesale-replace one job. The last call for an id wins.
    pub fn apply(&mut self, record: JobRecord) -> Upsert {
        let outcome = match self.jobs.insert(record.id.clone(), record) {
            Some(_) => Upsert::Replaced,
            None => Upsert::Inserted,
        };
        self.republish();
        outcome
    }

    /// Current sorted view.
    pub fn project(&self) -> Projection {
        self.projection.clone()
    }

    pub fn get(&self, id: &str) -> Option<&JobRecord> {
        self.jobs.get(id)
    }

    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }

    pub fn is_seeded(&self) -> bool {
        self.seeded
    }

    fn republish(&mut self) {
        let revision = self.projection.revision() + 1;
        self.projection = Projection::build(
            self.jobs.values().cloned().collect(),
            revision,
            self.seeded,
        );
        self.publisher.publish(self.projection.clone());
    }
}

impl Default for ReconciliationStore {
    fn default() -> Self {
        Self::new()
    }
}
