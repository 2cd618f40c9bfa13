//! Attendance statistics folded from the event stream
//!
//! The aggregator subscribes to an [`EventDirectory`] and turns each
//! `Entered`/`Left` pair into one attendance:
//! - `Entered(id, at)` records `at` as the pending enter time of `id`
//! - `Left(id, at)` closes it, adding `at - enter` to the bucket of the day
//!   the visit began and to the global bucket
//!
//! A `Left` without a pending enter is ignored; keeping enters and exits
//! balanced is the domain layer's job.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{NaiveDate, TimeDelta};
use parking_lot::RwLock;

use super::bucket::{BucketSnapshot, StatBucket};
use crate::concurrent::GrowableArray;
use crate::error::{StoreError, StoreResult};
use crate::event_store::{EventDirectory, EventSubscriber, StoreConfig};
use crate::types::{EntityId, Event, EventKind, Timestamp};
use crate::utils::day_of;

/// Running attendance statistics per day and overall
pub struct StatAggregator {
    /// Unmatched enter time per entity id
    pending: GrowableArray<Option<Timestamp>>,
    days: RwLock<HashMap<NaiveDate, Arc<StatBucket>>>,
    total: StatBucket,
}

impl StatAggregator {
    /// Create a detached aggregator with default config
    pub fn new() -> Self {
        Self::with_config(StoreConfig::default())
    }

    /// Create a detached aggregator with custom config
    pub fn with_config(config: StoreConfig) -> Self {
        Self {
            pending: GrowableArray::with_capacity(config.segment_capacity()),
            days: RwLock::new(HashMap::new()),
            total: StatBucket::new(),
        }
    }

    /// Create an aggregator and subscribe it to `directory`
    ///
    /// Existing history is replayed before this returns.
    pub fn attach(directory: &EventDirectory) -> StoreResult<Arc<Self>> {
        let aggregator = Arc::new(Self::with_config(directory.config().clone()));
        directory.subscribe(aggregator.clone())?;
        Ok(aggregator)
    }

    /// Fold one event into the statistics
    pub fn apply(&self, event: &Event) -> StoreResult<()> {
        match event.kind {
            EventKind::Entered { at } => self.record_enter(event.entity_id, at),
            EventKind::Left { at } => self.record_leave(event.entity_id, at),
            EventKind::SetUp { .. } | EventKind::Extended { .. } => Ok(()),
        }
    }

    fn record_enter(&self, id: EntityId, at: Timestamp) -> StoreResult<()> {
        self.ensure_slot(id);
        self.pending.put(id, Some(at))
    }

    fn record_leave(&self, id: EntityId, at: Timestamp) -> StoreResult<()> {
        self.ensure_slot(id);
        let Some(entered_at) = self.pending.get(id)? else {
            tracing::trace!(entity_id = id, "leave without pending enter ignored");
            return Ok(());
        };

        let duration = at - entered_at;
        self.day_bucket_entry(day_of(entered_at)).accumulate(duration);
        self.total.accumulate(duration);
        self.pending.put(id, None)
    }

    /// Grow the pending array until `id` is addressable
    fn ensure_slot(&self, id: EntityId) {
        while self.pending.len() <= id {
            self.pending.push(None);
        }
    }

    fn day_bucket_entry(&self, day: NaiveDate) -> Arc<StatBucket> {
        if let Some(bucket) = self.days.read().get(&day) {
            return Arc::clone(bucket);
        }
        Arc::clone(self.days.write().entry(day).or_default())
    }

    /// Statistics of visits that began on `day`, if any
    pub fn day_bucket(&self, day: NaiveDate) -> Option<BucketSnapshot> {
        self.days.read().get(&day).map(|bucket| bucket.snapshot())
    }

    /// Every day with at least one visit, sorted by day
    pub fn day_buckets(&self) -> Vec<(NaiveDate, BucketSnapshot)> {
        let mut days: Vec<_> = self
            .days
            .read()
            .iter()
            .map(|(day, bucket)| (*day, bucket.snapshot()))
            .collect();
        days.sort_by_key(|(day, _)| *day);
        days
    }

    /// Statistics over all visits
    pub fn global(&self) -> BucketSnapshot {
        self.total.snapshot()
    }

    /// Mean visit duration over all visits
    pub fn global_average(&self) -> StoreResult<TimeDelta> {
        self.total.average()
    }

    /// Mean number of visits per day that had any visit
    pub fn average_attendance(&self) -> StoreResult<u64> {
        let days = self.days.read().len() as u64;
        if days == 0 {
            return Err(StoreError::DivideByZero);
        }
        Ok(self.total.count() / days)
    }

    /// Pending enter time of `id`, if the entity is currently inside
    pub fn pending_enter(&self, id: EntityId) -> Option<Timestamp> {
        self.pending.get(id).ok().flatten()
    }
}

impl Default for StatAggregator {
    fn default() -> Self {
        Self::new()
    }
}

impl EventSubscriber for StatAggregator {
    fn process(&self, event: &Event) {
        if let Err(err) = self.apply(event) {
            tracing::error!(entity_id = event.entity_id, kind = %event.kind, error = %err, "failed to fold event into statistics");
        }
    }
}

impl std::fmt::Debug for StatAggregator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StatAggregator")
            .field("days", &self.days.read().len())
            .field("total", &self.total.snapshot())
            .finish()
    }
}
