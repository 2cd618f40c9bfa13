//! Lock-free attendance accumulator

use std::sync::atomic::{AtomicI64, AtomicU64, Ordering};

use chrono::TimeDelta;
use serde::{Deserialize, Serialize};

use crate::error::{StoreError, StoreResult};
use crate::utils::delta_from_millis;

/// Running `{total duration, attendance count}` aggregate
///
/// Only ever updated through [`accumulate`](Self::accumulate); concurrent
/// updates never lose increments.
#[derive(Debug, Default)]
pub struct StatBucket {
    total_millis: AtomicI64,
    count: AtomicU64,
}

impl StatBucket {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one attendance of the given duration
    pub fn accumulate(&self, duration: TimeDelta) {
        self.count.fetch_add(1, Ordering::AcqRel);

        let add = duration.num_milliseconds();
        let mut current = self.total_millis.load(Ordering::Acquire);
        loop {
            match self.total_millis.compare_exchange_weak(
                current,
                current.saturating_add(add),
                Ordering::AcqRel,
                Ordering::Acquire,
            ) {
                Ok(_) => break,
                Err(actual) => current = actual,
            }
        }
    }

    /// Attendance count so far
    pub fn count(&self) -> u64 {
        self.count.load(Ordering::Acquire)
    }

    /// Accumulated duration so far
    pub fn total_duration(&self) -> TimeDelta {
        delta_from_millis(self.total_millis.load(Ordering::Acquire))
    }

    /// Point-in-time copy of both fields
    ///
    /// The fields are read one after the other, so a snapshot taken during a
    /// concurrent `accumulate` may include the count but not yet the duration.
    pub fn snapshot(&self) -> BucketSnapshot {
        BucketSnapshot {
            total_duration: self.total_duration(),
            count: self.count(),
        }
    }

    /// Mean duration per attendance
    pub fn average(&self) -> StoreResult<TimeDelta> {
        self.snapshot().average()
    }
}

/// Plain copy of a [`StatBucket`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BucketSnapshot {
    #[serde(rename = "totalDurationMs", with = "crate::utils::time::millis")]
    pub total_duration: TimeDelta,
    pub count: u64,
}

impl Default for BucketSnapshot {
    fn default() -> Self {
        Self {
            total_duration: TimeDelta::zero(),
            count: 0,
        }
    }
}

impl BucketSnapshot {
    /// Mean duration per attendance; `DivideByZero` when `count` is 0
    pub fn average(&self) -> StoreResult<TimeDelta> {
        if self.count == 0 {
            return Err(StoreError::DivideByZero);
        }
        let count = i64::try_from(self.count).unwrap_or(i64::MAX);
        Ok(delta_from_millis(self.total_duration.num_milliseconds() / count))
    }
}
