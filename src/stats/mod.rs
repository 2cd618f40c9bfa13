//! Attendance statistics
//!
//! - `StatBucket`: lock-free `{duration, count}` accumulator
//! - `StatAggregator`: event subscriber maintaining per-day and global buckets

mod aggregator;
mod bucket;

pub use aggregator::StatAggregator;
pub use bucket::{BucketSnapshot, StatBucket};
