//! Membership Ledger
//!
//! An in-memory, event-sourced membership store built on a small
//! concurrency toolkit.
//!
//! # Features
//!
//! - **Lock-Free Directory**: Entity logs live in a growable array that
//!   resizes cooperatively without locks
//! - **Per-Entity Transactions**: Check-then-act decisions run under one
//!   entity's mutex; different entities never contend
//! - **Synchronous Fan-Out**: Every accepted event reaches subscribers on the
//!   writer's thread, in per-entity order
//! - **Lock-Free Statistics**: Visit durations fold into per-day and global
//!   buckets through compare-and-swap
//!
//! # Modules
//!
//! - `concurrent`: `GrowableArray`, the lock-free segmented array
//! - `event_store`: `EntityLog`, `EventDirectory`, subscribers and config
//! - `stats`: `StatBucket` and the `StatAggregator` subscriber
//! - `services`: Membership administration and turnstile logic
//! - `types`: Event shapes
//! - `utils`: Time helpers
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use chrono::{TimeZone, Utc};
//! use membership_ledger::{EventDirectory, ManagerService, StatAggregator, TurnstileService};
//!
//! let directory = Arc::new(EventDirectory::new());
//! let stats = StatAggregator::attach(&directory).unwrap();
//! let manager = ManagerService::new(Arc::clone(&directory));
//! let turnstile = TurnstileService::new(Arc::clone(&directory));
//!
//! let t = |secs| Utc.timestamp_opt(secs, 0).unwrap();
//! let id = manager.register_membership(t(0), t(3600)).unwrap();
//! assert!(turnstile.enter(id, t(60)).unwrap());
//! assert!(turnstile.exit(id, t(120)).unwrap());
//!
//! assert_eq!(stats.global_average().unwrap(), chrono::TimeDelta::seconds(60));
//! ```

pub mod concurrent;
pub mod error;
pub mod event_store;
pub mod services;
pub mod stats;
pub mod types;
pub mod utils;

// Re-export commonly used items at crate root
pub use concurrent::GrowableArray;
pub use error::{StoreError, StoreResult};
pub use event_store::{EntityLog, EventDirectory, EventSubscriber, StoreConfig, Transaction};
pub use services::{ManagerService, MembershipInfo, TurnstileService};
pub use stats::{BucketSnapshot, StatAggregator, StatBucket};
pub use types::{EntityId, Event, EventKind, Timestamp};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");
