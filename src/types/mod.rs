//! Data types for the membership ledger
//!
//! This module contains the event shapes stored in every entity log.

mod event;

pub use event::{Event, EventKind};

/// Dense, monotonically assigned entity index
pub type EntityId = usize;

/// Point in time carried by events
pub type Timestamp = chrono::DateTime<chrono::Utc>;
