//! Event Store Module for Event Sourcing
//!
//! This module provides the in-memory event sourcing infrastructure:
//! - `EntityLog`: Mutex-guarded, append-only history of one entity
//! - `EventDirectory`: Entity id to log mapping with subscriber fan-out
//! - `EventSubscriber`: Synchronous consumer of accepted events
//! - `StoreConfig`: Tunables for the directory and its arrays
//!
//! # Architecture
//!
//! ```text
//! Write Path:
//! ┌──────────┐    ┌──────────────────┐    ┌──────────────┐    ┌─────────────┐
//! │ Service  │───►│ with_transaction │───►│ push to log  │───►│ fan out to  │
//! │ call     │    │ (entity lock)    │    │ (under lock) │    │ subscribers │
//! └──────────┘    └──────────────────┘    └──────────────┘    └─────────────┘
//!
//! Subscribe:
//! ┌──────────────────────┐    ┌──────────────────────┐
//! │ Replay every entity  │───►│ Register for live    │───► Ready!
//! │ history (rayon)      │    │ fan-out              │
//! └──────────────────────┘    └──────────────────────┘
//! ```

mod config;
mod directory;
mod entity_log;
mod subscriber;

pub use config::{StoreConfig, ENV_INITIAL_CAPACITY, ENV_PARALLEL_REPLAY};
pub use directory::{EventDirectory, Transaction};
pub use entity_log::EntityLog;
pub use subscriber::EventSubscriber;
