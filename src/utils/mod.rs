//! Utility functions and helpers
//!
//! This module contains timestamp utilities shared by the statistics and
//! domain layers.

pub mod time;

pub use time::{day_of, delta_from_millis, saturating_add, truncate_to_day};
