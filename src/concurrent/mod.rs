//! Lock-free containers
//!
//! - `GrowableArray`: segment-chained array with cooperative resizing, used
//!   as the entity directory and for per-entity auxiliary state.

mod growable_array;

pub use growable_array::{GrowableArray, DEFAULT_INITIAL_CAPACITY};
