//! Error types shared by the array, the event directory and the statistics
//!
//! Every variant is a contract violation detected at the call site. Nothing
//! here is transient: the store performs no I/O, so callers are expected to
//! validate preconditions rather than retry.

use thiserror::Error;

use crate::types::EntityId;

/// Result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors that can occur in store operations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum StoreError {
    /// Array access at or beyond the committed size
    #[error("index {index} out of range for array of size {size}")]
    IndexFault { index: usize, size: usize },

    /// Event or transaction targets an entity that was never created
    #[error("entity {0} does not exist")]
    NotFound(EntityId),

    /// Average requested over zero samples
    #[error("cannot average over zero samples")]
    DivideByZero,
}
