//! Per-entity event log
//!
//! Each entity owns an append-only list of events behind its own mutex.
//! Operations on one entity are serialized; different entities never contend.
//!
//! Outside the crate a log is read-only. New events go through
//! [`EventDirectory`](super::EventDirectory), which fans them out to
//! subscribers; the live sequence is never handed out mutably:
//!
//! ```compile_fail
//! use membership_ledger::EventDirectory;
//!
//! let directory = EventDirectory::new();
//! let id = directory.create_entity();
//! directory.log(id).unwrap().with_lock(|events| events.clear());
//! ```

use parking_lot::Mutex;

use super::subscriber::EventSubscriber;
use crate::types::Event;

/// Ordered, append-only event sequence of a single entity
#[derive(Debug, Default)]
pub struct EntityLog {
    events: Mutex<Vec<Event>>,
}

impl EntityLog {
    /// Create an empty log
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `f` against the live event sequence under the entity's lock
    ///
    /// The lock is released when `f` returns, and `f`'s result is handed back.
    pub(crate) fn with_lock<R>(&self, f: impl FnOnce(&mut Vec<Event>) -> R) -> R {
        let mut events = self.events.lock();
        f(&mut events)
    }

    /// Deliver every stored event to `subscriber`, in log order
    ///
    /// Holds the lock for the duration, so no event is appended mid-replay.
    pub fn replay(&self, subscriber: &dyn EventSubscriber) -> usize {
        self.with_lock(|events| {
            events.iter().for_each(|event| subscriber.process(event));
            events.len()
        })
    }

    /// Number of stored events
    pub fn len(&self) -> usize {
        self.events.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Copy of the current history
    pub fn history(&self) -> Vec<Event> {
        self.events.lock().clone()
    }
}
