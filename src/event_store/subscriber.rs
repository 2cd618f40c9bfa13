//! Event subscribers
//!
//! A subscriber is handed every accepted event synchronously, on the thread
//! that appended it. A slow subscriber therefore stalls the writer.

use crate::types::Event;

/// Receives events from an [`EventDirectory`](super::EventDirectory)
///
/// `process` runs while the event's entity lock is held, and that lock is not
/// reentrant. A subscriber must not append to, transact on, or replay the
/// same entity from inside `process`; doing so deadlocks the calling thread.
/// Hand such work to another thread instead.
pub trait EventSubscriber: Send + Sync {
    /// Handle one event. Called once per event in per-entity log order.
    fn process(&self, event: &Event);
}

impl<F> EventSubscriber for F
where
    F: Fn(&Event) + Send + Sync,
{
    fn process(&self, event: &Event) {
        self(event)
    }
}
