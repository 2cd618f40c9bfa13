//! Event Directory - entity id to event log mapping
//!
//! The directory is a [`GrowableArray`] of entity logs indexed by entity id.
//! Ids are handed out densely from 0 by the array's `push` and are never
//! reused. Every accepted event is fanned out to the registered subscribers
//! while the entity's lock is still held, so subscribers see each entity's
//! events in exactly the order they were appended.

use std::sync::Arc;

use parking_lot::RwLock;
use rayon::prelude::*;

use super::config::StoreConfig;
use super::entity_log::EntityLog;
use super::subscriber::EventSubscriber;
use crate::concurrent::GrowableArray;
use crate::error::{StoreError, StoreResult};
use crate::types::{EntityId, Event, EventKind};

/// Maps entity ids to their event logs and owns the subscriber fan-out
pub struct EventDirectory {
    config: StoreConfig,
    logs: GrowableArray<Arc<EntityLog>>,
    subscribers: RwLock<Vec<Arc<dyn EventSubscriber>>>,
}

/// Handle given to a transaction body
///
/// Exposes the entity's history and appends new events while the entity's
/// lock is held, so a decision made from the history stays valid until the
/// transaction ends.
pub struct Transaction<'a> {
    entity_id: EntityId,
    events: &'a mut Vec<Event>,
    directory: &'a EventDirectory,
}

impl Transaction<'_> {
    /// Entity this transaction is scoped to
    pub fn entity_id(&self) -> EntityId {
        self.entity_id
    }

    /// History as of now, including events appended in this transaction
    pub fn history(&self) -> &[Event] {
        self.events.as_slice()
    }

    /// Append an event for this entity and fan it out
    pub fn append(&mut self, kind: EventKind) -> Event {
        let event = Event::new(self.entity_id, kind);
        self.directory.record(self.events, event);
        event
    }
}

impl EventDirectory {
    /// Create an empty directory with default config
    pub fn new() -> Self {
        Self::with_config(StoreConfig::default())
    }

    /// Create an empty directory with custom config
    pub fn with_config(config: StoreConfig) -> Self {
        Self {
            logs: GrowableArray::with_capacity(config.segment_capacity()),
            subscribers: RwLock::new(Vec::new()),
            config,
        }
    }

    /// Get the configuration
    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Number of entities created so far
    pub fn len(&self) -> usize {
        self.logs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.logs.is_empty()
    }

    /// Register a new entity with an empty log and return its id
    pub fn create_entity(&self) -> EntityId {
        let id = self.logs.push(Arc::new(EntityLog::new()));
        tracing::debug!(entity_id = id, "created entity");
        id
    }

    /// Look up an entity's log
    pub fn log(&self, id: EntityId) -> StoreResult<Arc<EntityLog>> {
        self.logs.get(id).map_err(|err| match err {
            StoreError::IndexFault { .. } => StoreError::NotFound(id),
            other => other,
        })
    }

    /// Append an event to its entity's log and fan it out
    ///
    /// Fails with `NotFound` if the event's entity was never created.
    pub fn append(&self, event: Event) -> StoreResult<()> {
        let log = self.log(event.entity_id)?;
        log.with_lock(|events| self.record(events, event));
        Ok(())
    }

    /// Run `f` with exclusive access to one entity's log
    ///
    /// Concurrent transactions on the same entity are mutually exclusive;
    /// transactions on different entities run in parallel.
    pub fn with_transaction<R>(
        &self,
        id: EntityId,
        f: impl FnOnce(&mut Transaction<'_>) -> R,
    ) -> StoreResult<R> {
        let log = self.log(id)?;
        Ok(log.with_lock(|events| {
            let mut tx = Transaction {
                entity_id: id,
                events,
                directory: self,
            };
            f(&mut tx)
        }))
    }

    /// Replay every entity's history to `subscriber`, then register it for
    /// live events
    ///
    /// Writers running concurrently with `subscribe` may cause an event to be
    /// delivered both by replay and by fan-out. Subscribe before writers
    /// start, or make the subscriber idempotent.
    pub fn subscribe(&self, subscriber: Arc<dyn EventSubscriber>) -> StoreResult<()> {
        let entities = self.logs.len();
        let replay = |id: EntityId| -> StoreResult<usize> {
            Ok(self.logs.get(id)?.replay(subscriber.as_ref()))
        };

        let replayed: usize = if self.config.parallel_replay {
            (0..entities).into_par_iter().map(replay).sum::<StoreResult<usize>>()?
        } else {
            (0..entities).map(replay).sum::<StoreResult<usize>>()?
        };

        let mut subscribers = self.subscribers.write();
        subscribers.push(subscriber);
        tracing::debug!(
            entities,
            replayed,
            subscribers = subscribers.len(),
            "registered subscriber"
        );
        Ok(())
    }

    /// Number of registered subscribers
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.read().len()
    }

    /// Store an event in an already locked log and deliver it
    fn record(&self, events: &mut Vec<Event>, event: Event) {
        events.push(event);
        tracing::trace!(entity_id = event.entity_id, kind = %event.kind, "appended event");
        self.fan_out(&event);
    }

    fn fan_out(&self, event: &Event) {
        for subscriber in self.subscribers.read().iter() {
            subscriber.process(event);
        }
    }
}

impl Default for EventDirectory {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for EventDirectory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventDirectory")
            .field("config", &self.config)
            .field("entities", &self.logs.len())
            .field("subscribers", &self.subscriber_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use parking_lot::Mutex;

    fn at(secs: i64) -> crate::types::Timestamp {
        Utc.timestamp_opt(secs, 0).unwrap()
    }

    #[derive(Default)]
    struct Recorder {
        seen: Mutex<Vec<Event>>,
    }

    impl EventSubscriber for Recorder {
        fn process(&self, event: &Event) {
            self.seen.lock().push(*event);
        }
    }

    #[test]
    fn test_create_entity_assigns_dense_ids() {
        let directory = EventDirectory::new();
        assert_eq!(directory.create_entity(), 0);
        assert_eq!(directory.create_entity(), 1);
        assert_eq!(directory.create_entity(), 2);
        assert_eq!(directory.len(), 3);
    }

    #[test]
    fn test_append_unknown_entity() {
        let directory = EventDirectory::new();
        directory.create_entity();

        let result = directory.append(Event::entered(5, at(1)));
        assert_eq!(result, Err(StoreError::NotFound(5)));

        let result = directory.with_transaction(1, |_| ());
        assert_eq!(result, Err(StoreError::NotFound(1)));
    }

    #[test]
    fn test_append_fans_out() {
        let directory = EventDirectory::new();
        let recorder = Arc::new(Recorder::default());
        directory.subscribe(recorder.clone()).unwrap();

        let id = directory.create_entity();
        directory.append(Event::entered(id, at(1))).unwrap();
        directory.append(Event::left(id, at(2))).unwrap();

        assert_eq!(
            *recorder.seen.lock(),
            vec![Event::entered(id, at(1)), Event::left(id, at(2))]
        );
        assert_eq!(directory.log(id).unwrap().len(), 2);
    }

    #[test]
    fn test_subscribe_replays_history() {
        let directory = EventDirectory::with_config(StoreConfig::new().with_parallel_replay(false));
        let a = directory.create_entity();
        let b = directory.create_entity();
        directory.append(Event::entered(a, at(1))).unwrap();
        directory.append(Event::entered(b, at(2))).unwrap();
        directory.append(Event::left(a, at(3))).unwrap();

        let recorder = Arc::new(Recorder::default());
        directory.subscribe(recorder.clone()).unwrap();
        assert_eq!(directory.subscriber_count(), 1);

        assert_eq!(
            *recorder.seen.lock(),
            vec![
                Event::entered(a, at(1)),
                Event::left(a, at(3)),
                Event::entered(b, at(2)),
            ]
        );

        directory.append(Event::left(b, at(4))).unwrap();
        assert_eq!(recorder.seen.lock().len(), 4);
    }

    #[test]
    fn test_parallel_replay_keeps_entity_order() {
        let directory = EventDirectory::new();
        for _ in 0..16 {
            let id = directory.create_entity();
            for s in 0..10 {
                directory.append(Event::entered(id, at(s))).unwrap();
            }
        }

        let recorder = Arc::new(Recorder::default());
        directory.subscribe(recorder.clone()).unwrap();

        let seen = recorder.seen.lock();
        assert_eq!(seen.len(), 160);
        for id in 0..16 {
            let kinds: Vec<_> = seen
                .iter()
                .filter(|e| e.entity_id == id)
                .map(|e| e.kind)
                .collect();
            let expected: Vec<_> = (0..10).map(|s| EventKind::Entered { at: at(s) }).collect();
            assert_eq!(kinds, expected);
        }
    }

    #[test]
    fn test_transaction_appends_and_fans_out() {
        let directory = EventDirectory::new();
        let recorder = Arc::new(Recorder::default());
        directory.subscribe(recorder.clone()).unwrap();
        let id = directory.create_entity();

        let admitted = directory
            .with_transaction(id, |tx| {
                if tx.history().is_empty() {
                    tx.append(EventKind::Entered { at: at(1) });
                    true
                } else {
                    false
                }
            })
            .unwrap();
        assert!(admitted);

        let admitted = directory
            .with_transaction(id, |tx| tx.history().is_empty())
            .unwrap();
        assert!(!admitted);

        assert_eq!(*recorder.seen.lock(), vec![Event::entered(id, at(1))]);
    }

    #[test]
    fn test_closure_subscriber() {
        let directory = EventDirectory::new();
        let count = Arc::new(std::sync::atomic::AtomicUsize::new(0));
        let counter = Arc::clone(&count);
        directory
            .subscribe(Arc::new(move |_: &Event| {
                counter.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
            }))
            .unwrap();

        let id = directory.create_entity();
        directory.append(Event::entered(id, at(1))).unwrap();
        assert_eq!(count.load(std::sync::atomic::Ordering::SeqCst), 1);
    }
}
