//! Lock-free growable array
//!
//! The array is a singly linked chain of segments. Each segment doubles the
//! capacity of the one before it and covers the full index range `0..capacity`,
//! so a segment that fills up is *migrated*: every slot is copied into the
//! next segment before the head pointer moves forward.
//!
//! # Slot states
//!
//! ```text
//!   Empty ──append──► Occupied(v) ──put──► Occupied(v')
//!                          │
//!                     (migration)
//!                          ▼
//!                      Fixed(v) ──copy to next──► Migrated
//! ```
//!
//! `Fixed` freezes the value while it is copied, so a racing `put` fails its
//! compare-and-swap instead of being lost. `Migrated` is terminal: readers and
//! writers follow the forward link to the next segment.
//!
//! Any thread that observes a full head segment helps migrate it, so a resize
//! completes even if the thread that started it is descheduled.
//!
//! # Memory
//!
//! Segments are never freed while the array is alive (the chain only grows).
//! Slot payloads are replaced on `put` and migration, and the old payload is
//! retired through the `crossbeam` epoch collector.

use std::hint;
use std::sync::atomic::{AtomicUsize, Ordering};

use crossbeam::epoch::{self, Atomic, Guard, Owned, Shared};

use crate::error::{StoreError, StoreResult};

/// Default capacity of the first segment
pub const DEFAULT_INITIAL_CAPACITY: usize = 1;

const OCCUPIED_TAG: usize = 0;
const FIXED_TAG: usize = 1;
const MIGRATED_TAG: usize = 2;

/// Boxed slot value. The alignment leaves two low pointer bits for the marker tag.
#[repr(align(4))]
struct Payload<T>(T);

/// Decoded state of one slot
enum SlotMarker<'g, T> {
    Empty,
    Occupied(Shared<'g, Payload<T>>),
    Fixed(Shared<'g, Payload<T>>),
    Migrated,
}

impl<'g, T> SlotMarker<'g, T> {
    fn decode(raw: Shared<'g, Payload<T>>) -> Self {
        match raw.tag() {
            MIGRATED_TAG => SlotMarker::Migrated,
            _ if raw.is_null() => SlotMarker::Empty,
            FIXED_TAG => SlotMarker::Fixed(raw),
            _ => SlotMarker::Occupied(raw),
        }
    }
}

fn migrated<'g, T>() -> Shared<'g, Payload<T>> {
    Shared::null().with_tag(MIGRATED_TAG)
}

/// One generation of the chain
struct Segment<T> {
    slots: Box<[Atomic<Payload<T>>]>,
    next: Atomic<Segment<T>>,
}

impl<T> Segment<T> {
    fn with_capacity(capacity: usize) -> Self {
        Self {
            slots: (0..capacity).map(|_| Atomic::null()).collect(),
            next: Atomic::null(),
        }
    }

    fn capacity(&self) -> usize {
        self.slots.len()
    }

    fn marker<'g>(&self, index: usize, guard: &'g Guard) -> (Shared<'g, Payload<T>>, SlotMarker<'g, T>) {
        let raw = self.slots[index].load(Ordering::Acquire, guard);
        (raw, SlotMarker::decode(raw))
    }
}

/// Lock-free, dynamically resizing indexed container
///
/// Supports concurrent `get`, `put` and `push` from any number of threads.
/// There is no removal: the committed size only grows.
pub struct GrowableArray<T> {
    /// First segment, kept for teardown
    first: Atomic<Segment<T>>,
    /// Newest fully populated segment
    head: Atomic<Segment<T>>,
    /// Number of committed appends
    size: AtomicUsize,
}

impl<T> GrowableArray<T>
where
    T: Clone + Send + Sync + 'static,
{
    /// Create an empty array whose first segment holds one slot
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_INITIAL_CAPACITY)
    }

    /// Create an empty array with a custom first-segment capacity (minimum 1)
    pub fn with_capacity(capacity: usize) -> Self {
        let guard = &epoch::pin();
        let first = Owned::new(Segment::with_capacity(capacity.max(1))).into_shared(guard);
        Self {
            first: Atomic::from(first),
            head: Atomic::from(first),
            size: AtomicUsize::new(0),
        }
    }

    /// Number of committed appends
    pub fn len(&self) -> usize {
        self.size.load(Ordering::Acquire)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Capacity of the current head segment
    pub fn capacity(&self) -> usize {
        let guard = &epoch::pin();
        // SAFETY: segments are only freed in `Drop`.
        unsafe { self.head.load(Ordering::Acquire, guard).deref() }.capacity()
    }

    fn check_bounds(&self, index: usize) -> StoreResult<()> {
        let size = self.len();
        if index >= size {
            return Err(StoreError::IndexFault { index, size });
        }
        Ok(())
    }

    /// Read the value at `index`
    ///
    /// Walks forward from the head segment, following `Migrated` links. A
    /// `Fixed` slot still holds the authoritative value, so reads never wait
    /// on a migration in progress.
    pub fn get(&self, index: usize) -> StoreResult<T> {
        self.check_bounds(index)?;

        let guard = &epoch::pin();
        let mut segment = self.head.load(Ordering::Acquire, guard);

        loop {
            // SAFETY: segments are only freed in `Drop`.
            let Some(current) = (unsafe { segment.as_ref() }) else {
                segment = self.head.load(Ordering::Acquire, guard);
                continue;
            };

            if index < current.capacity() {
                match current.marker(index, guard).1 {
                    SlotMarker::Occupied(payload) | SlotMarker::Fixed(payload) => {
                        // SAFETY: the payload is retired through the epoch
                        // collector, and `guard` pins the current epoch.
                        return Ok(unsafe { payload.deref() }.0.clone());
                    }
                    SlotMarker::Migrated => {}
                    SlotMarker::Empty => {
                        hint::spin_loop();
                        segment = self.head.load(Ordering::Acquire, guard);
                        continue;
                    }
                }
            }

            segment = current.next.load(Ordering::Acquire, guard);
        }
    }

    /// Overwrite the value at `index`
    ///
    /// The last successful writer wins. A `put` that meets a slot being
    /// migrated finishes that slot's migration itself and retries in the
    /// next segment.
    pub fn put(&self, index: usize, value: T) -> StoreResult<()> {
        self.check_bounds(index)?;

        let guard = &epoch::pin();
        let mut replacement = Owned::new(Payload(value));
        let mut segment = self.head.load(Ordering::Acquire, guard);

        loop {
            // SAFETY: segments are only freed in `Drop`.
            let Some(current) = (unsafe { segment.as_ref() }) else {
                segment = self.head.load(Ordering::Acquire, guard);
                continue;
            };

            if index >= current.capacity() {
                segment = current.next.load(Ordering::Acquire, guard);
                continue;
            }

            let (raw, marker) = current.marker(index, guard);
            match marker {
                SlotMarker::Occupied(old) => {
                    match current.slots[index].compare_exchange(
                        raw,
                        replacement,
                        Ordering::AcqRel,
                        Ordering::Acquire,
                        guard,
                    ) {
                        Ok(_) => {
                            // SAFETY: `old` is unlinked; concurrent readers
                            // hold guards that keep it alive.
                            unsafe { guard.defer_destroy(old) };
                            return Ok(());
                        }
                        Err(err) => replacement = err.new,
                    }
                }
                SlotMarker::Fixed(_) => {
                    let next = current.next.load(Ordering::Acquire, guard);
                    // SAFETY: a slot is only fixed after the next segment is linked.
                    if let Some(target) = unsafe { next.as_ref() } {
                        Self::migrate_slot(current, target, index, guard);
                    }
                }
                SlotMarker::Migrated => {
                    segment = current.next.load(Ordering::Acquire, guard);
                }
                SlotMarker::Empty => {
                    hint::spin_loop();
                    segment = self.head.load(Ordering::Acquire, guard);
                }
            }
        }
    }

    /// Append a value and return its index
    ///
    /// Indices are unique and strictly increasing in commit order. When the
    /// head segment is full, the caller helps grow and migrate it before
    /// retrying.
    pub fn push(&self, value: T) -> usize {
        let guard = &epoch::pin();
        let mut pending = Owned::new(Payload(value));

        loop {
            let size = self.size.load(Ordering::Acquire);
            let head = self.head.load(Ordering::Acquire, guard);
            // SAFETY: the head is never null and segments are only freed in `Drop`.
            let segment = unsafe { head.deref() };

            if size != self.size.load(Ordering::Acquire) {
                continue;
            }

            if size < segment.capacity() {
                match segment.slots[size].compare_exchange(
                    Shared::null(),
                    pending,
                    Ordering::AcqRel,
                    Ordering::Acquire,
                    guard,
                ) {
                    Ok(_) => {
                        self.commit(size);
                        return size;
                    }
                    Err(err) => {
                        pending = err.new;
                        // Slot already claimed: make sure its owner's append
                        // is counted before retrying at the next index.
                        if !err.current.is_null() && err.current.tag() == OCCUPIED_TAG {
                            self.commit(size);
                        }
                    }
                }
                continue;
            }

            self.grow(head, guard);
        }
    }

    /// Advance the committed size past a claimed slot. Exactly one caller
    /// wins for any given `size`.
    fn commit(&self, size: usize) {
        let _ = self
            .size
            .compare_exchange(size, size + 1, Ordering::AcqRel, Ordering::Acquire);
    }

    /// Link a doubled segment after `head` (if nobody has yet), migrate every
    /// slot of `head` into it and promote it to head.
    fn grow<'g>(&self, head: Shared<'g, Segment<T>>, guard: &'g Guard) {
        // SAFETY: segments are only freed in `Drop`.
        let segment = unsafe { head.deref() };
        let mut next = segment.next.load(Ordering::Acquire, guard);

        if next.is_null() {
            let fresh = Owned::new(Segment::with_capacity(segment.capacity() * 2));
            next = match segment.next.compare_exchange(
                Shared::null(),
                fresh,
                Ordering::AcqRel,
                Ordering::Acquire,
                guard,
            ) {
                Ok(linked) => {
                    tracing::debug!(
                        from = segment.capacity(),
                        to = segment.capacity() * 2,
                        "growing array segment"
                    );
                    linked
                }
                Err(err) => err.current,
            };
        }

        // SAFETY: `next` was just loaded or linked and is never freed before `Drop`.
        let target = unsafe { next.deref() };
        for index in 0..segment.capacity() {
            Self::migrate_slot(segment, target, index, guard);
        }

        let _ = self
            .head
            .compare_exchange(head, next, Ordering::AcqRel, Ordering::Acquire, guard);
    }

    /// Move one slot from `from` into the same index of `to`.
    ///
    /// `Occupied(v) → Fixed(v)`, copy `v` into `to` if that slot is still
    /// empty, then `Fixed(v) → Migrated`. Safe to run from many threads at
    /// once: the copy lands at most once and the final transition retires the
    /// old payload exactly once.
    fn migrate_slot(from: &Segment<T>, to: &Segment<T>, index: usize, guard: &Guard) {
        let slot = &from.slots[index];

        loop {
            let (raw, marker) = from.marker(index, guard);
            match marker {
                SlotMarker::Migrated => return,
                SlotMarker::Empty => {
                    let _ = slot.compare_exchange(
                        raw,
                        migrated(),
                        Ordering::AcqRel,
                        Ordering::Acquire,
                        guard,
                    );
                }
                SlotMarker::Occupied(payload) => {
                    let _ = slot.compare_exchange(
                        raw,
                        payload.with_tag(FIXED_TAG),
                        Ordering::AcqRel,
                        Ordering::Acquire,
                        guard,
                    );
                }
                SlotMarker::Fixed(payload) => {
                    // SAFETY: a fixed payload is only retired after the slot
                    // turns `Migrated`, and `guard` pins the current epoch.
                    let value = unsafe { payload.deref() }.0.clone();
                    let _ = to.slots[index].compare_exchange(
                        Shared::null(),
                        Owned::new(Payload(value)),
                        Ordering::AcqRel,
                        Ordering::Acquire,
                        guard,
                    );

                    if slot
                        .compare_exchange(raw, migrated(), Ordering::AcqRel, Ordering::Acquire, guard)
                        .is_ok()
                    {
                        // SAFETY: the slot no longer references the payload.
                        unsafe { guard.defer_destroy(payload.with_tag(OCCUPIED_TAG)) };
                    }
                }
            }
        }
    }
}

impl<T> Default for GrowableArray<T>
where
    T: Clone + Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<T> std::fmt::Debug for GrowableArray<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GrowableArray")
            .field("len", &self.size.load(Ordering::Acquire))
            .finish_non_exhaustive()
    }
}

impl<T> Drop for GrowableArray<T> {
    fn drop(&mut self) {
        // SAFETY: `&mut self` means no other thread can reach the chain.
        unsafe {
            let guard = epoch::unprotected();
            let mut segment = self.first.load(Ordering::Relaxed, guard);

            while !segment.is_null() {
                let owned = segment.into_owned();
                for slot in owned.slots.iter() {
                    let raw = slot.load(Ordering::Relaxed, guard);
                    if !raw.is_null() {
                        drop(raw.with_tag(OCCUPIED_TAG).into_owned());
                    }
                }
                segment = owned.next.load(Ordering::Relaxed, guard);
            }
        }
    }
}
