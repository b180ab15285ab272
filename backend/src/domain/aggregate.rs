//! Per-aggregate buffer of recorded domain events.

use std::mem;

/// Ordered, append-only event queue owned by one aggregate.
///
/// Aggregates compose a `DomainEvents` field, record events while an
/// operation runs and hand the flushed events to the publisher once the
/// change has been persisted.
///
/// ## Invariants
/// - `flush` returns events in the order they were recorded.
/// - After `flush` the buffer is empty.
///
/// # Examples
/// ```
/// use switchboard::domain::DomainEvents;
///
/// let mut events = DomainEvents::default();
/// events.record("created");
/// events.record("renamed");
/// assert_eq!(events.flush(), vec!["created", "renamed"]);
/// assert!(events.flush().is_empty());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DomainEvents<E> {
    pending: Vec<E>,
}

impl<E> Default for DomainEvents<E> {
    fn default() -> Self {
        Self {
            pending: Vec::new(),
        }
    }
}

impl<E> DomainEvents<E> {
    /// Append `event`. Nothing is published until [`DomainEvents::flush`].
    pub fn record(&mut self, event: E) {
        self.pending.push(event);
    }

    /// Drain the buffer in recorded order.
    pub fn flush(&mut self) -> Vec<E> {
        mem::take(&mut self.pending)
    }

    /// Events recorded since the last flush.
    pub fn pending(&self) -> &[E] {
        &self.pending
    }

    /// True when nothing is waiting to be flushed.
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}
