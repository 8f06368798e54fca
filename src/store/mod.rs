//! Event store contract and the in-memory implementation.
//!
//! The store owns the ordered log. Every backend must uphold the same
//! guarantees:
//!
//! - ids are assigned from one global counter, start at 1, and follow append
//!   order with no gaps
//! - versions per aggregate run `1..=n` with no gaps or duplicates
//! - a `sink` call is all-or-nothing, including its `expected_version` check
//! - reads never observe part of a `sink` batch

mod index;
mod memory;

use crate::error::Result;
use crate::types::{AggregateId, EventId, NewEvent, StoredEvent, Version};
use std::sync::Arc;

pub use memory::InMemoryEventStore;

/// Default number of events returned by one read.
pub const DEFAULT_READ_LIMIT: usize = 1000;

/// Append-only, globally ordered event store.
pub trait EventStore: Send + Sync {
    type Event: StoredEvent;

    /// Append events for exactly one aggregate.
    ///
    /// With `expected_version`, the write only happens if the aggregate is
    /// still at that version.
    fn sink(&self, events: Vec<NewEvent>, expected_version: Option<Version>) -> Result<()>;

    /// Append a single event.
    fn sink_one(&self, event: NewEvent, expected_version: Option<Version>) -> Result<()> {
        self.sink(vec![event], expected_version)
    }

    /// Up to `limit` events with `id >= from_id`, ascending, optionally
    /// restricted to `event_types`.
    fn get_next_from(
        &self,
        from_id: EventId,
        event_types: Option<&[String]>,
        limit: usize,
    ) -> Result<Vec<Self::Event>>;

    /// Hand every matching event with `from_id <= id <= to_id` to `f`, in id
    /// order, reading [`DEFAULT_READ_LIMIT`] events at a time.
    fn each_by_range(
        &self,
        from_id: EventId,
        to_id: EventId,
        event_types: Option<&[String]>,
        f: &mut dyn FnMut(Self::Event),
    ) -> Result<()> {
        let mut cursor = from_id;

        while cursor <= to_id {
            let page = self.get_next_from(cursor, event_types, DEFAULT_READ_LIMIT)?;
            let full = page.len() == DEFAULT_READ_LIMIT;
            let Some(last) = page.last().map(StoredEvent::id) else {
                break;
            };

            for event in page {
                if event.id() > to_id {
                    return Ok(());
                }
                f(event);
            }

            if !full {
                break;
            }
            cursor = last.next();
        }

        Ok(())
    }

    /// Highest id among matching events, or [`EventId::EMPTY`].
    fn latest_event_id(&self, event_types: Option<&[String]>) -> Result<EventId>;

    /// Full history of an aggregate, in version order.
    fn get_events_for_aggregate_id(&self, aggregate_id: AggregateId) -> Result<Vec<Self::Event>>;

    /// Current version of an aggregate ([`Version::INITIAL`] if unknown).
    fn version_for(&self, aggregate_id: AggregateId) -> Result<Version>;
}

impl<S> EventStore for Arc<S>
where
    S: EventStore + ?Sized,
{
    type Event = S::Event;

    fn sink(&self, events: Vec<NewEvent>, expected_version: Option<Version>) -> Result<()> {
        (**self).sink(events, expected_version)
    }

    fn get_next_from(
        &self,
        from_id: EventId,
        event_types: Option<&[String]>,
        limit: usize,
    ) -> Result<Vec<Self::Event>> {
        (**self).get_next_from(from_id, event_types, limit)
    }

    fn each_by_range(
        &self,
        from_id: EventId,
        to_id: EventId,
        event_types: Option<&[String]>,
        f: &mut dyn FnMut(Self::Event),
    ) -> Result<()> {
        (**self).each_by_range(from_id, to_id, event_types, f)
    }

    fn latest_event_id(&self, event_types: Option<&[String]>) -> Result<EventId> {
        (**self).latest_event_id(event_types)
    }

    fn get_events_for_aggregate_id(&self, aggregate_id: AggregateId) -> Result<Vec<Self::Event>> {
        (**self).get_events_for_aggregate_id(aggregate_id)
    }

    fn version_for(&self, aggregate_id: AggregateId) -> Result<Version> {
        (**self).version_for(aggregate_id)
    }
}
