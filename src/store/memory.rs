//! In-memory event store.

use crate::body::{BodyEncoder, JsonEncoder};
use crate::builder::{DefaultEventBuilder, EventBuilder, EventFields};
use crate::error::{Result, StoreError};
use crate::types::{AggregateId, EventId, NewEvent, StoredEvent, Timestamp, Version};
use parking_lot::RwLock;
use std::collections::HashSet;
use tracing::{debug, warn};

use super::index::{id_to_position, position_to_id, EventIndex};
use super::EventStore;

/// The log and its indices, always updated together under one lock.
struct EventLog<E> {
    events: Vec<E>,
    index: EventIndex,
}

impl<E> EventLog<E> {
    fn next_id(&self) -> EventId {
        position_to_id(self.events.len())
    }
}

/// Append-only event store held in memory.
///
/// A single write lock serializes id assignment and makes each `sink` call's
/// version check and append one atomic step. Readers share the read lock and
/// never see part of a batch.
pub struct InMemoryEventStore<B: EventBuilder = DefaultEventBuilder> {
    log: RwLock<EventLog<B::Event>>,
    encoder: Box<dyn BodyEncoder>,
    builder: B,
}

impl InMemoryEventStore {
    /// Create an empty store producing [`EventRecord`](crate::EventRecord)s
    /// with JSON bodies.
    pub fn new() -> Self {
        Self::with_builder(DefaultEventBuilder)
    }
}

impl Default for InMemoryEventStore {
    fn default() -> Self {
        Self::new()
    }
}

impl<B: EventBuilder> InMemoryEventStore<B> {
    /// Create an empty store that materializes records through `builder`.
    pub fn with_builder(builder: B) -> Self {
        Self {
            log: RwLock::new(EventLog {
                events: Vec::new(),
                index: EventIndex::new(),
            }),
            encoder: Box::new(JsonEncoder),
            builder,
        }
    }

    /// Use `encoder` for bodies appended from now on.
    pub fn with_encoder(mut self, encoder: impl BodyEncoder + 'static) -> Self {
        self.encoder = Box::new(encoder);
        self
    }

    /// Number of events in the log.
    pub fn len(&self) -> usize {
        self.log.read().events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn ensure_one_aggregate(events: &[NewEvent]) -> Result<AggregateId> {
        let first = events.first().ok_or_else(|| {
            StoreError::InvalidOperation("sink requires at least one event".to_string())
        })?;

        let distinct: HashSet<AggregateId> = events.iter().map(|e| e.aggregate_id).collect();
        if distinct.len() != 1 {
            warn!(aggregates = distinct.len(), "rejected multi-aggregate write");
            return Err(StoreError::MultiAggregateWrite {
                count: distinct.len(),
            });
        }

        Ok(first.aggregate_id)
    }
}

impl<B: EventBuilder> EventStore for InMemoryEventStore<B> {
    type Event = B::Event;

    fn sink(&self, events: Vec<NewEvent>, expected_version: Option<Version>) -> Result<()> {
        let aggregate_id = Self::ensure_one_aggregate(&events)?;

        // Encode before locking so a bad body cannot leave a partial append
        let encoded = events
            .into_iter()
            .map(|event| {
                let body = self.encoder.encode(&event.body)?;
                Ok((event, body))
            })
            .collect::<Result<Vec<_>>>()?;

        let mut log = self.log.write();

        let current = log.index.version_for(&aggregate_id);
        if let Some(expected) = expected_version {
            if expected != current {
                warn!(%aggregate_id, %expected, actual = %current, "concurrency conflict");
                return Err(StoreError::Concurrency {
                    aggregate_id,
                    expected,
                    actual: current,
                });
            }
        }

        let first_id = log.next_id();
        let count = encoded.len();
        let encoding = self.encoder.encoding();
        let mut version = current;

        for (event, body) in encoded {
            version = version.next();
            let position = log.events.len();
            let record = self.builder.build(EventFields {
                id: position_to_id(position),
                aggregate_id,
                event_type: event.event_type,
                version,
                body,
                encoding,
                created_at: event.created_at.unwrap_or_else(Timestamp::now),
                uuid: event.uuid,
            });

            log.index.add(position, aggregate_id, record.event_type());
            log.events.push(record);
        }

        debug!(%aggregate_id, first_id = %first_id, count, version = %version, "appended events");
        Ok(())
    }

    fn get_next_from(
        &self,
        from_id: EventId,
        event_types: Option<&[String]>,
        limit: usize,
    ) -> Result<Vec<Self::Event>> {
        let log = self.log.read();
        let start = id_to_position(from_id);

        let batch = match event_types {
            None => log.events.iter().skip(start).take(limit).cloned().collect(),
            Some(types) => log
                .index
                .typed_positions_from(types, start, limit)
                .into_iter()
                .map(|p| log.events[p].clone())
                .collect(),
        };

        Ok(batch)
    }

    fn latest_event_id(&self, event_types: Option<&[String]>) -> Result<EventId> {
        let log = self.log.read();
        Ok(match event_types {
            None => EventId(log.events.len() as u64),
            Some(types) => log.index.latest_typed_id(types),
        })
    }

    fn get_events_for_aggregate_id(&self, aggregate_id: AggregateId) -> Result<Vec<Self::Event>> {
        let log = self.log.read();
        Ok(log
            .index
            .aggregate_positions(&aggregate_id)
            .iter()
            .map(|&p| log.events[p].clone())
            .collect())
    }

    fn version_for(&self, aggregate_id: AggregateId) -> Result<Version> {
        Ok(self.log.read().index.version_for(&aggregate_id))
    }
}
