//! Materializing persisted events from their fields.

use crate::types::{AggregateId, EventId, EventRecord, PayloadEncoding, StoredEvent, Timestamp, Version};
use uuid::Uuid;

/// Every field of a persisted event, as assigned by the store.
#[derive(Clone, Debug)]
pub struct EventFields {
    pub id: EventId,
    pub aggregate_id: AggregateId,
    pub event_type: String,
    pub version: Version,
    pub body: Vec<u8>,
    pub encoding: PayloadEncoding,
    pub created_at: Timestamp,
    pub uuid: Option<Uuid>,
}

/// Factory the store uses to build the records it keeps.
///
/// Swapping the builder changes the record representation without touching
/// store logic.
pub trait EventBuilder: Send + Sync {
    type Event: StoredEvent;

    fn build(&self, fields: EventFields) -> Self::Event;
}

/// Builds plain [`EventRecord`]s.
#[derive(Clone, Copy, Debug, Default)]
pub struct DefaultEventBuilder;

impl EventBuilder for DefaultEventBuilder {
    type Event = EventRecord;

    fn build(&self, fields: EventFields) -> EventRecord {
        EventRecord {
            id: fields.id,
            aggregate_id: fields.aggregate_id,
            event_type: fields.event_type,
            version: fields.version,
            body: fields.body,
            encoding: fields.encoding,
            created_at: fields.created_at,
            uuid: fields.uuid,
        }
    }
}
