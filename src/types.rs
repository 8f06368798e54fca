//! Core types for the event log.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};
use uuid::Uuid;

use crate::body;
use crate::error::Result;

/// Global position of an event in the log.
///
/// Ids start at 1 and increase by one per appended event across all
/// aggregates.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
pub struct EventId(pub u64);

impl EventId {
    /// Sentinel meaning "no events".
    pub const EMPTY: EventId = EventId(0);

    /// The first id the store ever assigns.
    pub const FIRST: EventId = EventId(1);

    pub fn next(self) -> Self {
        EventId(self.0 + 1)
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }
}

impl fmt::Debug for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EventId({})", self.0)
    }
}

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Per-aggregate version. An aggregate with `n` events is at version `n`.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
pub struct Version(pub u64);

impl Version {
    /// Version of an aggregate with no events.
    pub const INITIAL: Version = Version(0);

    pub fn next(self) -> Self {
        Version(self.0 + 1)
    }
}

impl fmt::Debug for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "v{}", self.0)
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier grouping the events of one entity's history.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AggregateId(pub Uuid);

impl AggregateId {
    pub fn new() -> Self {
        AggregateId(Uuid::new_v4())
    }
}

impl Default for AggregateId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<Uuid> for AggregateId {
    fn from(id: Uuid) -> Self {
        AggregateId(id)
    }
}

impl fmt::Debug for AggregateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AggregateId({})", self.0)
    }
}

impl fmt::Display for AggregateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Microseconds since Unix epoch.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Timestamp(pub i64);

impl Timestamp {
    /// Current time. A clock set before the epoch reads as zero.
    pub fn now() -> Self {
        let micros = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_micros() as i64)
            .unwrap_or(0);
        Timestamp(micros)
    }
}

impl fmt::Debug for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Timestamp({})", self.0)
    }
}

/// Payload encoding format.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum PayloadEncoding {
    #[default]
    Json,
    MessagePack,
}

/// Read access to a persisted event, independent of its concrete representation.
pub trait StoredEvent: Clone + Send + Sync + 'static {
    fn id(&self) -> EventId;
    fn aggregate_id(&self) -> AggregateId;
    fn event_type(&self) -> &str;
    fn version(&self) -> Version;
}

/// A single persisted event.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EventRecord {
    /// Global id (assigned by store).
    pub id: EventId,

    /// Aggregate this event belongs to.
    pub aggregate_id: AggregateId,

    /// Application-defined type (e.g., "item_added").
    pub event_type: String,

    /// Position within the aggregate (assigned by store).
    pub version: Version,

    /// Encoded payload.
    pub body: Vec<u8>,

    /// Encoding of `body`.
    pub encoding: PayloadEncoding,

    /// When the event happened.
    pub created_at: Timestamp,

    /// Caller-supplied correlation token.
    pub uuid: Option<Uuid>,
}

impl EventRecord {
    /// Decode the body with the encoding it was written in.
    pub fn decode_body<T: DeserializeOwned>(&self) -> Result<T> {
        let value = body::encoder_for(self.encoding).decode(&self.body)?;
        serde_json::from_value(value).map_err(|e| crate::StoreError::Deserialization(e.to_string()))
    }
}

impl StoredEvent for EventRecord {
    fn id(&self) -> EventId {
        self.id
    }

    fn aggregate_id(&self) -> AggregateId {
        self.aggregate_id
    }

    fn event_type(&self) -> &str {
        &self.event_type
    }

    fn version(&self) -> Version {
        self.version
    }
}

/// Input for appending an event (before id/version assigned).
#[derive(Clone, Debug, PartialEq)]
pub struct NewEvent {
    pub aggregate_id: AggregateId,
    pub event_type: String,
    pub body: serde_json::Value,
    pub created_at: Option<Timestamp>,
    pub uuid: Option<Uuid>,
}

impl NewEvent {
    /// Create an event with an empty object body.
    pub fn new(aggregate_id: AggregateId, event_type: impl Into<String>) -> Self {
        Self {
            aggregate_id,
            event_type: event_type.into(),
            body: serde_json::Value::Object(Default::default()),
            created_at: None,
            uuid: None,
        }
    }

    /// Create an event whose body is serialized from `payload`.
    pub fn json(
        aggregate_id: AggregateId,
        event_type: impl Into<String>,
        payload: &impl Serialize,
    ) -> std::result::Result<Self, serde_json::Error> {
        Ok(Self::new(aggregate_id, event_type).with_body(serde_json::to_value(payload)?))
    }

    pub fn with_body(mut self, body: serde_json::Value) -> Self {
        self.body = body;
        self
    }

    /// Override the append-time timestamp.
    pub fn with_created_at(mut self, created_at: Timestamp) -> Self {
        self.created_at = Some(created_at);
        self
    }

    pub fn with_uuid(mut self, uuid: Uuid) -> Self {
        self.uuid = Some(uuid);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_event_id_navigation() {
        assert_eq!(EventId(5).next(), EventId(6));
        assert!(EventId::EMPTY.is_empty());
        assert!(!EventId::FIRST.is_empty());
    }

    #[test]
    fn test_version_next() {
        assert_eq!(Version::INITIAL.next(), Version(1));
    }

    #[test]
    fn test_new_event_json() {
        #[derive(Serialize)]
        struct ItemAdded {
            sku: String,
        }

        let aggregate = AggregateId::new();
        let event = NewEvent::json(aggregate, "item_added", &ItemAdded { sku: "A-1".into() }).unwrap();

        assert_eq!(event.event_type, "item_added");
        assert_eq!(event.body, json!({ "sku": "A-1" }));
        assert!(event.created_at.is_none());
    }

    #[test]
    fn test_new_event_builders() {
        let token = Uuid::new_v4();
        let event = NewEvent::new(AggregateId::new(), "terms_accepted")
            .with_created_at(Timestamp(42))
            .with_uuid(token);

        assert_eq!(event.created_at, Some(Timestamp(42)));
        assert_eq!(event.uuid, Some(token));
        assert_eq!(event.body, json!({}));
    }
}
