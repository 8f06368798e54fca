//! # Event Log
//!
//! An ordered, append-only event log for event-sourced systems, with
//! polling subscriptions for consumers.
//!
//! ## Core Concepts
//!
//! - **Events**: Immutable records with a global id and a per-aggregate version
//! - **Store**: Appends one aggregate at a time with optimistic concurrency
//! - **Subscriptions**: Poll the store from a cursor and deliver ordered batches
//! - **Shutdown**: Cooperative, checked only between batches
//!
//! ## Example
//!
//! ```ignore
//! use eventline::{AggregateId, EventId, EventStore, InMemoryEventStore, NewEvent, Version};
//! use serde_json::json;
//!
//! let store = InMemoryEventStore::new();
//! let cart = AggregateId::new();
//!
//! // Append with an expected version
//! store.sink_one(
//!     NewEvent::json(cart, "item_added", &json!({ "sku": "A-1" }))?,
//!     Some(Version(0)),
//! )?;
//!
//! // Read the global log
//! let events = store.get_next_from(EventId::FIRST, None, 100)?;
//! ```

pub mod body;
pub mod builder;
pub mod error;
pub mod store;
pub mod subscriptions;
pub mod types;

// Re-exports
pub use body::{BodyEncoder, JsonEncoder, MessagePackEncoder};
pub use builder::{DefaultEventBuilder, EventBuilder, EventFields};
pub use error::{BoxError, Result, StoreError};
pub use store::{EventStore, InMemoryEventStore, DEFAULT_READ_LIMIT};
pub use subscriptions::{
    BoundedPollWaiter, IntervalPollWaiter, PollConfig, PollOutcome, PollStopHandle, PollWaiter,
    ShutdownCoordinator, Subscription, SubscriptionConfig, SubscriptionMaster, SubscriptionState,
    SubscriptionWorker,
};
pub use types::*;
