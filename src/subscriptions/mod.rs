//! Polling subscriptions over the event log.
//!
//! A [`Subscription`] reads the store from a cursor, hands each non-empty
//! batch to a consumer callback, and advances the cursor past it:
//! - Batches arrive in ascending id order, one callback per poll
//! - A [`PollWaiter`] decides how often and how long to poll
//! - A [`SubscriptionMaster`] is asked for shutdown only between batches
//!
//! # Example
//!
//! ```ignore
//! let shutdown = ShutdownCoordinator::new();
//! let waiter = IntervalPollWaiter::new(PollConfig::default());
//!
//! let mut subscription = Subscription::new(
//!     Arc::clone(&store),
//!     waiter,
//!     shutdown.clone(),
//!     SubscriptionConfig::from_event_id(last_processed.next())
//!         .with_event_types(["item_added", "item_removed"]),
//!     |events: Vec<EventRecord>| {
//!         for event in &events {
//!             println!("{} v{} {}", event.id, event.version, event.event_type);
//!         }
//!         Ok(())
//!     },
//! );
//!
//! // Blocks until the waiter gives up or `shutdown.request_shutdown()` is called
//! subscription.start()?;
//! ```

mod master;
mod subscription;
mod types;
mod waiter;

pub use master::{ShutdownCoordinator, SubscriptionMaster};
pub use subscription::{Subscription, SubscriptionWorker};
pub use types::{PollConfig, PollOutcome, SubscriptionConfig, SubscriptionState};
pub use waiter::{BoundedPollWaiter, IntervalPollWaiter, PollStopHandle, PollWaiter};
