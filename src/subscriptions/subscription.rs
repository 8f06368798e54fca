//! Polling subscription over an [`EventStore`].

use crate::error::{BoxError, Result, StoreError};
use crate::store::EventStore;
use crate::types::{EventId, StoredEvent};
use std::thread::{self, JoinHandle};
use tracing::{debug, info, trace};

use super::master::SubscriptionMaster;
use super::types::{PollOutcome, SubscriptionConfig, SubscriptionState};
use super::waiter::PollWaiter;

/// Delivers newly appended events to a consumer, one ordered batch per poll.
///
/// The cursor only moves after the consumer accepted a batch, and the
/// shutdown check runs after delivery, so a stop never splits a batch.
pub struct Subscription<S, W, M, F> {
    store: S,
    poll_waiter: W,
    master: M,
    config: SubscriptionConfig,
    on_new_events: F,
    /// Next id to request.
    cursor: EventId,
    state: SubscriptionState,
}

impl<S, W, M, F> Subscription<S, W, M, F>
where
    S: EventStore,
    W: PollWaiter,
    M: SubscriptionMaster,
    F: FnMut(Vec<S::Event>) -> std::result::Result<(), BoxError>,
{
    pub fn new(store: S, poll_waiter: W, master: M, config: SubscriptionConfig, on_new_events: F) -> Self {
        Self {
            cursor: config.from_event_id,
            store,
            poll_waiter,
            master,
            config,
            on_new_events,
            state: SubscriptionState::Idle,
        }
    }

    /// Next id this subscription will request.
    pub fn cursor(&self) -> EventId {
        self.cursor
    }

    pub fn state(&self) -> SubscriptionState {
        self.state
    }

    pub fn config(&self) -> &SubscriptionConfig {
        &self.config
    }

    /// Run the poll loop until the waiter is exhausted, shutdown is
    /// requested, or the store or consumer fails.
    ///
    /// A subscription runs once. To resume, build a new one from
    /// [`cursor`](Self::cursor).
    pub fn start(&mut self) -> Result<()> {
        if self.state != SubscriptionState::Idle {
            return Err(StoreError::InvalidOperation(format!(
                "subscription cannot start from state {:?}",
                self.state
            )));
        }

        self.state = SubscriptionState::Polling;
        info!(from = %self.cursor, batch_size = self.config.batch_size, "subscription started");

        let Self {
            store,
            poll_waiter,
            master,
            config,
            on_new_events,
            cursor,
            ..
        } = self;

        let result = poll_waiter.poll(&mut || {
            let outcome = deliver_next_batch(&*store, config, &mut *on_new_events, &mut *cursor)?;

            if master.shutdown_if_requested() {
                info!(cursor = %cursor, "subscription stopping at safe point");
                return Ok(PollOutcome::Stop);
            }
            Ok(outcome)
        });

        self.state = SubscriptionState::Stopped;
        debug!(cursor = %self.cursor, ok = result.is_ok(), "subscription stopped");
        result
    }
}

impl<S, W, M, F> Subscription<S, W, M, F>
where
    S: EventStore + Send + 'static,
    W: PollWaiter + Send + 'static,
    M: SubscriptionMaster + Send + 'static,
    F: FnMut(Vec<S::Event>) -> std::result::Result<(), BoxError> + Send + 'static,
{
    /// Run [`start`](Self::start) on a dedicated named thread.
    pub fn spawn(mut self, name: impl Into<String>) -> Result<SubscriptionWorker> {
        let join = thread::Builder::new().name(name.into()).spawn(move || -> Result<EventId> {
            self.start()?;
            Ok(self.cursor)
        })?;

        Ok(SubscriptionWorker { join })
    }
}

/// Handle to a subscription running on its own thread.
#[derive(Debug)]
pub struct SubscriptionWorker {
    join: JoinHandle<Result<EventId>>,
}

impl SubscriptionWorker {
    pub fn is_finished(&self) -> bool {
        self.join.is_finished()
    }

    /// Wait for the subscription to stop. Returns its final cursor.
    pub fn join(self) -> Result<EventId> {
        self.join.join().map_err(|_| StoreError::WorkerPanicked)?
    }
}

/// One poll: read from `cursor`, hand a non-empty batch to the consumer, then
/// advance past it.
fn deliver_next_batch<S, F>(
    store: &S,
    config: &SubscriptionConfig,
    on_new_events: &mut F,
    cursor: &mut EventId,
) -> Result<PollOutcome>
where
    S: EventStore,
    F: FnMut(Vec<S::Event>) -> std::result::Result<(), BoxError>,
{
    let batch = store.get_next_from(*cursor, config.event_types.as_deref(), config.batch_size)?;

    let Some(last) = batch.last().map(StoredEvent::id) else {
        trace!(from = %cursor, "no new events");
        return Ok(PollOutcome::Idle);
    };

    let count = batch.len();
    debug!(from = %cursor, to = %last, count, "delivering batch");
    on_new_events(batch).map_err(StoreError::Consumer)?;

    *cursor = last.next();
    Ok(PollOutcome::Delivered(count))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::subscriptions::{BoundedPollWaiter, ShutdownCoordinator};
    use crate::{AggregateId, EventRecord, InMemoryEventStore, NewEvent};
    use std::sync::Arc;

    fn store_with(count: usize) -> Arc<InMemoryEventStore> {
        let store = Arc::new(InMemoryEventStore::new());
        for _ in 0..count {
            store.sink_one(NewEvent::new(AggregateId::new(), "item_added"), None).unwrap();
        }
        store
    }

    #[test]
    fn test_cursor_advances_past_delivered_batch() {
        let store = store_with(3);
        let mut batches: Vec<Vec<u64>> = Vec::new();

        let mut subscription = Subscription::new(
            store,
            BoundedPollWaiter::new(2),
            ShutdownCoordinator::new(),
            SubscriptionConfig::default().with_batch_size(2),
            |events: Vec<EventRecord>| {
                batches.push(events.iter().map(|e| e.id.0).collect());
                Ok(())
            },
        );

        subscription.start().unwrap();

        assert_eq!(subscription.cursor(), EventId(4));
        assert_eq!(subscription.state(), SubscriptionState::Stopped);
        drop(subscription);
        assert_eq!(batches, vec![vec![1, 2], vec![3]]);
    }

    #[test]
    fn test_empty_poll_keeps_cursor() {
        let store = store_with(0);
        let mut subscription = Subscription::new(
            store,
            BoundedPollWaiter::new(3),
            ShutdownCoordinator::new(),
            SubscriptionConfig::from_event_id(EventId(5)),
            |_: Vec<EventRecord>| Ok(()),
        );

        subscription.start().unwrap();
        assert_eq!(subscription.cursor(), EventId(5));
    }

    #[test]
    fn test_cannot_restart() {
        let mut subscription = Subscription::new(
            store_with(0),
            BoundedPollWaiter::once(),
            ShutdownCoordinator::new(),
            SubscriptionConfig::default(),
            |_: Vec<EventRecord>| Ok(()),
        );

        subscription.start().unwrap();
        let result = subscription.start();
        assert!(matches!(result, Err(StoreError::InvalidOperation(_))));
    }

    #[test]
    fn test_consumer_error_leaves_cursor() {
        let mut subscription = Subscription::new(
            store_with(2),
            BoundedPollWaiter::new(3),
            ShutdownCoordinator::new(),
            SubscriptionConfig::default(),
            |_: Vec<EventRecord>| -> std::result::Result<(), BoxError> {
                Err("projection offline".into())
            },
        );

        let result = subscription.start();

        assert!(matches!(result, Err(StoreError::Consumer(_))));
        assert_eq!(subscription.cursor(), EventId(1));
        assert_eq!(subscription.state(), SubscriptionState::Stopped);
    }

    #[test]
    fn test_spawned_worker_returns_cursor() {
        let store = store_with(4);
        let subscription = Subscription::new(
            store,
            BoundedPollWaiter::once(),
            ShutdownCoordinator::new(),
            SubscriptionConfig::default(),
            |_: Vec<EventRecord>| Ok(()),
        );

        let worker = subscription.spawn("test-subscription").unwrap();
        assert_eq!(worker.join().unwrap(), EventId(5));
    }
}
