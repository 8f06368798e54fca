//! Shared helpers for integration tests.

#![allow(dead_code)]

use eventline::{
    AggregateId, EventId, EventRecord, EventStore, InMemoryEventStore, NewEvent, PollOutcome,
    PollWaiter, Result, SubscriptionMaster, Version,
};
use parking_lot::Mutex;
use std::cell::Cell;

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .with_test_writer()
        .try_init();
}

pub fn types(names: &[&str]) -> Vec<String> {
    names.iter().map(|s| s.to_string()).collect()
}

pub fn ids(events: &[EventRecord]) -> Vec<u64> {
    events.iter().map(|e| e.id.0).collect()
}

/// Append one event of `event_type` for a fresh aggregate.
pub fn sink_new(store: &impl EventStore, event_type: &str) {
    store
        .sink_one(NewEvent::new(AggregateId::new(), event_type), None)
        .unwrap();
}

/// Polls a fixed number of times, running a hook after every poll.
pub struct TestPoller {
    pub times: usize,
    pub after_poll: Box<dyn FnMut()>,
}

impl TestPoller {
    pub fn new(times: usize) -> Self {
        Self {
            times,
            after_poll: Box::new(|| {}),
        }
    }

    pub fn after_poll(mut self, hook: impl FnMut() + 'static) -> Self {
        self.after_poll = Box::new(hook);
        self
    }
}

impl PollWaiter for TestPoller {
    fn poll(&mut self, action: &mut dyn FnMut() -> Result<PollOutcome>) -> Result<()> {
        for _ in 0..self.times {
            let outcome = action()?;
            (self.after_poll)();
            if outcome == PollOutcome::Stop {
                break;
            }
        }
        Ok(())
    }
}

/// Master that records every shutdown check and optionally requests
/// shutdown at the nth one.
#[derive(Default)]
pub struct SpyMaster {
    pub checks: Cell<usize>,
    pub stop_at: Option<usize>,
}

impl SpyMaster {
    pub fn stopping_at(check: usize) -> Self {
        Self {
            checks: Cell::new(0),
            stop_at: Some(check),
        }
    }
}

impl SubscriptionMaster for SpyMaster {
    fn shutdown_if_requested(&self) -> bool {
        let n = self.checks.get() + 1;
        self.checks.set(n);
        self.stop_at.is_some_and(|at| n >= at)
    }
}

/// Store wrapper recording the arguments of every `get_next_from` call.
#[derive(Default)]
pub struct RecordingStore {
    pub inner: InMemoryEventStore,
    pub reads: Mutex<Vec<(EventId, Option<Vec<String>>, usize)>>,
}

impl EventStore for RecordingStore {
    type Event = EventRecord;

    fn sink(&self, events: Vec<NewEvent>, expected_version: Option<Version>) -> Result<()> {
        self.inner.sink(events, expected_version)
    }

    fn get_next_from(
        &self,
        from_id: EventId,
        event_types: Option<&[String]>,
        limit: usize,
    ) -> Result<Vec<EventRecord>> {
        self.reads
            .lock()
            .push((from_id, event_types.map(|t| t.to_vec()), limit));
        self.inner.get_next_from(from_id, event_types, limit)
    }

    fn latest_event_id(&self, event_types: Option<&[String]>) -> Result<EventId> {
        self.inner.latest_event_id(event_types)
    }

    fn get_events_for_aggregate_id(&self, aggregate_id: AggregateId) -> Result<Vec<EventRecord>> {
        self.inner.get_events_for_aggregate_id(aggregate_id)
    }

    fn version_for(&self, aggregate_id: AggregateId) -> Result<Version> {
        self.inner.version_for(aggregate_id)
    }
}
