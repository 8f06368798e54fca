//! Subscription configuration and state types.

use crate::store::DEFAULT_READ_LIMIT;
use crate::types::EventId;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for a subscription.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SubscriptionConfig {
    /// First id to request.
    /// Default: 1
    pub from_event_id: EventId,

    /// Filter by event types (None = all types).
    pub event_types: Option<Vec<String>>,

    /// Max events per delivered batch.
    /// Default: 1000
    pub batch_size: usize,
}

impl Default for SubscriptionConfig {
    fn default() -> Self {
        Self {
            from_event_id: EventId::FIRST,
            event_types: None,
            batch_size: DEFAULT_READ_LIMIT,
        }
    }
}

impl SubscriptionConfig {
    /// Start from `id` with no type filter.
    pub fn from_event_id(id: EventId) -> Self {
        Self {
            from_event_id: id,
            ..Default::default()
        }
    }

    pub fn with_event_types<I, S>(mut self, types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.event_types = Some(types.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }
}

/// Timing configuration for [`IntervalPollWaiter`](super::IntervalPollWaiter).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PollConfig {
    /// Delay between polls in milliseconds.
    /// Default: 500
    pub interval_ms: u64,

    /// Stop after this many polls (None = run until stopped).
    pub max_polls: Option<u64>,

    /// Upper bound for the delay while polls keep coming back empty
    /// (None = fixed interval).
    pub max_backoff_ms: Option<u64>,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval_ms: 500,
            max_polls: None,
            max_backoff_ms: None,
        }
    }
}

impl PollConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }

    pub fn max_backoff(&self) -> Option<Duration> {
        self.max_backoff_ms.map(Duration::from_millis)
    }
}

/// What a single poll produced, reported back to the waiter.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PollOutcome {
    /// A batch of this many events was delivered.
    Delivered(usize),
    /// Nothing new.
    Idle,
    /// A safe stopping point was reached and shutdown was requested.
    Stop,
}

/// Lifecycle of a subscription.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SubscriptionState {
    /// Constructed, not started.
    Idle,
    /// Inside the poll loop.
    Polling,
    /// Loop exited. Terminal.
    Stopped,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults() {
        let config = SubscriptionConfig::default();
        assert_eq!(config.from_event_id, EventId(1));
        assert_eq!(config.batch_size, 1000);
        assert!(config.event_types.is_none());

        let poll = PollConfig::default();
        assert_eq!(poll.interval(), Duration::from_millis(500));
        assert!(poll.max_backoff().is_none());
    }

    #[test]
    fn test_config_builders() {
        let config = SubscriptionConfig::from_event_id(EventId(7))
            .with_event_types(["item_added", "item_removed"])
            .with_batch_size(42);

        assert_eq!(config.from_event_id, EventId(7));
        assert_eq!(config.batch_size, 42);
        assert_eq!(
            config.event_types,
            Some(vec!["item_added".to_string(), "item_removed".to_string()])
        );
    }

    #[test]
    fn test_config_deserializes_with_defaults() {
        let config: SubscriptionConfig = serde_json::from_str(r#"{ "batch_size": 10 }"#).unwrap();
        assert_eq!(config.batch_size, 10);
        assert_eq!(config.from_event_id, EventId(1));

        let poll: PollConfig = serde_json::from_str(r#"{ "max_backoff_ms": 4000 }"#).unwrap();
        assert_eq!(poll.interval_ms, 500);
        assert_eq!(poll.max_backoff(), Some(Duration::from_secs(4)));
    }
}
