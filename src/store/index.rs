//! Secondary indices over the event log.
//!
//! Events live in a `Vec` where the event with id `n` sits at position
//! `n - 1`, so lookups by id need no index. The maps here cover the other two
//! access paths: per-aggregate history and per-type reads.

use crate::types::{AggregateId, EventId, Version};
use std::collections::HashMap;

/// Index mapping aggregates and event types to log positions.
#[derive(Debug, Default)]
pub(crate) struct EventIndex {
    /// Aggregate to positions, in version order.
    by_aggregate: HashMap<AggregateId, Vec<usize>>,

    /// Event type to positions, in id order.
    by_type: HashMap<String, Vec<usize>>,
}

impl EventIndex {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Add an entry to the index. Positions must be added in ascending order.
    pub(crate) fn add(&mut self, position: usize, aggregate_id: AggregateId, event_type: &str) {
        self.by_aggregate
            .entry(aggregate_id)
            .or_default()
            .push(position);

        self.by_type
            .entry(event_type.to_string())
            .or_default()
            .push(position);
    }

    /// Current version of an aggregate (its event count).
    pub(crate) fn version_for(&self, aggregate_id: &AggregateId) -> Version {
        Version(self.by_aggregate.get(aggregate_id).map_or(0, |p| p.len() as u64))
    }

    /// Positions of an aggregate's events, in version order.
    pub(crate) fn aggregate_positions(&self, aggregate_id: &AggregateId) -> &[usize] {
        self.by_aggregate
            .get(aggregate_id)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Up to `limit` positions at or after `start` whose type is in `types`,
    /// ascending.
    pub(crate) fn typed_positions_from(&self, types: &[String], start: usize, limit: usize) -> Vec<usize> {
        let mut positions = Vec::new();

        for event_type in dedup(types) {
            if let Some(list) = self.by_type.get(event_type) {
                let from = list.partition_point(|&p| p < start);
                positions.extend(list[from..].iter().take(limit).copied());
            }
        }

        positions.sort_unstable();
        positions.truncate(limit);
        positions
    }

    /// Highest id among events whose type is in `types`.
    pub(crate) fn latest_typed_id(&self, types: &[String]) -> EventId {
        types
            .iter()
            .filter_map(|t| self.by_type.get(t).and_then(|list| list.last()))
            .max()
            .map_or(EventId::EMPTY, |&p| position_to_id(p))
    }
}

/// Id of the event stored at `position`.
pub(crate) fn position_to_id(position: usize) -> EventId {
    EventId(position as u64 + 1)
}

/// Log position where the event with `id` lives (or would live).
pub(crate) fn id_to_position(id: EventId) -> usize {
    id.0.saturating_sub(1) as usize
}

fn dedup(types: &[String]) -> Vec<&String> {
    let mut seen: Vec<&String> = Vec::with_capacity(types.len());
    for t in types {
        if !seen.contains(&t) {
            seen.push(t);
        }
    }
    seen
}
