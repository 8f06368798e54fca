//! Error types for the event store and subscriptions.

use crate::types::{AggregateId, Version};
use thiserror::Error;

/// Boxed error returned by subscription consumers.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Main error type for store and subscription operations.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Atomic write to {count} aggregates is not supported")]
    MultiAggregateWrite { count: usize },

    #[error("Concurrency conflict on aggregate {aggregate_id}: expected version {expected}, found {actual}")]
    Concurrency {
        aggregate_id: AggregateId,
        expected: Version,
        actual: Version,
    },

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Deserialization error: {0}")]
    Deserialization(String),

    #[error("Consumer failed: {0}")]
    Consumer(#[source] BoxError),

    #[error("Subscription worker panicked")]
    WorkerPanicked,

    #[error("Invalid operation: {0}")]
    InvalidOperation(String),
}

impl StoreError {
    /// Whether the caller can reload state and retry the same write.
    pub fn is_retryable(&self) -> bool {
        matches!(self, StoreError::Concurrency { .. })
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(e: serde_json::Error) -> Self {
        StoreError::Serialization(e.to_string())
    }
}

impl From<rmp_serde::encode::Error> for StoreError {
    fn from(e: rmp_serde::encode::Error) -> Self {
        StoreError::Serialization(e.to_string())
    }
}

impl From<rmp_serde::decode::Error> for StoreError {
    fn from(e: rmp_serde::decode::Error) -> Self {
        StoreError::Deserialization(e.to_string())
    }
}

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
