//! Cooperative shutdown coordination.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

/// Process-wide shutdown coordinator consulted between batches.
///
/// Returning `true` tells the subscription it has reached a safe point and
/// should stop before polling again.
pub trait SubscriptionMaster {
    fn shutdown_if_requested(&self) -> bool;
}

impl<M: SubscriptionMaster + ?Sized> SubscriptionMaster for &M {
    fn shutdown_if_requested(&self) -> bool {
        (**self).shutdown_if_requested()
    }
}

impl<M: SubscriptionMaster + ?Sized> SubscriptionMaster for Arc<M> {
    fn shutdown_if_requested(&self) -> bool {
        (**self).shutdown_if_requested()
    }
}

#[derive(Debug, Default)]
struct ShutdownState {
    requested: AtomicBool,
    safe_points: AtomicU64,
}

/// Flag-based [`SubscriptionMaster`] shared by every subscription in a
/// process. Clones share the same flag.
///
/// Signal handling belongs to the host: wire its handler to
/// [`request_shutdown`](Self::request_shutdown).
#[derive(Clone, Debug, Default)]
pub struct ShutdownCoordinator {
    state: Arc<ShutdownState>,
}

impl ShutdownCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ask every subscription to stop at its next safe point.
    pub fn request_shutdown(&self) {
        self.state.requested.store(true, Ordering::SeqCst);
    }

    pub fn is_shutdown_requested(&self) -> bool {
        self.state.requested.load(Ordering::SeqCst)
    }

    /// Number of safe points reached so far, across all subscriptions.
    pub fn safe_points(&self) -> u64 {
        self.state.safe_points.load(Ordering::SeqCst)
    }
}

impl SubscriptionMaster for ShutdownCoordinator {
    fn shutdown_if_requested(&self) -> bool {
        self.state.safe_points.fetch_add(1, Ordering::SeqCst);
        self.is_shutdown_requested()
    }
}
