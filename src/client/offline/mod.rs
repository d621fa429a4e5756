//! # Offline Support
//!
//! Offline-first cart and wishlist editing: optimistic updates, a persisted
//! queue of mutations made while offline, and replay once connectivity
//! returns.
//!
//! ## Architecture
//!
//! - **Optimistic Updates**: the store changes immediately, with rollback
//! - **Operation Queue**: offline mutations recorded in insertion order
//! - **Replay**: queued operations resubmitted through a dispatcher
//! - **Retry Logic**: backoff and a max attempt count for failed replays
//!
//! ## Key Components
//!
//! - `optimistic.rs`: Optimistic update coordination
//! - `queue.rs`: Pending operation queue and its wire format
//! - `replay.rs`: Replay engine and dispatchers
//! - `retry.rs`: Retry policy and backoff strategies
//!
//! ## Usage
//!
//! ```rust,no_run
//! use luxemarket::client::offline::ReplayEngine;
//! use luxemarket::client::store::Store;
//!
//! # async fn example() {
//! let store = Store::new().into_shared();
//! store.write().await.set_online(false);
//! store.write().await.remove_from_cart(7);
//!
//! store.write().await.set_online(true);
//! let report = ReplayEngine::new(store.clone()).process_pending_operations().await;
//! assert_eq!(report.dispatched.len(), 1);
//! # }
//! ```

pub mod optimistic;
pub mod queue;
pub mod replay;
pub mod retry;

// Re-export main types
pub use optimistic::{OptimisticCoordinator, OptimisticUpdate, UpdateOutcome, DEFAULT_ERROR_MESSAGE};
pub use queue::{Operation, OperationKind, OperationProduct, PendingOperation, PendingQueue};
pub use replay::{DispatchError, LoggingDispatcher, OperationDispatcher, ReplayEngine, ReplayReport};
pub use retry::{BackoffStrategy, RetryPolicy};

use chrono::{DateTime, Utc};

/// Queue statistics
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueueStats {
    /// Number of queued operations
    pub pending_operations: usize,
    /// Operations that failed at least once
    pub failed_operations: usize,
    /// Failed operations still waiting for their retry time
    pub retrying_operations: usize,
}

impl QueueStats {
    pub fn of(queue: &PendingQueue, now: DateTime<Utc>) -> Self {
        let failed: Vec<&PendingOperation> = queue.iter().filter(|op| op.attempts > 0).collect();
        Self {
            pending_operations: queue.len(),
            failed_operations: failed.len(),
            retrying_operations: failed.iter().filter(|op| !op.is_due(now)).count(),
        }
    }
}
