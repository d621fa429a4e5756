//! # Optimistic Updates
//!
//! Applies a store mutation immediately, flushes it to durable storage and
//! reports the outcome. If the mutation or the flush fails, a caller-supplied
//! rollback restores the previous state and an error notification is shown.
//!
//! ## Features
//!
//! - **Immediate Updates**: the store changes before any remote confirmation
//! - **Rollback Support**: typed failures (`Err(StoreError)`) trigger rollback
//! - **Notifications**: success toasts only while online, error toasts always
//! - **History**: a bounded log of recent updates and their outcome
//!
//! ## Usage
//!
//! ```rust,no_run
//! use luxemarket::client::offline::OptimisticCoordinator;
//! # async fn example(coordinator: OptimisticCoordinator) {
//! let previous = coordinator.store().read().await.cart().to_vec();
//! coordinator
//!     .perform_optimistic_update(
//!         "clear-cart",
//!         |store| {
//!             store.clear_cart();
//!             Ok(())
//!         },
//!         move |store| store.set_cart(previous),
//!         Some("Cart cleared successfully."),
//!         Some("Failed to clear cart. Please try again."),
//!     )
//!     .await
//!     .ok();
//! # }
//! ```

use std::collections::VecDeque;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::client::error::StoreError;
use crate::client::notify::{Notification, Notifier, TracingNotifier};
use crate::client::store::{SharedStore, StatePersistence, Store};

/// Shown when the caller gives no error message
pub const DEFAULT_ERROR_MESSAGE: &str = "An error occurred. Please try again.";

const HISTORY_LIMIT: usize = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UpdateOutcome {
    Applied,
    RolledBack,
}

/// Record of one optimistic update
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OptimisticUpdate {
    pub id: Uuid,
    /// Short description of the action, e.g. `add-to-cart`
    pub label: String,
    pub applied_at: DateTime<Utc>,
    pub outcome: UpdateOutcome,
    pub error: Option<String>,
}

/// Runs store mutations optimistically
#[derive(Clone)]
pub struct OptimisticCoordinator {
    store: SharedStore,
    persistence: Option<StatePersistence>,
    notifier: Arc<dyn Notifier>,
    history: Arc<RwLock<VecDeque<OptimisticUpdate>>>,
}

impl std::fmt::Debug for OptimisticCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OptimisticCoordinator")
            .field("persistence", &self.persistence)
            .finish_non_exhaustive()
    }
}

impl OptimisticCoordinator {
    /// Coordinator without durable storage, logging notifications
    pub fn new(store: SharedStore) -> Self {
        Self {
            store,
            persistence: None,
            notifier: Arc::new(TracingNotifier),
            history: Arc::new(RwLock::new(VecDeque::new())),
        }
    }

    /// Flush state through `persistence` after every update
    pub fn with_persistence(mut self, persistence: StatePersistence) -> Self {
        self.persistence = Some(persistence);
        self
    }

    pub fn with_notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = notifier;
        self
    }

    pub fn store(&self) -> &SharedStore {
        &self.store
    }

    pub fn notifier(&self) -> &Arc<dyn Notifier> {
        &self.notifier
    }

    pub fn persistence(&self) -> Option<&StatePersistence> {
        self.persistence.as_ref()
    }

    /// Apply `action`, flush, and notify; roll back on any failure
    ///
    /// The whole sequence runs under one store write guard, so no other
    /// caller observes the state between the action and its rollback.
    /// Operations the action queued while offline are discarded with it.
    pub async fn perform_optimistic_update<T, A, R>(
        &self,
        label: &str,
        action: A,
        rollback: R,
        success_message: Option<&str>,
        error_message: Option<&str>,
    ) -> Result<T, StoreError>
    where
        A: FnOnce(&mut Store) -> Result<T, StoreError>,
        R: FnOnce(&mut Store),
    {
        let applied_at = Utc::now();
        let mut store = self.store.write().await;
        let queued = store.pending_operations().clone();

        let result = match action(&mut store) {
            Ok(value) => match &self.persistence {
                Some(persistence) => persistence.save(&store.snapshot()).await.map(|_| value),
                None => Ok(value),
            },
            Err(e) => Err(e),
        };

        match result {
            Ok(value) => {
                let online = store.is_online();
                drop(store);
                if online {
                    if let Some(message) = success_message {
                        self.notifier.notify(Notification::success("Success", message));
                    }
                }
                tracing::debug!("Optimistic update '{}' applied", label);
                self.record(label, applied_at, UpdateOutcome::Applied, None).await;
                Ok(value)
            }
            Err(e) => {
                rollback(&mut store);
                *store.pending_operations_mut() = queued;
                // The rolled-back state must reach storage too, or a reload
                // would resurrect the failed change.
                if let Some(persistence) = &self.persistence {
                    if let Err(flush) = persistence.save(&store.snapshot()).await {
                        tracing::error!("Failed to persist rollback of '{}': {}", label, flush);
                    }
                }
                drop(store);

                tracing::warn!("Optimistic update '{}' rolled back: {}", label, e);
                self.notifier.notify(Notification::error(
                    "Error",
                    error_message.unwrap_or(DEFAULT_ERROR_MESSAGE),
                ));
                self.record(label, applied_at, UpdateOutcome::RolledBack, Some(e.to_string()))
                    .await;
                Err(e)
            }
        }
    }

    async fn record(&self, label: &str, applied_at: DateTime<Utc>, outcome: UpdateOutcome, error: Option<String>) {
        let mut history = self.history.write().await;
        if history.len() == HISTORY_LIMIT {
            history.pop_front();
        }
        history.push_back(OptimisticUpdate {
            id: Uuid::new_v4(),
            label: label.to_string(),
            applied_at,
            outcome,
            error,
        });
    }

    /// Most recent updates, oldest first
    pub async fn recent_updates(&self) -> Vec<OptimisticUpdate> {
        self.history.read().await.iter().cloned().collect()
    }

    /// Count of rolled-back updates still in the history
    pub async fn count_rolled_back(&self) -> usize {
        self.history
            .read()
            .await
            .iter()
            .filter(|update| update.outcome == UpdateOutcome::RolledBack)
            .count()
    }
}
