//! # Pending Operation Replay
//!
//! Resubmits queued operations once the client is back online.
//!
//! ## Contract
//!
//! - Operations are attempted oldest first and identified by their id, so a
//!   dispatcher can discard a resend it has already applied.
//! - A delivered operation is removed from the queue.
//! - A failed operation stays queued with its attempt count raised and a
//!   retry time from the [`RetryPolicy`]. Later operations on the same
//!   product wait behind it; a failed clear holds back everything after it.
//! - An operation that reaches `max_attempts` is dropped and reported as
//!   abandoned.
//!
//! The store lock is never held while a dispatcher runs.

use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use thiserror::Error;
use tokio::sync::Mutex;

use crate::client::offline::queue::PendingOperation;
use crate::client::offline::retry::RetryPolicy;
use crate::client::store::{SharedStore, StatePersistence};

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DispatchError {
    /// The remote end could not be reached
    #[error("Transport error: {0}")]
    Transport(String),

    /// The remote end refused the operation
    #[error("Rejected: {0}")]
    Rejected(String),
}

/// Delivers one pending operation to wherever it must be applied
#[async_trait]
pub trait OperationDispatcher: Send + Sync {
    async fn dispatch(&self, operation: &PendingOperation) -> Result<(), DispatchError>;
}

/// Logs each operation and acknowledges it without sending it anywhere
#[derive(Debug, Default, Clone, Copy)]
pub struct LoggingDispatcher;

#[async_trait]
impl OperationDispatcher for LoggingDispatcher {
    async fn dispatch(&self, operation: &PendingOperation) -> Result<(), DispatchError> {
        tracing::info!("Processing operation: {:?} ({})", operation.kind(), operation.id);
        Ok(())
    }
}

/// Outcome of one replay pass
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReplayReport {
    /// Ids delivered and removed from the queue
    pub dispatched: Vec<String>,
    /// Ids that failed and remain queued
    pub failed: Vec<String>,
    /// Ids not attempted: not yet due, held behind a failure, or offline
    pub deferred: Vec<String>,
    /// Operations dropped after too many failures
    pub abandoned: Vec<PendingOperation>,
}

impl ReplayReport {
    /// True if nothing was left behind
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty() && self.deferred.is_empty() && self.abandoned.is_empty()
    }

    fn touched_queue(&self) -> bool {
        !self.dispatched.is_empty() || !self.failed.is_empty() || !self.abandoned.is_empty()
    }
}

/// Drives queued operations through an [`OperationDispatcher`]
#[derive(Clone)]
pub struct ReplayEngine {
    store: SharedStore,
    persistence: Option<StatePersistence>,
    dispatcher: Arc<dyn OperationDispatcher>,
    policy: RetryPolicy,
    pass: Arc<Mutex<()>>,
}

impl std::fmt::Debug for ReplayEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReplayEngine")
            .field("persistence", &self.persistence)
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}

impl ReplayEngine {
    /// Engine using the [`LoggingDispatcher`] and the default policy
    pub fn new(store: SharedStore) -> Self {
        Self {
            store,
            persistence: None,
            dispatcher: Arc::new(LoggingDispatcher),
            policy: RetryPolicy::default(),
            pass: Arc::new(Mutex::new(())),
        }
    }

    pub fn with_dispatcher(mut self, dispatcher: Arc<dyn OperationDispatcher>) -> Self {
        self.dispatcher = dispatcher;
        self
    }

    pub fn with_persistence(mut self, persistence: StatePersistence) -> Self {
        self.persistence = Some(persistence);
        self
    }

    pub fn with_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn store(&self) -> &SharedStore {
        &self.store
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Attempt every due operation once
    ///
    /// Passes are serialized: a second caller waits for the running pass
    /// and then sees the queue it left behind.
    pub async fn process_pending_operations(&self) -> ReplayReport {
        let _pass = self.pass.lock().await;
        let mut report = ReplayReport::default();

        let queued: Vec<PendingOperation> = {
            let store = self.store.read().await;
            if !store.is_online() {
                tracing::debug!("Offline: skipping replay of {} operation(s)", store.pending_operations().len());
                return report;
            }
            store.pending_operations().iter().cloned().collect()
        };

        if queued.is_empty() {
            return report;
        }
        tracing::info!("Replaying {} pending operation(s)", queued.len());

        let mut blocked_targets: HashSet<u64> = HashSet::new();
        let mut blocked_all = false;

        for op in queued {
            let target = op.operation.target_id();
            let held_back = blocked_all || target.is_some_and(|id| blocked_targets.contains(&id));

            if held_back || !op.is_due(Utc::now()) || !self.store.read().await.is_online() {
                block(&mut blocked_targets, &mut blocked_all, target);
                report.deferred.push(op.id);
                continue;
            }

            match self.dispatcher.dispatch(&op).await {
                Ok(()) => {
                    self.store.write().await.remove_pending_operation(&op.id);
                    tracing::debug!("Dispatched operation {}", op.id);
                    report.dispatched.push(op.id);
                }
                Err(e) => {
                    let attempts = op.attempts + 1;
                    let mut store = self.store.write().await;

                    if self.policy.exhausted(attempts) {
                        if let Some(mut dropped) = store.remove_pending_operation(&op.id) {
                            dropped.attempts = attempts;
                            dropped.last_error = Some(e.to_string());
                            tracing::error!(
                                "Abandoning operation {} after {} attempt(s): {}",
                                op.id,
                                attempts,
                                e
                            );
                            report.abandoned.push(dropped);
                        }
                    } else {
                        let next = self.policy.next_attempt_at(attempts, Utc::now());
                        store
                            .pending_operations_mut()
                            .record_failure(&op.id, e.to_string(), next);
                        tracing::warn!(
                            "Operation {} failed (attempt {}), retrying at {}: {}",
                            op.id,
                            attempts,
                            next,
                            e
                        );
                        block(&mut blocked_targets, &mut blocked_all, target);
                        report.failed.push(op.id);
                    }
                }
            }
        }

        if report.touched_queue() {
            self.flush().await;
        }

        tracing::info!(
            "Replay finished: {} dispatched, {} failed, {} deferred, {} abandoned",
            report.dispatched.len(),
            report.failed.len(),
            report.deferred.len(),
            report.abandoned.len()
        );
        report
    }

    async fn flush(&self) {
        let Some(persistence) = &self.persistence else {
            return;
        };
        let snapshot = self.store.read().await.snapshot();
        if let Err(e) = persistence.save(&snapshot).await {
            tracing::error!("Failed to persist queue after replay: {}", e);
        }
    }
}

fn block(targets: &mut HashSet<u64>, all: &mut bool, target: Option<u64>) {
    match target {
        Some(id) => {
            targets.insert(id);
        }
        None => *all = true,
    }
}
