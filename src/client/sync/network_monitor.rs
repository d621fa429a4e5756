//! # Network Monitor
//!
//! Observes connectivity changes reported by the host environment.
//!
//! ## Features
//!
//! - **Connectivity Detection**: Online/offline events update the store flag
//! - **Replay on Reconnect**: Queued operations are resubmitted when online
//! - **Notifications**: Toasts for every transition
//! - **Status Banner**: Text describing the current sync state
//!
//! The monitor is passive: it never polls, sends heartbeats or times out.
//! It only reacts to events pushed by the embedding application.

use std::sync::Arc;

use serde::Serialize;
use tokio::sync::watch;

use crate::client::notify::{Notification, Notifier, TracingNotifier};
use crate::client::offline::replay::{ReplayEngine, ReplayReport};
use crate::client::store::SharedStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NetworkStatus {
    Online,
    Offline,
}

/// Connectivity change reported by the host
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectivityEvent {
    Online,
    Offline,
}

impl From<bool> for ConnectivityEvent {
    fn from(online: bool) -> Self {
        if online {
            ConnectivityEvent::Online
        } else {
            ConnectivityEvent::Offline
        }
    }
}

/// Banner content for the current connectivity state
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusSummary {
    pub status: NetworkStatus,
    pub pending_operations: usize,
    pub title: String,
    pub description: String,
}

pub struct NetworkMonitor {
    store: SharedStore,
    replay: ReplayEngine,
    notifier: Arc<dyn Notifier>,
}

impl std::fmt::Debug for NetworkMonitor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NetworkMonitor").field("replay", &self.replay).finish_non_exhaustive()
    }
}

impl NetworkMonitor {
    /// Monitor replaying through `replay`, which must share `store`
    pub fn new(store: SharedStore, replay: ReplayEngine) -> Self {
        Self {
            store,
            replay,
            notifier: Arc::new(TracingNotifier),
        }
    }

    pub fn with_notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = notifier;
        self
    }

    pub async fn get_status(&self) -> NetworkStatus {
        if self.store.read().await.is_online() {
            NetworkStatus::Online
        } else {
            NetworkStatus::Offline
        }
    }

    /// Record the connectivity at startup, replaying if online
    ///
    /// No notification is shown for the initial state.
    pub async fn initialize(&self, currently_online: bool) -> Option<ReplayReport> {
        let has_pending = {
            let mut store = self.store.write().await;
            store.set_online(currently_online);
            !store.pending_operations().is_empty()
        };
        tracing::info!(
            "Network monitor started ({})",
            if currently_online { "online" } else { "offline" }
        );

        if currently_online && has_pending {
            Some(self.replay.process_pending_operations().await)
        } else {
            None
        }
    }

    /// Apply a connectivity event; returns the replay report when online
    pub async fn handle_event(&self, event: ConnectivityEvent) -> Option<ReplayReport> {
        match event {
            ConnectivityEvent::Online => {
                self.store.write().await.set_online(true);
                tracing::info!("Connectivity restored");
                self.notifier
                    .notify(Notification::success("You're back online!", "Syncing your data..."));
                Some(self.replay.process_pending_operations().await)
            }
            ConnectivityEvent::Offline => {
                self.store.write().await.set_online(false);
                tracing::warn!("Connectivity lost");
                self.notifier.notify(Notification::error(
                    "You're offline",
                    "Changes will be saved and synced when you're back online.",
                ));
                None
            }
        }
    }

    /// Follow a connectivity signal until its sender is dropped
    pub async fn run(&self, mut connectivity: watch::Receiver<bool>) {
        let initial = *connectivity.borrow_and_update();
        self.initialize(initial).await;

        while connectivity.changed().await.is_ok() {
            let online = *connectivity.borrow_and_update();
            self.handle_event(ConnectivityEvent::from(online)).await;
        }
        tracing::debug!("Connectivity signal closed, network monitor stopping");
    }

    pub async fn status_summary(&self) -> StatusSummary {
        let store = self.store.read().await;
        let pending = store.pending_operations().len();

        if store.is_online() {
            let description = if pending > 0 {
                format!("Syncing {} pending changes...", pending)
            } else {
                "All changes are synced.".to_string()
            };
            StatusSummary {
                status: NetworkStatus::Online,
                pending_operations: pending,
                title: "You're online".to_string(),
                description,
            }
        } else {
            StatusSummary {
                status: NetworkStatus::Offline,
                pending_operations: pending,
                title: "You're offline".to_string(),
                description: "Your changes will be saved locally and synced when you're back online."
                    .to_string(),
            }
        }
    }
}
