/**
 * Application State
 *
 * Shared by every handler. The worker owns its cache storage; the upstream
 * is used directly for requests the worker passes through.
 */

use std::sync::Arc;

use axum::extract::FromRef;

use crate::backend::worker::{CacheWorker, Upstream};

#[derive(Clone)]
pub struct AppState {
    /// Offline cache worker
    pub worker: Arc<CacheWorker>,
    /// Storefront origin
    pub upstream: Arc<dyn Upstream>,
    /// Bearer token for control messages; loopback only when unset
    pub control_token: Option<Arc<str>>,
}

impl AppState {
    pub fn new(worker: CacheWorker) -> Self {
        let upstream = worker.upstream().clone();
        Self {
            worker: Arc::new(worker),
            upstream,
            control_token: None,
        }
    }

    pub fn with_control_token(mut self, token: Option<String>) -> Self {
        self.control_token = token.map(Arc::from);
        self
    }
}

impl FromRef<AppState> for Arc<CacheWorker> {
    fn from_ref(state: &AppState) -> Self {
        state.worker.clone()
    }
}
