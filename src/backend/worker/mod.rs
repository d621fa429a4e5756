//! Offline Cache Worker
//!
//! Caching proxy logic for the storefront: precaches the app shell, serves
//! API calls network-only with an offline JSON fallback, serves pages
//! network-first and everything else cache-first.
//!
//! # Lifecycle
//!
//! ```text
//! Installing ──install()──► Installed ──skip_waiting()──► Activating ──► Activated
//!      │
//!      └── failed precache ──► Redundant
//! ```
//!
//! Until the worker is activated, every request passes straight through.
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use luxemarket::backend::worker::{CacheWorker, FetchOutcome, WorkerConfig};
//! use luxemarket::backend::worker::fetch::{HttpUpstream, WorkerRequest};
//!
//! # async fn example() -> Result<(), luxemarket::backend::error::BackendError> {
//! let origin = reqwest::Url::parse("http://127.0.0.1:3000").unwrap();
//! let worker = CacheWorker::new(WorkerConfig::default(), Arc::new(HttpUpstream::new(origin.clone())?));
//! worker.install().await?;
//!
//! let page = WorkerRequest::navigate(origin.join("/cart").unwrap());
//! if let FetchOutcome::Response(response) = worker.fetch(&page).await {
//!     println!("{}", response.status);
//! }
//! # Ok(())
//! # }
//! ```

/// Named response caches
pub mod cache;

/// Intercepted requests and upstream access
pub mod fetch;

/// Request classification and offline fallbacks
pub mod strategy;

use std::sync::Arc;

use chrono::Utc;
use futures_util::future::try_join_all;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use crate::backend::error::BackendError;

pub use cache::{request_key, CacheStorage, ResponseKind, StoredResponse};
pub use fetch::{HttpUpstream, RequestMode, Upstream, WorkerRequest};
pub use strategy::RequestClass;

/// Name of the current cache bucket
pub const DEFAULT_CACHE_NAME: &str = "luxemarket-v1";

/// Control message that forces a waiting worker to activate
pub const SKIP_WAITING_MESSAGE: &str = "SKIP_WAITING";

/// Worker settings, loadable from TOML
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkerConfig {
    /// Current cache bucket; every other bucket is deleted on activation
    pub cache_name: String,
    /// Pages precached at install time
    pub shell_routes: Vec<String>,
    /// Page served when a navigation fails and nothing is cached
    pub offline_route: String,
    /// URLs containing this are treated as API calls
    pub api_marker: String,
    /// URLs containing any of these are never handled
    pub tooling_markers: Vec<String>,
    /// Activate immediately after a successful install
    pub skip_waiting_on_install: bool,
    /// Runtime cache entries kept before the oldest are evicted
    pub max_cached_entries: usize,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            cache_name: DEFAULT_CACHE_NAME.to_string(),
            shell_routes: ["/", "/offline", "/products", "/cart", "/wishlist"]
                .into_iter()
                .map(String::from)
                .collect(),
            offline_route: "/offline".to_string(),
            api_marker: "/api/".to_string(),
            tooling_markers: vec!["browser-sync".to_string(), "chrome-extension".to_string()],
            skip_waiting_on_install: true,
            max_cached_entries: cache::DEFAULT_CAPACITY,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum WorkerState {
    Installing,
    Installed,
    Activating,
    Activated,
    Redundant,
}

/// What the proxy should do with a request
#[derive(Debug, Clone)]
pub enum FetchOutcome {
    /// Forward the request untouched
    Passthrough,
    /// Answer with this response
    Response(StoredResponse),
}

/// Snapshot reported by the status endpoint
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkerStatus {
    pub state: WorkerState,
    pub cache_name: String,
    pub caches: Vec<String>,
    pub cached_entries: usize,
    pub clients_claimed: bool,
}

#[derive(Debug)]
struct Lifecycle {
    state: WorkerState,
    clients_claimed: bool,
}

/// The offline cache worker
#[derive(Clone)]
pub struct CacheWorker {
    config: Arc<WorkerConfig>,
    caches: CacheStorage,
    upstream: Arc<dyn Upstream>,
    lifecycle: Arc<RwLock<Lifecycle>>,
}

impl std::fmt::Debug for CacheWorker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CacheWorker")
            .field("config", &self.config)
            .field("origin", &self.upstream.origin().as_str())
            .finish_non_exhaustive()
    }
}

impl CacheWorker {
    pub fn new(config: WorkerConfig, upstream: Arc<dyn Upstream>) -> Self {
        let caches = CacheStorage::with_capacity(config.max_cached_entries);
        Self::with_caches(config, upstream, caches)
    }

    /// Start from existing cache storage, e.g. buckets left by an older version
    pub fn with_caches(config: WorkerConfig, upstream: Arc<dyn Upstream>, caches: CacheStorage) -> Self {
        Self {
            config: Arc::new(config),
            caches,
            upstream,
            lifecycle: Arc::new(RwLock::new(Lifecycle {
                state: WorkerState::Installing,
                clients_claimed: false,
            })),
        }
    }

    pub fn config(&self) -> &WorkerConfig {
        &self.config
    }

    pub fn caches(&self) -> &CacheStorage {
        &self.caches
    }

    pub fn upstream(&self) -> &Arc<dyn Upstream> {
        &self.upstream
    }

    pub async fn state(&self) -> WorkerState {
        self.lifecycle.read().await.state
    }

    /// Precache every shell route; all or nothing
    ///
    /// A failed precache leaves the worker redundant and no bucket entries
    /// are written.
    pub async fn install(&self) -> Result<(), BackendError> {
        tracing::info!("Installing cache worker ({})", self.config.cache_name);
        self.lifecycle.write().await.state = WorkerState::Installing;

        match self.precache().await {
            Ok(entries) => {
                let count = entries.len();
                self.caches.put_all(&self.config.cache_name, entries).await;
                self.lifecycle.write().await.state = WorkerState::Installed;
                tracing::info!("Precached {} shell route(s)", count);
            }
            Err(e) => {
                self.lifecycle.write().await.state = WorkerState::Redundant;
                tracing::error!("Cache worker install failed: {}", e);
                return Err(e);
            }
        }

        if self.config.skip_waiting_on_install {
            self.skip_waiting().await;
        }
        Ok(())
    }

    /// Fetch every shell route concurrently; the first failure wins
    async fn precache(&self) -> Result<Vec<(String, StoredResponse)>, BackendError> {
        self.caches.open(&self.config.cache_name).await;

        let fetches = self.config.shell_routes.iter().map(|route| async move {
            let url = self
                .upstream
                .origin()
                .join(route)
                .map_err(|e| BackendError::worker(format!("invalid shell route {}: {}", route, e)))?;
            let response = self.upstream.fetch(&WorkerRequest::get(url.clone())).await?;
            if !response.is_ok() {
                return Err(BackendError::worker(format!(
                    "precache of {} returned {}",
                    route, response.status
                )));
            }
            Ok::<_, BackendError>((request_key(&url), response.shareable()))
        });
        try_join_all(fetches).await
    }

    /// Activate a worker that finished installing; no-op in any other state
    pub async fn skip_waiting(&self) -> bool {
        if self.state().await != WorkerState::Installed {
            return false;
        }
        self.activate().await;
        true
    }

    /// Delete stale buckets and take control of clients
    pub async fn activate(&self) -> Vec<String> {
        self.lifecycle.write().await.state = WorkerState::Activating;

        let mut deleted = Vec::new();
        for name in self.caches.keys().await {
            if name != self.config.cache_name && self.caches.delete(&name).await {
                tracing::info!("Deleted stale cache {}", name);
                deleted.push(name);
            }
        }

        let mut lifecycle = self.lifecycle.write().await;
        lifecycle.state = WorkerState::Activated;
        lifecycle.clients_claimed = true;
        tracing::info!("Cache worker activated");
        deleted
    }

    /// Handle a control message; returns whether it was recognised
    pub async fn handle_message(&self, message: &serde_json::Value) -> bool {
        match message.get("type").and_then(|t| t.as_str()) {
            Some(SKIP_WAITING_MESSAGE) => {
                tracing::debug!("Received {}", SKIP_WAITING_MESSAGE);
                self.skip_waiting().await;
                true
            }
            other => {
                tracing::debug!("Ignoring worker message {:?}", other);
                false
            }
        }
    }

    /// Decide how to answer an intercepted request
    pub async fn fetch(&self, request: &WorkerRequest) -> FetchOutcome {
        if self.state().await != WorkerState::Activated {
            return FetchOutcome::Passthrough;
        }

        let response = match RequestClass::classify(request, &self.config) {
            RequestClass::Passthrough => return FetchOutcome::Passthrough,
            RequestClass::Api => self.network_only(request).await,
            RequestClass::Navigation => self.network_first(request).await,
            RequestClass::Asset => self.cache_first(request).await,
        };
        FetchOutcome::Response(response)
    }

    async fn network_only(&self, request: &WorkerRequest) -> StoredResponse {
        match self.upstream.fetch(request).await {
            Ok(response) => response,
            Err(e) => {
                tracing::warn!("API request {} failed offline: {}", request.url, e);
                strategy::offline_api_response(Utc::now())
            }
        }
    }

    async fn network_first(&self, request: &WorkerRequest) -> StoredResponse {
        let error = match self.upstream.fetch(request).await {
            Ok(response) => return response,
            Err(e) => e,
        };
        tracing::warn!("Navigation to {} failed: {}", request.url, error);

        if let Some(cached) = self.caches.match_request(&request_key(&request.url)).await {
            return cached;
        }
        if let Some(offline) = self.caches.match_request(&self.config.offline_route).await {
            return offline;
        }
        strategy::offline_navigation_response()
    }

    async fn cache_first(&self, request: &WorkerRequest) -> StoredResponse {
        let key = request_key(&request.url);
        if let Some(cached) = self.caches.match_request(&key).await {
            tracing::debug!("Cache hit: {}", key);
            return cached;
        }

        match self.upstream.fetch(request).await {
            Ok(response) => {
                if strategy::is_cacheable(request, &response) {
                    self.caches
                        .put(&self.config.cache_name, key, response.clone().shareable())
                        .await;
                } else {
                    tracing::trace!("Not caching {} ({})", request.url, response.status);
                }
                response
            }
            Err(e) => {
                tracing::debug!("Asset {} unavailable: {}", request.url, e);
                strategy::offline_asset_response(request.url.as_str())
            }
        }
    }

    pub async fn status(&self) -> WorkerStatus {
        let lifecycle = self.lifecycle.read().await;
        WorkerStatus {
            state: lifecycle.state,
            cache_name: self.config.cache_name.clone(),
            caches: self.caches.keys().await,
            cached_entries: self.caches.len(&self.config.cache_name).await,
            clients_claimed: lifecycle.clients_claimed,
        }
    }
}
