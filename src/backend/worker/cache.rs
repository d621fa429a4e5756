/**
 * Named Response Caches
 *
 * In-memory equivalent of the browser Cache Storage API: a set of named
 * buckets, each mapping a request key to a stored response. Lookups through
 * [`CacheStorage::match_request`] search every bucket, oldest first.
 *
 * # Request keys
 *
 * Requests are keyed by path plus query (`/products?limit=4`), since the
 * worker only ever caches responses from its own origin.
 *
 * # Capacity
 *
 * Entries written with [`CacheStorage::put_all`] (the precached shell) are
 * pinned. Entries written at runtime with [`CacheStorage::put`] are bounded
 * per bucket and evicted oldest first.
 */
use std::collections::{BTreeMap, VecDeque};
use std::sync::Arc;

use axum::http::{HeaderMap, StatusCode};
use bytes::Bytes;
use reqwest::Url;
use tokio::sync::RwLock;

/// Whether a response came from the worker's own origin
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseKind {
    /// Same-origin response
    Basic,
    /// Cross-origin response
    Cors,
    /// Generated by the worker itself
    Synthetic,
}

/// A complete, replayable HTTP response
#[derive(Debug, Clone)]
pub struct StoredResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
    pub kind: ResponseKind,
}

impl StoredResponse {
    /// Worker-generated response with a single content type
    pub fn synthetic(status: StatusCode, content_type: &'static str, body: impl Into<Bytes>) -> Self {
        let mut headers = HeaderMap::new();
        headers.insert(
            axum::http::header::CONTENT_TYPE,
            axum::http::HeaderValue::from_static(content_type),
        );
        Self {
            status,
            headers,
            body: body.into(),
            kind: ResponseKind::Synthetic,
        }
    }

    pub fn is_ok(&self) -> bool {
        self.status.is_success()
    }

    pub fn content_type(&self) -> Option<&str> {
        self.headers
            .get(axum::http::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
    }

    /// Whether `Cache-Control` marks the response `private` or `no-store`
    pub fn is_private(&self) -> bool {
        self.headers
            .get_all(axum::http::header::CACHE_CONTROL)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .flat_map(|v| v.split(','))
            .map(|directive| directive.trim().to_ascii_lowercase())
            .any(|directive| directive == "private" || directive == "no-store")
    }

    pub fn sets_cookie(&self) -> bool {
        self.headers.contains_key(axum::http::header::SET_COOKIE)
    }

    /// Copy safe to hand to any client: `Set-Cookie` removed
    pub fn shareable(mut self) -> Self {
        self.headers.remove(axum::http::header::SET_COOKIE);
        self
    }
}

/// Cache key for a URL: path plus query
pub fn request_key(url: &Url) -> String {
    match url.query() {
        Some(query) => format!("{}?{}", url.path(), query),
        None => url.path().to_string(),
    }
}

/// Runtime entries kept per bucket unless configured otherwise
pub const DEFAULT_CAPACITY: usize = 500;

#[derive(Debug, Default)]
struct Bucket {
    entries: BTreeMap<String, StoredResponse>,
    // Runtime keys, oldest first; pinned keys never appear here.
    runtime: VecDeque<String>,
}

impl Bucket {
    fn insert_runtime(&mut self, key: String, response: StoredResponse, capacity: usize) -> Vec<String> {
        if self.entries.insert(key.clone(), response).is_some() {
            return Vec::new();
        }
        self.runtime.push_back(key);

        let mut evicted = Vec::new();
        while self.runtime.len() > capacity {
            match self.runtime.pop_front() {
                Some(oldest) => {
                    self.entries.remove(&oldest);
                    evicted.push(oldest);
                }
                None => break,
            }
        }
        evicted
    }

    fn insert_pinned(&mut self, key: String, response: StoredResponse) {
        self.runtime.retain(|k| k != &key);
        self.entries.insert(key, response);
    }
}

fn bucket_mut<'a>(buckets: &'a mut Vec<(String, Bucket)>, name: &str) -> &'a mut Bucket {
    let index = match buckets.iter().position(|(n, _)| n == name) {
        Some(index) => index,
        None => {
            buckets.push((name.to_string(), Bucket::default()));
            buckets.len() - 1
        }
    };
    &mut buckets[index].1
}

/// Named buckets of cached responses
#[derive(Debug, Clone)]
pub struct CacheStorage {
    // Insertion order of bucket names is kept so lookups are deterministic.
    buckets: Arc<RwLock<Vec<(String, Bucket)>>>,
    capacity: usize,
}

impl Default for CacheStorage {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }
}

impl CacheStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bound each bucket to `capacity` runtime entries
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buckets: Arc::new(RwLock::new(Vec::new())),
            capacity,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Create the bucket if it does not exist yet
    pub async fn open(&self, name: &str) {
        let mut buckets = self.buckets.write().await;
        if !buckets.iter().any(|(n, _)| n == name) {
            tracing::debug!("Opened cache {}", name);
            buckets.push((name.to_string(), Bucket::default()));
        }
    }

    /// Bucket names, oldest first
    pub async fn keys(&self) -> Vec<String> {
        self.buckets.read().await.iter().map(|(n, _)| n.clone()).collect()
    }

    pub async fn has(&self, name: &str) -> bool {
        self.buckets.read().await.iter().any(|(n, _)| n == name)
    }

    /// Drop a bucket; returns whether it existed
    pub async fn delete(&self, name: &str) -> bool {
        let mut buckets = self.buckets.write().await;
        let before = buckets.len();
        buckets.retain(|(n, _)| n != name);
        before != buckets.len()
    }
}

impl CacheStorage {
    /// Store a runtime response, opening the bucket if needed
    ///
    /// Returns the keys evicted to stay within capacity.
    pub async fn put(&self, name: &str, key: impl Into<String>, response: StoredResponse) -> Vec<String> {
        let mut buckets = self.buckets.write().await;
        let evicted = bucket_mut(&mut buckets, name).insert_runtime(key.into(), response, self.capacity);
        for key in &evicted {
            tracing::debug!("Evicted {} from cache {}", key, name);
        }
        evicted
    }

    /// Store pinned responses at once; nothing is visible until all are in
    pub async fn put_all(&self, name: &str, entries: Vec<(String, StoredResponse)>) {
        let mut buckets = self.buckets.write().await;
        let bucket = bucket_mut(&mut buckets, name);
        for (key, response) in entries {
            bucket.insert_pinned(key, response);
        }
    }

    /// Look a key up across every bucket
    pub async fn match_request(&self, key: &str) -> Option<StoredResponse> {
        self.buckets
            .read()
            .await
            .iter()
            .find_map(|(_, bucket)| bucket.entries.get(key).cloned())
    }

    /// Number of entries in one bucket
    pub async fn len(&self, name: &str) -> usize {
        self.buckets
            .read()
            .await
            .iter()
            .find(|(n, _)| n == name)
            .map_or(0, |(_, bucket)| bucket.entries.len())
    }
}
