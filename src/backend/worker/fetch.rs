/**
 * Worker Requests and Upstream Fetching
 *
 * The worker sees every request as a [`WorkerRequest`] and reaches the
 * storefront origin through an [`Upstream`]. [`HttpUpstream`] is the
 * production implementation backed by `reqwest`.
 *
 * # Transport Failures
 *
 * Only transport failures (connection refused, reset, DNS) are errors. An
 * HTTP error status from the origin is a successful fetch and is passed on
 * unchanged.
 */
use async_trait::async_trait;
use axum::http::{header, HeaderMap, HeaderName, Method};
use bytes::Bytes;
use reqwest::Url;

use crate::backend::error::BackendError;
use crate::backend::worker::cache::{ResponseKind, StoredResponse};

/// How the browser issued the request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RequestMode {
    /// Top-level page navigation
    Navigate,
    #[default]
    Other,
}

impl RequestMode {
    /// Derive the mode from `Sec-Fetch-Mode`, falling back to `Accept: text/html`
    pub fn from_headers(headers: &HeaderMap) -> Self {
        let fetch_mode = headers
            .get("sec-fetch-mode")
            .and_then(|v| v.to_str().ok());
        match fetch_mode {
            Some("navigate") => RequestMode::Navigate,
            Some(_) => RequestMode::Other,
            None => {
                let accepts_html = headers
                    .get(header::ACCEPT)
                    .and_then(|v| v.to_str().ok())
                    .is_some_and(|accept| accept.contains("text/html"));
                if accepts_html {
                    RequestMode::Navigate
                } else {
                    RequestMode::Other
                }
            }
        }
    }
}

/// A request intercepted by the worker
#[derive(Debug, Clone)]
pub struct WorkerRequest {
    pub method: Method,
    pub url: Url,
    pub mode: RequestMode,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl WorkerRequest {
    /// Plain GET with no headers
    pub fn get(url: Url) -> Self {
        Self {
            method: Method::GET,
            url,
            mode: RequestMode::Other,
            headers: HeaderMap::new(),
            body: Bytes::new(),
        }
    }

    /// GET issued as a page navigation
    pub fn navigate(url: Url) -> Self {
        Self {
            mode: RequestMode::Navigate,
            ..Self::get(url)
        }
    }

    /// Whether the request is tied to a particular user
    pub fn carries_credentials(&self) -> bool {
        self.headers.contains_key(header::COOKIE) || self.headers.contains_key(header::AUTHORIZATION)
    }
}

/// Resolve an incoming request target against `origin`
///
/// Only the path and query are taken from the target, so a
/// protocol-relative target such as `//other.host/x` stays on `origin`.
/// Targets that are not origin-form (`/...`) are rejected.
pub fn origin_target(origin: &Url, path: &str, query: Option<&str>) -> Option<Url> {
    if !path.starts_with('/') {
        return None;
    }
    let mut url = origin.clone();
    url.set_path(path);
    url.set_query(query);
    url.set_fragment(None);
    same_origin(&url, origin).then_some(url)
}

/// Something the worker can forward requests to
#[async_trait]
pub trait Upstream: Send + Sync {
    /// Perform the request; `Err` only for transport failures
    async fn fetch(&self, request: &WorkerRequest) -> Result<StoredResponse, BackendError>;

    /// Origin the worker serves; responses from it are `Basic`
    fn origin(&self) -> &Url;
}

const HOP_BY_HOP: [&str; 8] = [
    "connection",
    "keep-alive",
    "proxy-authenticate",
    "proxy-authorization",
    "te",
    "trailer",
    "transfer-encoding",
    "upgrade",
];

fn is_hop_by_hop(name: &HeaderName) -> bool {
    HOP_BY_HOP.contains(&name.as_str())
}

/// Copy end-to-end headers; `Host` and `Content-Length` are recomputed
pub fn forwardable_headers(headers: &HeaderMap) -> HeaderMap {
    headers
        .iter()
        .filter(|(name, _)| !is_hop_by_hop(name))
        .filter(|(name, _)| *name != header::HOST && *name != header::CONTENT_LENGTH)
        .map(|(name, value)| (name.clone(), value.clone()))
        .collect()
}

/// Whether `url` belongs to `origin` (scheme, host and port)
pub fn same_origin(url: &Url, origin: &Url) -> bool {
    url.scheme() == origin.scheme()
        && url.host_str() == origin.host_str()
        && url.port_or_known_default() == origin.port_or_known_default()
}

/// Upstream backed by a `reqwest` client
#[derive(Debug, Clone)]
pub struct HttpUpstream {
    client: reqwest::Client,
    origin: Url,
}

impl HttpUpstream {
    pub fn new(origin: Url) -> Result<Self, BackendError> {
        let client = reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .map_err(|e| BackendError::upstream(format!("failed to build HTTP client: {}", e)))?;
        Ok(Self { client, origin })
    }
}

#[async_trait]
impl Upstream for HttpUpstream {
    async fn fetch(&self, request: &WorkerRequest) -> Result<StoredResponse, BackendError> {
        tracing::debug!("Upstream {} {}", request.method, request.url);

        let response = self
            .client
            .request(request.method.clone(), request.url.clone())
            .headers(forwardable_headers(&request.headers))
            .body(request.body.clone())
            .send()
            .await
            .map_err(|e| BackendError::upstream(e.to_string()))?;

        let status = response.status();
        let kind = if same_origin(response.url(), &self.origin) {
            ResponseKind::Basic
        } else {
            ResponseKind::Cors
        };
        let headers = response
            .headers()
            .iter()
            .filter(|(name, _)| !is_hop_by_hop(name) && **name != header::CONTENT_LENGTH)
            .map(|(name, value)| (name.clone(), value.clone()))
            .collect();
        let body = response
            .bytes()
            .await
            .map_err(|e| BackendError::upstream(e.to_string()))?;

        Ok(StoredResponse {
            status,
            headers,
            body,
            kind,
        })
    }

    fn origin(&self) -> &Url {
        &self.origin
    }
}
