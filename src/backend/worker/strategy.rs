/**
 * Fetch Strategies
 *
 * Classifies intercepted requests and builds the offline fallbacks.
 *
 * | Class        | Strategy                                              |
 * |--------------|-------------------------------------------------------|
 * | `Passthrough`| not handled by the worker                             |
 * | `Api`        | network only; offline JSON on failure                 |
 * | `Navigation` | network first; cached page, then the offline page     |
 * | `Asset`      | cache first; network copy stored; placeholder on miss |
 */
use axum::http::{Method, StatusCode};
use chrono::{DateTime, SecondsFormat, Utc};

use crate::backend::worker::cache::{ResponseKind, StoredResponse};
use crate::backend::worker::fetch::{RequestMode, WorkerRequest};
use crate::backend::worker::WorkerConfig;

/// Shown in place of images that cannot be fetched
pub const IMAGE_PLACEHOLDER_SVG: &str = r##"<svg width="400" height="300" xmlns="http://www.w3.org/2000/svg"><rect width="400" height="300" fill="#eaeaea"/><text x="50%" y="50%" font-family="Arial" font-size="24" text-anchor="middle" fill="#888">Image Unavailable</text></svg>"##;

pub const OFFLINE_TEXT: &str = "Content not available offline";

const IMAGE_EXTENSIONS: [&str; 5] = [".jpg", ".jpeg", ".png", ".gif", ".svg"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestClass {
    Passthrough,
    Api,
    Navigation,
    Asset,
}

impl RequestClass {
    pub fn classify(request: &WorkerRequest, config: &WorkerConfig) -> Self {
        let url = request.url.as_str();
        if request.method != Method::GET
            || config.tooling_markers.iter().any(|marker| url.contains(marker.as_str()))
        {
            return RequestClass::Passthrough;
        }
        if url.contains(config.api_marker.as_str()) {
            return RequestClass::Api;
        }
        match request.mode {
            RequestMode::Navigate => RequestClass::Navigation,
            RequestMode::Other => RequestClass::Asset,
        }
    }
}

/// Whether a network response may go into the shared cache
///
/// Only same-origin 200s qualify, and never for requests carrying
/// credentials or responses that set cookies or opt out of shared caching.
pub fn is_cacheable(request: &WorkerRequest, response: &StoredResponse) -> bool {
    response.status == StatusCode::OK
        && response.kind == ResponseKind::Basic
        && !request.carries_credentials()
        && !response.sets_cookie()
        && !response.is_private()
}

/// URL ends in a known image extension
pub fn is_image_url(url: &str) -> bool {
    IMAGE_EXTENSIONS.iter().any(|ext| url.ends_with(ext))
}

/// 503 JSON body returned for API calls while offline
pub fn offline_api_response(now: DateTime<Utc>) -> StoredResponse {
    let body = serde_json::json!({
        "error": "You are offline",
        "offline": true,
        "timestamp": now.to_rfc3339_opts(SecondsFormat::Millis, true),
    });
    StoredResponse::synthetic(
        StatusCode::SERVICE_UNAVAILABLE,
        "application/json",
        body.to_string(),
    )
}

/// Placeholder for an asset that is neither cached nor reachable
pub fn offline_asset_response(url: &str) -> StoredResponse {
    if is_image_url(url) {
        StoredResponse::synthetic(StatusCode::OK, "image/svg+xml", IMAGE_PLACEHOLDER_SVG)
    } else {
        StoredResponse::synthetic(StatusCode::OK, "text/plain", OFFLINE_TEXT)
    }
}

/// Last resort for a navigation when even the offline page is missing
pub fn offline_navigation_response() -> StoredResponse {
    StoredResponse::synthetic(StatusCode::SERVICE_UNAVAILABLE, "text/plain", OFFLINE_TEXT)
}
