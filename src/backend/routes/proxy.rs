/**
 * Proxy Fallback
 *
 * Every request not matched by a control route lands here. It is turned
 * into a [`WorkerRequest`], offered to the worker, and forwarded to the
 * origin when the worker passes on it.
 */

use axum::{
    body::{self, Body},
    extract::{Request, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};

use crate::backend::error::BackendError;
use crate::backend::server::state::AppState;
use crate::backend::worker::fetch::origin_target;
use crate::backend::worker::{FetchOutcome, RequestMode, StoredResponse, WorkerRequest};

/// Largest request body the proxy will buffer
pub const MAX_BODY_BYTES: usize = 10 * 1024 * 1024;

impl IntoResponse for StoredResponse {
    fn into_response(self) -> Response {
        let mut response = Response::new(Body::from(self.body));
        *response.status_mut() = self.status;
        *response.headers_mut() = self.headers;
        response
    }
}

pub async fn handle_proxy(State(state): State<AppState>, request: Request) -> Result<Response, BackendError> {
    let (parts, body) = request.into_parts();

    let url = origin_target(state.upstream.origin(), parts.uri.path(), parts.uri.query()).ok_or_else(|| {
        BackendError::handler(StatusCode::BAD_REQUEST, format!("invalid request target: {}", parts.uri))
    })?;
    let body = body::to_bytes(body, MAX_BODY_BYTES)
        .await
        .map_err(|e| BackendError::handler(StatusCode::PAYLOAD_TOO_LARGE, e.to_string()))?;

    let request = WorkerRequest {
        mode: RequestMode::from_headers(&parts.headers),
        method: parts.method,
        url,
        headers: parts.headers,
        body,
    };

    match state.worker.fetch(&request).await {
        FetchOutcome::Response(response) => Ok(response.into_response()),
        FetchOutcome::Passthrough => {
            tracing::debug!("Passing through {} {}", request.method, request.url);
            Ok(state.upstream.fetch(&request).await?.into_response())
        }
    }
}
