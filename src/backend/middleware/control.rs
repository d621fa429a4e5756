/**
 * Control Message Guard
 *
 * Worker control messages change the worker's lifecycle, so they are only
 * accepted from trusted callers:
 *
 * - with a control token configured, the request must carry
 *   `Authorization: Bearer <token>`
 * - without one, only loopback peers are accepted
 */

use std::net::SocketAddr;

use axum::{
    extract::{ConnectInfo, Request, State},
    http::{header::AUTHORIZATION, StatusCode},
    middleware::Next,
    response::Response,
};

use crate::backend::error::BackendError;
use crate::backend::server::state::AppState;

pub async fn control_guard(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, BackendError> {
    match state.control_token.as_deref() {
        Some(expected) => {
            let presented = request
                .headers()
                .get(AUTHORIZATION)
                .and_then(|h| h.to_str().ok())
                .and_then(|h| h.strip_prefix("Bearer "));
            if presented != Some(expected) {
                tracing::warn!("Rejected worker control message: missing or invalid token");
                return Err(BackendError::handler(
                    StatusCode::UNAUTHORIZED,
                    "missing or invalid control token",
                ));
            }
        }
        None => {
            let peer = request
                .extensions()
                .get::<ConnectInfo<SocketAddr>>()
                .map(|ConnectInfo(addr)| *addr);
            if !peer.is_some_and(|addr| addr.ip().is_loopback()) {
                tracing::warn!("Rejected worker control message from {:?}", peer);
                return Err(BackendError::handler(
                    StatusCode::FORBIDDEN,
                    "worker control is limited to loopback clients",
                ));
            }
        }
    }

    Ok(next.run(request).await)
}
