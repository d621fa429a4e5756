/**
 * Worker Control Routes
 *
 * # Routes
 *
 * - `POST /__worker/message` - Deliver a control message (e.g. `{"type":"SKIP_WAITING"}`);
 *   guarded by [`control_guard`]
 * - `GET /__worker/status` - Lifecycle state and cache contents
 */

use axum::{extract::State, middleware, routing, Json, Router};
use serde::Serialize;

use crate::backend::error::BackendError;
use crate::backend::middleware::control_guard;
use crate::backend::server::state::AppState;
use crate::backend::worker::{WorkerState, WorkerStatus};

pub const MESSAGE_PATH: &str = "/__worker/message";
pub const STATUS_PATH: &str = "/__worker/status";

#[derive(Debug, Serialize)]
pub struct MessageReply {
    pub handled: bool,
    pub state: WorkerState,
}

/// Add the worker control endpoints
pub fn configure_worker_routes(router: Router<AppState>, state: &AppState) -> Router<AppState> {
    let guard = middleware::from_fn_with_state(state.clone(), control_guard);
    router
        .route(MESSAGE_PATH, routing::post(post_message).route_layer(guard))
        .route(STATUS_PATH, routing::get(get_status))
}

async fn post_message(
    State(state): State<AppState>,
    Json(message): Json<serde_json::Value>,
) -> Result<Json<MessageReply>, BackendError> {
    if !message.is_object() {
        return Err(BackendError::handler(
            axum::http::StatusCode::BAD_REQUEST,
            "worker messages must be JSON objects",
        ));
    }
    let handled = state.worker.handle_message(&message).await;
    Ok(Json(MessageReply {
        handled,
        state: state.worker.state().await,
    }))
}

async fn get_status(State(state): State<AppState>) -> Json<WorkerStatus> {
    Json(state.worker.status().await)
}
