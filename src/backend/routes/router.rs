/**
 * Router Configuration
 *
 * Combines the worker control routes with the proxy fallback.
 *
 * # Route Order
 *
 * 1. Worker control routes (`/__worker/...`)
 * 2. Fallback proxy (everything else, any method)
 */

use axum::Router;
use tower_http::trace::TraceLayer;

use crate::backend::routes::proxy::handle_proxy;
use crate::backend::routes::worker_routes::configure_worker_routes;
use crate::backend::server::state::AppState;

/// Create the Axum router with all routes configured
pub fn create_router(app_state: AppState) -> Router<()> {
    let router = configure_worker_routes(Router::new(), &app_state);

    router
        .fallback(handle_proxy)
        .layer(TraceLayer::new_for_http())
        .with_state(app_state)
}
