/**
 * Server Initialization
 *
 * Builds the cache worker, runs its install step and assembles the router.
 *
 * # Error Handling
 *
 * A failed install does not stop the server: the worker stays redundant and
 * every request is proxied straight to the origin.
 */

use std::sync::Arc;

use axum::Router;

use crate::backend::error::BackendError;
use crate::backend::routes::router::create_router;
use crate::backend::server::config::ServerConfig;
use crate::backend::server::state::AppState;
use crate::backend::worker::{CacheWorker, HttpUpstream, Upstream};

/// Create the Axum application against the configured origin
pub async fn create_app(config: &ServerConfig) -> Result<Router<()>, BackendError> {
    let upstream = HttpUpstream::new(config.origin.clone())?;
    Ok(create_app_with(config, Arc::new(upstream)).await)
}

/// Create the application with a custom upstream
pub async fn create_app_with(config: &ServerConfig, upstream: Arc<dyn Upstream>) -> Router<()> {
    tracing::info!("Initializing LuxeMarket edge server for {}", config.origin);

    let worker = CacheWorker::new(config.worker.clone(), upstream);
    if let Err(e) = worker.install().await {
        tracing::warn!("Continuing without offline cache: {}", e);
    }

    create_router(AppState::new(worker).with_control_token(config.control_token.clone()))
}
