//! Backend Module
//!
//! The LuxeMarket edge server: an Axum reverse proxy that runs every request
//! through the offline cache worker before it reaches the storefront origin.
//!
//! This module is only compiled when the `ssr` feature is enabled.
//!
//! # Architecture
//!
//! - **`server`** - Configuration, application state, initialization
//! - **`routes`** - Worker control routes and the proxy fallback
//! - **`worker`** - Cache storage, fetch strategies and lifecycle
//! - **`middleware`** - Guard on worker control messages
//! - **`error`** - Backend-specific error types
//!
//! # Module Structure
//!
//! ```text
//! backend/
//! ├── mod.rs          - Module exports and documentation
//! ├── main.rs         - `luxemarket-edge` binary
//! ├── server/         - Server initialization and state
//! ├── routes/         - Route configuration
//! ├── worker/         - Offline cache worker
//! ├── middleware/     - Request guards
//! └── error/          - Error types
//! ```
//!
//! # Request Flow
//!
//! ```text
//! client ──► TraceLayer ──► /__worker/... ──► control_guard ──► worker control
//!                      └──► fallback ──► CacheWorker::fetch ──► cached / fallback response
//!                                                         └──► passthrough ──► origin
//! ```

/// Server setup and configuration
pub mod server;

/// Route configuration
pub mod routes;

/// Offline cache worker
pub mod worker;

/// Backend error types
pub mod error;

/// Request guards
pub mod middleware;

/// Re-export commonly used types
pub use error::BackendError;
pub use server::{create_app, ServerConfig};
pub use worker::CacheWorker;
