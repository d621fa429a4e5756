//! Route Configuration Module
//!
//! HTTP routes for the edge server.
//!
//! # Module Structure
//!
//! ```text
//! routes/
//! ├── mod.rs           - Module exports and documentation
//! ├── router.rs        - Main router creation
//! ├── worker_routes.rs - Worker control endpoints
//! └── proxy.rs         - Fallback that runs requests through the worker
//! ```

/// Main router creation
pub mod router;

/// Worker control endpoints
pub mod worker_routes;

/// Proxy fallback handler
pub mod proxy;

pub use router::create_router;
