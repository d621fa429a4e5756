//! Server Module
//!
//! Initialization and configuration for the edge server.
//!
//! # Module Structure
//!
//! ```text
//! server/
//! ├── mod.rs          - Module exports and documentation
//! ├── state.rs        - AppState and FromRef implementations
//! ├── config.rs       - Environment and worker TOML loading
//! └── init.rs         - Worker install and app creation
//! ```
//!
//! # Initialization Flow
//!
//! 1. **Configuration Loading**: `ServerConfig::from_env`
//! 2. **Worker Install**: precache the app shell from the origin
//! 3. **Router Creation**: control endpoints plus the proxy fallback

/// Application state management
pub mod state;

/// Server configuration loading
pub mod config;

/// Server initialization
pub mod init;

// Re-export commonly used types
pub use config::ServerConfig;
pub use init::{create_app, create_app_with};
pub use state::AppState;
