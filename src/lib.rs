//! LuxeMarket - Storefront Core Library
//!
//! Offline-first state and plumbing for the LuxeMarket storefront: a persisted
//! cart and wishlist with optimistic updates, an operation queue replayed on
//! reconnect, and a caching edge proxy that keeps the app shell usable while
//! the network is down.
//!
//! # Module Structure
//!
//! - **`shared`** - Types shared by the client core and the edge server
//!   - Product records, pricing rules, configuration, error types
//!
//! - **`client`** - Storefront client core
//!   - Store, persistence, optimistic updates and the offline queue
//!   - Cart, wishlist and checkout facades
//!   - Connectivity monitor and catalog API client
//!
//! - **`backend`** - Edge server (only compiled with `ssr` feature)
//!   - Offline cache worker
//!   - Axum reverse proxy and worker control routes
//!
//! # Feature Flags
//!
//! - **`ssr`** - Enables the edge server (`axum`, `tower-http`, subscriber setup)
//!
//! # Usage
//!
//! ## Client Core
//!
//! ```rust,no_run
//! use luxemarket::client::{config::Config, Storefront};
//!
//! # async fn example() -> Result<(), luxemarket::client::StoreError> {
//! let storefront = Storefront::open(&Config::new()).await?;
//! storefront.monitor().initialize(true).await;
//! println!("{} item(s) in cart", storefront.cart().cart_count().await);
//! # Ok(())
//! # }
//! ```
//!
//! ## Edge Server
//!
//! ```rust,no_run
//! use luxemarket::backend::server::{create_app, ServerConfig};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = ServerConfig::from_env()?;
//! let app = create_app(&config).await?;
//! // Serve with axum::serve
//! # Ok(())
//! # }
//! ```
//!
//! # Thread Safety
//!
//! - **Client**: one `tokio::sync::RwLock` around the store; mutations are
//!   synchronous under the write guard
//! - **Server**: worker caches sit behind their own `RwLock`
//!
//! # Error Handling
//!
//! - `shared::error::SharedError` for serialization, validation and storage
//! - `client::error::StoreError` for store and facade operations
//! - `backend::error::BackendError` for HTTP handlers

/// Shared types and data structures
pub mod shared;

/// Storefront client core
pub mod client;

/// Edge server code
#[cfg(feature = "ssr")]
pub mod backend;
