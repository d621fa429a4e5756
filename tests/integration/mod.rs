//! Integration tests
//!
//! - `storefront_test` - facades, persistence and toasts end to end
//! - `replay_test` - offline queueing and replay on reconnect
//! - `catalog_test` - catalog client against a mock API
//! - `worker_test` - edge proxy and cache worker against a mock origin

pub mod catalog_test;
pub mod replay_test;
pub mod storefront_test;
#[cfg(feature = "ssr")]
pub mod worker_test;
