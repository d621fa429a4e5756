//! Common test utilities and helpers
//!
//! This module provides shared utilities for all tests including:
//! - Product fixtures
//! - A recording operation dispatcher
//! - Storefront construction against temporary storage

pub mod dispatcher;
pub mod fixtures;

// Re-export commonly used utilities
pub use dispatcher::*;
pub use fixtures::*;
