//! Shared Module
//!
//! This module contains types and data structures that are shared between
//! the storefront client core and the edge server. These types are used for
//! serialization against the catalog API, durable storage and the worker's
//! JSON responses.
//!
//! # Overview
//!
//! The shared module provides platform-agnostic types that can be used
//! in both server and client code. All types are designed for serialization.

/// Catalog product record
pub mod product;

/// Order pricing (subtotal, shipping, tax, total)
pub mod pricing;

/// Shared error types
pub mod error;

/// Application configuration
pub mod config;

/// Re-export commonly used types for convenience
pub use product::{Product, ProductSummary, Rating};
pub use pricing::{OrderSummary, PricingRules};
pub use error::SharedError;
pub use config::{AppConfig, AppConfigBuilder, ConfigError};
