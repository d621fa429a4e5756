//! # Middleware
//!
//! Request guards for the edge server.
//!
//! - **`control`** - restricts the worker control messages to trusted callers

pub mod control;

pub use control::control_guard;
