//! # Connectivity Sync
//!
//! Tracks online/offline transitions and triggers replay of queued
//! operations when the client comes back online.
//!
//! ## Key Components
//!
//! - `network_monitor.rs`: connectivity events, toasts and the status banner

pub mod network_monitor;

pub use network_monitor::{ConnectivityEvent, NetworkMonitor, NetworkStatus, StatusSummary};
