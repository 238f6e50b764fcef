//! Graph API module.
//!
//! This module provides:
//! - Resilient HTTP client for the Graph REST API
//! - Rate usage tracking and adaptive pacing
//! - Proxy pool rotation and health checks
//! - API response types

pub mod client;
pub mod proxy;
pub mod rate;
pub mod types;

pub use client::GraphApi;
pub use proxy::{PoolHealth, ProbeResult, ProxyPool};
pub use rate::UsageTracker;
pub use types::*;
