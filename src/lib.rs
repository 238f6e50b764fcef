//! Facebook Downloader - incremental media mirroring over the Graph API.
//!
//! This library provides functionality for mirroring photos and videos from
//! Facebook pages and profiles into a local folder tree.
//!
//! # Features
//!
//! - Sync uploaded photos, feed videos, and wall-post attachments
//! - Sync a single album by ID or URL
//! - Persistent dedup and HD upgrade tracking in a local SQLite store
//! - Resumable cursor pagination per target and collection
//! - Rate-limit aware retries with optional proxy rotation
//!
//! # Example
//!
//! ```no_run
//! use std::path::Path;
//! use std::time::Duration;
//! use facebook_downloader::api::ProxyPool;
//! use facebook_downloader::{Config, GraphApi};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::load(Path::new("config.toml"))?;
//!     let pool = ProxyPool::new(config.proxy_list()?, &config.account.user_agent);
//!     let api = GraphApi::new(
//!         &config.account,
//!         Duration::from_millis(config.options.min_request_delay_ms),
//!         config.options.max_retries,
//!         pool,
//!     )?;
//!
//!     // ... sync logic
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod cancel;
pub mod cli;
pub mod config;
pub mod download;
pub mod error;
pub mod fs;
pub mod media;
pub mod output;
pub mod store;

// Re-exports for convenience
pub use api::GraphApi;
pub use config::{Config, SyncMode};
pub use download::{run_batch, BatchSummary, GlobalState, SyncReport, SyncState, WallReport};
pub use error::{Error, Result};
pub use media::{MediaKind, MediaRef};
pub use store::MediaStore;
