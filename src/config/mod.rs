//! Configuration module for the facebook-downloader.
//!
//! This module handles:
//! - Loading configuration from TOML files
//! - CLI argument parsing and merging
//! - Configuration validation

pub mod loader;
pub mod modes;
pub mod validation;

pub use loader::{AccountConfig, Config, OptionsConfig, ProxyConfig, StoreConfig, TargetsConfig};
pub use modes::{CollectionKind, SyncMode};
pub use validation::{parse_album_id, validate_config};
