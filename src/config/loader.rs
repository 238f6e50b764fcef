//! Configuration structures and loading logic.

use crate::config::modes::SyncMode;
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Main configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub targets: TargetsConfig,

    pub account: AccountConfig,

    #[serde(default)]
    pub options: OptionsConfig,

    #[serde(default)]
    pub proxy: ProxyConfig,

    #[serde(default)]
    pub store: StoreConfig,
}

/// Sync target configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TargetsConfig {
    /// Graph node IDs to sync, processed in order.
    #[serde(default)]
    pub ids: Vec<String>,
}

/// Graph API account configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountConfig {
    /// Graph API access token.
    pub access_token: String,

    /// Graph API base URL. Overridable for tests.
    #[serde(default = "default_api_base")]
    pub api_base: String,

    /// Graph API version segment.
    #[serde(default = "default_api_version")]
    pub api_version: String,

    /// User agent string sent with every request.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

/// Sync options configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OptionsConfig {
    /// Sync mode (full, photos, videos, wall, album).
    #[serde(default)]
    pub sync_mode: SyncMode,

    /// Base directory for downloads.
    #[serde(default)]
    pub download_directory: Option<PathBuf>,

    /// Album ID for album sync mode.
    #[serde(default)]
    pub album_id: Option<String>,

    /// Whether to fetch the highest-resolution rendition of each photo.
    #[serde(default = "default_true")]
    pub prefer_hd: bool,

    /// Minimum delay between paginated requests, in milliseconds.
    #[serde(default = "default_min_request_delay")]
    pub min_request_delay_ms: u64,

    /// Seconds to wait between targets in a batch.
    #[serde(default = "default_target_delay")]
    pub target_delay_seconds: u64,

    /// Retry budget for a single logical API call.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Nodes requested per page.
    #[serde(default = "default_page_size")]
    pub page_size: u32,

    /// Stop after this many pages per collection (unbounded if unset).
    #[serde(default)]
    pub max_pages: Option<u32>,

    /// Resume from persisted cursors.
    #[serde(default = "default_true")]
    pub resume: bool,

    /// Start pagination after this media ID (synthetic cursor).
    #[serde(default)]
    pub start_after: Option<String>,

    /// Whether to show download progress.
    #[serde(default = "default_true")]
    pub show_downloads: bool,

    /// Whether to show skipped downloads.
    #[serde(default = "default_true")]
    pub show_skipped_downloads: bool,
}

impl Default for OptionsConfig {
    fn default() -> Self {
        Self {
            sync_mode: SyncMode::default(),
            download_directory: None,
            album_id: None,
            prefer_hd: true,
            min_request_delay_ms: 500,
            target_delay_seconds: 5,
            max_retries: 17,
            page_size: 100,
            max_pages: None,
            resume: true,
            start_after: None,
            show_downloads: true,
            show_skipped_downloads: true,
        }
    }
}

/// Proxy pool configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProxyConfig {
    /// Whether outbound requests go through the proxy pool.
    #[serde(default)]
    pub enabled: bool,

    /// Inline proxy list (`host:port` or `scheme://[user:pass@]host:port`).
    #[serde(default)]
    pub proxies: Vec<String>,

    /// File with one proxy per line, appended to the inline list.
    #[serde(default)]
    pub proxy_file: Option<PathBuf>,

    /// Echo endpoint used by health checks.
    #[serde(default = "default_health_check_url")]
    pub health_check_url: String,

    /// Per-probe timeout for health checks, in seconds.
    #[serde(default = "default_probe_timeout")]
    pub probe_timeout_seconds: u64,
}

impl Default for ProxyConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            proxies: Vec::new(),
            proxy_file: None,
            health_check_url: default_health_check_url(),
            probe_timeout_seconds: default_probe_timeout(),
        }
    }
}

/// Local state store configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StoreConfig {
    /// SQLite database path. Defaults to the platform data directory.
    #[serde(default)]
    pub db_path: Option<PathBuf>,
}

fn default_api_base() -> String {
    "https://graph.facebook.com".to_string()
}

fn default_api_version() -> String {
    "v19.0".to_string()
}

fn default_user_agent() -> String {
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/144.0.0.0 Safari/537.36".to_string()
}

fn default_true() -> bool {
    true
}

fn default_min_request_delay() -> u64 {
    500
}

fn default_target_delay() -> u64 {
    5
}

fn default_max_retries() -> u32 {
    17
}

fn default_page_size() -> u32 {
    100
}

fn default_health_check_url() -> String {
    "https://api.ipify.org".to_string()
}

fn default_probe_timeout() -> u64 {
    10
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                Error::Config(format!(
                    "Configuration file not found: {}. Create one from config.example.toml",
                    path.display()
                ))
            } else {
                Error::Io(e)
            }
        })?;

        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to a TOML file.
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| Error::Config(format!("Failed to serialize config: {}", e)))?;
        fs::write(path, content)?;
        Ok(())
    }

    /// Get the effective download directory.
    pub fn download_directory(&self) -> PathBuf {
        self.options
            .download_directory
            .clone()
            .unwrap_or_else(|| std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")))
    }

    /// Get the effective state database path.
    pub fn state_db_path(&self) -> PathBuf {
        if let Some(path) = &self.store.db_path {
            return path.clone();
        }

        directories::ProjectDirs::from("", "", "facebook-downloader")
            .map(|dirs| dirs.data_dir().join("state.db"))
            .unwrap_or_else(|| PathBuf::from("state.db"))
    }

    /// Combined proxy list: inline entries plus the proxy file, in order.
    pub fn proxy_list(&self) -> Result<Vec<String>> {
        let mut list = self.proxy.proxies.clone();

        if let Some(path) = &self.proxy.proxy_file {
            let content = fs::read_to_string(path).map_err(|e| {
                Error::Config(format!(
                    "Failed to read proxy file {}: {}",
                    path.display(),
                    e
                ))
            })?;
            list.extend(
                content
                    .lines()
                    .map(|line| line.trim().to_string())
                    .filter(|line| !line.is_empty() && !line.starts_with('#')),
            );
        }

        Ok(list)
    }
}

impl Default for AccountConfig {
    fn default() -> Self {
        Self {
            access_token: String::new(),
            api_base: default_api_base(),
            api_version: default_api_version(),
            user_agent: default_user_agent(),
        }
    }
}
