//! Command-line argument definitions using clap.

use clap::{Parser, ValueEnum};
use std::path::PathBuf;

use crate::config::{Config, SyncMode};

/// Facebook media downloader CLI.
#[derive(Parser, Debug)]
#[command(
    name = "facebook-downloader",
    version,
    about = "Mirror photos and videos from Facebook pages and profiles",
    long_about = "A CLI tool to incrementally mirror media from the Facebook Graph API.\n\n\
                  Supports uploaded photos, feed videos, wall-post attachments, and single albums,\n\
                  with persistent dedup and resumable pagination."
)]
pub struct Args {
    /// Target node ID(s) to sync.
    /// Can specify multiple targets separated by spaces.
    #[arg(short, long, value_delimiter = ' ', num_args = 1..)]
    pub target: Option<Vec<String>>,

    /// Base directory for downloads.
    #[arg(short = 'd', long = "directory")]
    pub download_directory: Option<PathBuf>,

    /// Graph API access token.
    #[arg(long, env = "FACEBOOK_ACCESS_TOKEN")]
    pub token: Option<String>,

    /// Browser user agent string.
    #[arg(short = 'a', long = "user-agent", env = "FACEBOOK_USER_AGENT")]
    pub user_agent: Option<String>,

    /// Graph API version segment, e.g. v19.0.
    #[arg(long = "api-version")]
    pub api_version: Option<String>,

    /// Sync mode.
    #[arg(long, value_enum)]
    pub mode: Option<SyncModeArg>,

    /// Album ID or URL for album mode.
    #[arg(long)]
    pub album: Option<String>,

    /// Start pagination after this media ID instead of the head.
    #[arg(long = "start-after")]
    pub start_after: Option<String>,

    /// Ignore persisted cursors and walk collections from the head.
    #[arg(long = "no-resume")]
    pub no_resume: bool,

    /// Keep standard renditions; skip the per-photo HD lookup.
    #[arg(long = "no-hd")]
    pub no_hd: bool,

    /// Stop each collection after this many pages.
    #[arg(long = "max-pages")]
    pub max_pages: Option<u32>,

    /// Path to configuration file.
    #[arg(short, long, default_value = "config.toml")]
    pub config: PathBuf,

    /// Probe every configured proxy and exit.
    #[arg(long = "check-proxies")]
    pub check_proxies: bool,

    /// With --check-proxies: drop dead entries from the config file.
    #[arg(long = "remove-dead", requires = "check_proxies")]
    pub remove_dead: bool,

    /// Hide download progress information.
    #[arg(long, short)]
    pub quiet: bool,

    /// Show information about skipped downloads.
    #[arg(long)]
    pub show_skipped: bool,

    /// Enable debug logging.
    #[arg(long)]
    pub debug: bool,
}

/// CLI sync mode argument.
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum SyncModeArg {
    /// Sync uploaded photos, feed videos, and wall attachments.
    Full,
    /// Sync only uploaded photos.
    Photos,
    /// Sync only feed videos.
    Videos,
    /// Sync only wall-post attachments.
    Wall,
    /// Sync a single album by ID.
    Album,
}

impl From<SyncModeArg> for SyncMode {
    fn from(arg: SyncModeArg) -> Self {
        match arg {
            SyncModeArg::Full => SyncMode::Full,
            SyncModeArg::Photos => SyncMode::Photos,
            SyncModeArg::Videos => SyncMode::Videos,
            SyncModeArg::Wall => SyncMode::Wall,
            SyncModeArg::Album => SyncMode::Album,
        }
    }
}

impl Args {
    /// Merge CLI arguments into an existing config, overriding where specified.
    pub fn merge_into_config(self, config: &mut Config) {
        // Override targets if provided
        if let Some(targets) = self.target {
            config.targets.ids = targets;
        }

        // Override account settings if provided
        if let Some(token) = self.token {
            config.account.access_token = token;
        }

        if let Some(user_agent) = self.user_agent {
            config.account.user_agent = user_agent;
        }

        if let Some(version) = self.api_version {
            config.account.api_version = version;
        }

        // Override options if provided
        if let Some(dir) = self.download_directory {
            config.options.download_directory = Some(dir);
        }

        if let Some(mode) = self.mode {
            config.options.sync_mode = mode.into();
        }

        if let Some(album) = self.album {
            config.options.album_id = Some(album);
            // --album alone is unambiguous about the intent.
            if self.mode.is_none() {
                config.options.sync_mode = SyncMode::Album;
            }
        }

        if let Some(media_id) = self.start_after {
            config.options.start_after = Some(media_id);
        }

        if let Some(max_pages) = self.max_pages {
            config.options.max_pages = Some(max_pages);
        }

        // Boolean flags (only override if set to non-default)
        if self.no_resume {
            config.options.resume = false;
        }

        if self.no_hd {
            config.options.prefer_hd = false;
        }

        if self.quiet {
            config.options.show_downloads = false;
            config.options.show_skipped_downloads = false;
        }

        if self.show_skipped {
            config.options.show_skipped_downloads = true;
        }
    }
}
