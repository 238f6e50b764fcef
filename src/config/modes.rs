//! Sync mode definitions.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Available sync modes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SyncMode {
    /// Sync uploaded photos, feed videos, and wall attachments (default).
    #[default]
    Full,
    /// Sync only the target's uploaded photos.
    Photos,
    /// Sync only the target's feed videos.
    Videos,
    /// Sync only media attached to wall posts.
    Wall,
    /// Sync a single album by ID.
    Album,
}

impl fmt::Display for SyncMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SyncMode::Full => write!(f, "full"),
            SyncMode::Photos => write!(f, "photos"),
            SyncMode::Videos => write!(f, "videos"),
            SyncMode::Wall => write!(f, "wall"),
            SyncMode::Album => write!(f, "album"),
        }
    }
}

impl FromStr for SyncMode {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "full" => Ok(SyncMode::Full),
            "photos" => Ok(SyncMode::Photos),
            "videos" => Ok(SyncMode::Videos),
            "wall" => Ok(SyncMode::Wall),
            "album" => Ok(SyncMode::Album),
            _ => Err(format!("Unknown sync mode: {}", s)),
        }
    }
}

/// Remote collection currently being synced. Also the stable key under
/// which resume cursors are persisted, so variants must keep their names.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollectionKind {
    AlbumPhotos,
    Uploads,
    FeedVideos,
    Wall,
}

impl CollectionKind {
    /// Stable storage key for the cursor table.
    pub fn as_key(&self) -> &'static str {
        match self {
            CollectionKind::AlbumPhotos => "album_photos",
            CollectionKind::Uploads => "uploads",
            CollectionKind::FeedVideos => "feed_videos",
            CollectionKind::Wall => "wall",
        }
    }
}

impl fmt::Display for CollectionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CollectionKind::AlbumPhotos => write!(f, "album photos"),
            CollectionKind::Uploads => write!(f, "uploaded photos"),
            CollectionKind::FeedVideos => write!(f, "feed videos"),
            CollectionKind::Wall => write!(f, "wall media"),
        }
    }
}
