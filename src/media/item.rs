//! Media reference representation.

use chrono::{DateTime, Utc};

use crate::api::types::{PhotoNode, VideoNode};

/// Kind of media content.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    Photo,
    Video,
}

impl MediaKind {
    /// Get the folder name for this media kind.
    pub fn folder_name(&self) -> &'static str {
        match self {
            MediaKind::Photo => "Photos",
            MediaKind::Video => "Videos",
        }
    }
}

/// A downloadable media reference extracted from a Graph response.
#[derive(Debug, Clone)]
pub struct MediaRef {
    /// Vendor media ID. Together with the owner this is the dedup key.
    pub media_id: String,

    pub kind: MediaKind,

    /// URL already in hand from the collection page. For photos this is
    /// the standard rendition; HD upgrades refetch per item.
    pub url: String,

    /// Vendor creation time, when the node carried one.
    pub created_time: Option<DateTime<Utc>>,
}

impl MediaRef {
    /// Build a reference from a photo node. Nodes without a source URL
    /// cannot be downloaded and yield `None`.
    pub fn from_photo(node: &PhotoNode) -> Option<Self> {
        let url = node.source.clone()?;
        Some(Self {
            media_id: node.id.clone(),
            kind: MediaKind::Photo,
            url,
            created_time: node.created_time.as_deref().and_then(parse_created_time),
        })
    }

    /// Build a reference from a video node. Nodes without a source URL
    /// cannot be downloaded and yield `None`.
    pub fn from_video(node: &VideoNode) -> Option<Self> {
        let url = node.source.clone()?;
        Some(Self {
            media_id: node.id.clone(),
            kind: MediaKind::Video,
            url,
            created_time: node.created_time.as_deref().and_then(parse_created_time),
        })
    }

    /// Generate the filename for this media reference.
    pub fn generate_filename(&self, extension: &str) -> String {
        format!("{}_{}.{}", self.format_timestamp(), self.media_id, extension)
    }

    fn format_timestamp(&self) -> String {
        match self.created_time {
            Some(dt) => dt.format("%Y-%m-%dT%H-%M-%S").to_string(),
            None => "undated".to_string(),
        }
    }
}

/// Parse the vendor's `created_time` format (`2015-03-04T14:25:06+0000`).
pub fn parse_created_time(value: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%z")
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}
