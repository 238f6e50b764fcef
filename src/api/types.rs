//! Graph API response type definitions.

use serde::Deserialize;
use std::collections::HashMap;

/// One page of a paginated Graph collection.
#[derive(Debug, Deserialize)]
pub struct Page<T> {
    #[serde(default = "Vec::new")]
    pub data: Vec<T>,
    pub paging: Option<Paging>,
}

/// Paging block attached to collection responses.
#[derive(Debug, Clone, Deserialize)]
pub struct Paging {
    pub cursors: Option<Cursors>,
    pub next: Option<String>,
    pub previous: Option<String>,
}

/// Opaque cursor pair inside a paging block.
#[derive(Debug, Clone, Deserialize)]
pub struct Cursors {
    pub before: Option<String>,
    pub after: Option<String>,
}

/// A photo node.
#[derive(Debug, Clone, Deserialize)]
pub struct PhotoNode {
    pub id: String,
    pub created_time: Option<String>,
    /// Default-resolution URL, present when `source` is requested.
    pub source: Option<String>,
    pub name: Option<String>,
    /// Rendition candidates, largest first, present when `images` is requested.
    #[serde(default)]
    pub images: Vec<ImageCandidate>,
}

/// One rendition of a photo.
#[derive(Debug, Clone, Deserialize)]
pub struct ImageCandidate {
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub source: String,
}

/// A video node. `source` is the direct MP4 URL.
#[derive(Debug, Clone, Deserialize)]
pub struct VideoNode {
    pub id: String,
    pub created_time: Option<String>,
    pub source: Option<String>,
    pub description: Option<String>,
}

/// A wall post with its attachments expanded.
#[derive(Debug, Clone, Deserialize)]
pub struct FeedPost {
    pub id: String,
    pub created_time: Option<String>,
    pub attachments: Option<AttachmentList>,
}

/// Wrapper around attachment arrays (`attachments` and `subattachments`
/// share this shape).
#[derive(Debug, Clone, Deserialize)]
pub struct AttachmentList {
    #[serde(default)]
    pub data: Vec<Attachment>,
}

/// A single post attachment. Albums nest further attachments under
/// `subattachments`.
#[derive(Debug, Clone, Deserialize)]
pub struct Attachment {
    #[serde(rename = "type")]
    pub attachment_type: Option<String>,
    pub target: Option<AttachmentTarget>,
    pub media: Option<AttachmentMedia>,
    pub url: Option<String>,
    pub title: Option<String>,
    pub subattachments: Option<AttachmentList>,
}

/// The node an attachment points at.
#[derive(Debug, Clone, Deserialize)]
pub struct AttachmentTarget {
    pub id: Option<String>,
    pub url: Option<String>,
}

/// Inline media of an attachment.
#[derive(Debug, Clone, Deserialize)]
pub struct AttachmentMedia {
    pub image: Option<MediaImage>,
    /// Direct video URL on video attachments.
    pub source: Option<String>,
}

/// Preview image inside attachment media.
#[derive(Debug, Clone, Deserialize)]
pub struct MediaImage {
    pub src: String,
    pub width: Option<u32>,
    pub height: Option<u32>,
}

/// Identity fields of an arbitrary Graph node.
#[derive(Debug, Clone, Deserialize)]
pub struct NodeMetadata {
    pub id: String,
    pub name: Option<String>,
}

/// Error envelope returned with non-2xx responses and some 200s.
#[derive(Debug, Deserialize)]
pub struct ErrorEnvelope {
    pub error: GraphError,
}

/// The error object inside an envelope.
#[derive(Debug, Clone, Deserialize)]
pub struct GraphError {
    #[serde(default)]
    pub message: String,
    pub code: Option<i64>,
    pub error_subcode: Option<i64>,
    #[serde(rename = "type")]
    pub error_type: Option<String>,
}

/// Body of the `x-app-usage` response header. Each field is a percentage
/// of the rolling one-hour window the vendor allows.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct AppUsage {
    #[serde(default)]
    pub call_count: u32,
    #[serde(default)]
    pub total_cputime: u32,
    #[serde(default)]
    pub total_time: u32,
}

/// One entry of the `x-business-use-case-usage` header. Only the regain
/// estimate matters here; it is reported in minutes.
#[derive(Debug, Clone, Deserialize)]
pub struct BusinessUseCaseEntry {
    pub estimated_time_to_regain_access: Option<u64>,
}

/// The `x-business-use-case-usage` header maps business IDs to usage
/// entry lists.
pub type BusinessUseCaseUsage = HashMap<String, Vec<BusinessUseCaseEntry>>;
