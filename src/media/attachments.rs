//! Attachment flattening for wall posts.

use chrono::{DateTime, Utc};

use crate::api::types::Attachment;
use crate::media::item::{MediaKind, MediaRef};

/// Attachment type strings the vendor uses for inline videos.
const VIDEO_TYPES: [&str; 3] = ["video_inline", "video_autoplay", "video_direct_response"];

/// Flatten a post's attachment tree into downloadable media references.
///
/// `album` attachments recurse into their sub-attachments, which share
/// the same shape at arbitrary depth. Attachments that carry neither a
/// target ID nor a type are dropped without a word; anything else that
/// cannot be classified is logged at debug and skipped.
///
/// `post_created` stamps the extracted items, since attachments carry
/// no timestamp of their own.
pub fn flatten_attachments(
    attachments: &[Attachment],
    post_created: Option<DateTime<Utc>>,
) -> Vec<MediaRef> {
    let mut items = Vec::new();
    collect(attachments, post_created, &mut items);
    items
}

fn collect(
    attachments: &[Attachment],
    post_created: Option<DateTime<Utc>>,
    out: &mut Vec<MediaRef>,
) {
    for attachment in attachments {
        let target_id = attachment
            .target
            .as_ref()
            .and_then(|t| t.id.as_deref())
            .filter(|id| !id.is_empty());
        let attachment_type = attachment.attachment_type.as_deref();

        if target_id.is_none() && attachment_type.is_none() {
            continue;
        }

        match attachment_type {
            Some("photo") => {
                let (Some(id), Some(url)) = (target_id, photo_url(attachment)) else {
                    tracing::debug!("Skipping photo attachment without target ID or image URL");
                    continue;
                };
                out.push(MediaRef {
                    media_id: id.to_string(),
                    kind: MediaKind::Photo,
                    url,
                    created_time: post_created,
                });
            }
            Some(t) if VIDEO_TYPES.contains(&t) => {
                let source = attachment.media.as_ref().and_then(|m| m.source.clone());
                let (Some(id), Some(url)) = (target_id, source) else {
                    tracing::debug!("Skipping {} attachment without target ID or source", t);
                    continue;
                };
                out.push(MediaRef {
                    media_id: id.to_string(),
                    kind: MediaKind::Video,
                    url,
                    created_time: post_created,
                });
            }
            Some("album") => {
                if let Some(subs) = &attachment.subattachments {
                    collect(&subs.data, post_created, out);
                }
            }
            Some(other) => {
                tracing::debug!("Ignoring non-media attachment type '{}'", other);
            }
            None => {
                tracing::debug!("Skipping untyped attachment");
            }
        }
    }
}

fn photo_url(attachment: &Attachment) -> Option<String> {
    attachment
        .media
        .as_ref()
        .and_then(|m| m.image.as_ref())
        .map(|img| img.src.clone())
}
