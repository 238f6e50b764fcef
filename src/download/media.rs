//! Media file downloading.

use std::path::{Path, PathBuf};

use futures::StreamExt;
use indicatif::ProgressBar;
use reqwest::header;
use tokio::fs::File;
use tokio::io::AsyncWriteExt;

use crate::api::{GraphApi, ImageCandidate};
use crate::config::Config;
use crate::download::state::SyncState;
use crate::error::{Error, Result};
use crate::fs::naming::{pick_extension, sanitize_filename};
use crate::fs::paths::get_download_path;
use crate::media::{MediaKind, MediaRef};
use crate::output::progress::create_download_bar;
use crate::store::{MediaStore, SkipDecision};

/// Minimum file size to show progress bar (20 MB).
const PROGRESS_THRESHOLD: u64 = 20 * 1024 * 1024;

/// Download one media item, honoring the dedup store.
///
/// Already-synced items are skipped without network work; a standard
/// copy with HD wanted triggers an in-place upgrade. The store stays
/// advisory: if it cannot be read the item downloads again, and if it
/// cannot be written the file still lands on disk.
pub async fn sync_media_item(
    api: &GraphApi,
    config: &Config,
    store: &MediaStore,
    state: &mut SyncState,
    item: &MediaRef,
) -> Result<()> {
    let want_hd = config.options.prefer_hd && item.kind == MediaKind::Photo;

    let decision = match store.skip_decision(state.owner_id, &item.media_id, want_hd) {
        Ok(decision) => decision,
        Err(e) => {
            tracing::warn!(
                "State lookup failed for {}: {}. Treating as new",
                item.media_id,
                e
            );
            SkipDecision::Proceed
        }
    };

    if decision == SkipDecision::Skip {
        state.increment_skip(item.kind);
        if config.options.show_skipped_downloads {
            tracing::debug!("Skipping already synced media: {}", item.media_id);
        }
        return Ok(());
    }

    let upgrading = decision == SkipDecision::Upgrade;

    let (url, is_hd) = match resolve_url(api, item, want_hd, upgrading).await {
        Some(resolved) => resolved,
        None => {
            // Failed upgrade: the standard copy stays as-is.
            state.increment_skip(item.kind);
            return Ok(());
        }
    };

    let target_dir = get_download_path(config, state.label(), item.kind)?;
    tokio::fs::create_dir_all(&target_dir).await?;

    let final_path = download_file(api, config, &url, &target_dir, item).await?;

    // A failure here risks a duplicate download next run, nothing worse.
    if let Err(e) = store.record_saved(state.owner_id, &item.media_id, is_hd, &final_path) {
        tracing::warn!(
            "Failed to record {} in the state store: {}",
            item.media_id,
            e
        );
    }

    state.increment_saved(item.kind);
    if upgrading {
        state.increment_upgrade();
    }

    if config.options.show_downloads {
        if upgrading {
            tracing::info!("Upgraded: {}", final_path.display());
        } else {
            tracing::info!("Downloaded: {}", final_path.display());
        }
    }

    Ok(())
}

/// Pick the URL to download and the quality it represents.
///
/// Photos get one extra metadata call for the largest rendition when HD
/// is wanted. Fresh items fall back to the URL already in hand if that
/// lookup fails; an upgrade without a better rendition yields `None` so
/// the caller leaves the existing record alone.
async fn resolve_url(
    api: &GraphApi,
    item: &MediaRef,
    want_hd: bool,
    upgrading: bool,
) -> Option<(String, bool)> {
    if item.kind == MediaKind::Video {
        // Videos expose a single direct source.
        return Some((item.url.clone(), true));
    }

    if !want_hd {
        return Some((item.url.clone(), false));
    }

    match api.get_photo_images(&item.media_id).await {
        Ok(Some(node)) => {
            if let Some(best) = largest_candidate(&node.images) {
                return Some((best.source.clone(), true));
            }
            tracing::debug!("No rendition candidates for {}", item.media_id);
        }
        Ok(None) => {
            tracing::warn!(
                "Rendition lookup for {} exhausted its retries",
                item.media_id
            );
        }
        Err(e) => {
            tracing::warn!("Rendition lookup for {} failed: {}", item.media_id, e);
        }
    }

    if upgrading {
        None
    } else {
        Some((item.url.clone(), false))
    }
}

/// Largest rendition by pixel count. The vendor sorts these largest
/// first, so ties resolve to the earliest entry.
fn largest_candidate(images: &[ImageCandidate]) -> Option<&ImageCandidate> {
    images
        .iter()
        .rev()
        .max_by_key(|c| c.width.unwrap_or(0) as u64 * c.height.unwrap_or(0) as u64)
}

/// Stream a URL to disk through a temp file, renaming into place only
/// on complete success. The final path never holds a partial body.
async fn download_file(
    api: &GraphApi,
    config: &Config,
    url: &str,
    target_dir: &Path,
    item: &MediaRef,
) -> Result<PathBuf> {
    let response = api.download_response(url).await?;

    let content_type = response
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_string());
    let extension = pick_extension(url, content_type.as_deref(), item.kind);

    // Vendor ids land in the name verbatim; reject anything that is
    // not a bare filename.
    let filename = sanitize_filename(&item.generate_filename(&extension))?;
    let final_path = target_dir.join(&filename);
    let temp_path = target_dir.join(format!("{}.tmp", filename));

    let content_length = response.content_length();
    let show_progress = config.options.show_downloads
        && match content_length {
            Some(len) => len > PROGRESS_THRESHOLD,
            // Unknown length: only videos are likely big enough to watch.
            None => item.kind == MediaKind::Video,
        };

    let progress = show_progress.then(|| create_download_bar(content_length));

    let streamed = stream_to_file(response, &temp_path, progress.as_ref()).await;

    if let Some(pb) = progress {
        pb.finish_and_clear();
    }

    if let Err(e) = streamed {
        let _ = tokio::fs::remove_file(&temp_path).await;
        return Err(e);
    }

    if let Err(e) = tokio::fs::rename(&temp_path, &final_path).await {
        let _ = tokio::fs::remove_file(&temp_path).await;
        return Err(Error::Download(format!(
            "Failed to move {} into place: {}",
            temp_path.display(),
            e
        )));
    }

    Ok(final_path)
}

async fn stream_to_file(
    response: reqwest::Response,
    path: &Path,
    progress: Option<&ProgressBar>,
) -> Result<()> {
    let mut file = File::create(path).await?;
    let mut stream = response.bytes_stream();
    let mut downloaded: u64 = 0;

    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(|e| Error::Download(format!("Stream error: {}", e)))?;
        file.write_all(&chunk).await?;
        downloaded += chunk.len() as u64;

        if let Some(pb) = progress {
            pb.set_position(downloaded);
        }
    }

    file.flush().await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidate(width: u32, height: u32, source: &str) -> ImageCandidate {
        ImageCandidate {
            width: Some(width),
            height: Some(height),
            source: source.to_string(),
        }
    }

    #[test]
    fn test_largest_candidate_by_pixel_count() {
        let images = vec![
            candidate(720, 480, "mid"),
            candidate(2048, 1536, "big"),
            candidate(130, 130, "thumb"),
        ];
        assert_eq!(largest_candidate(&images).unwrap().source, "big");
    }

    #[test]
    fn test_largest_candidate_prefers_head_on_tie() {
        // The vendor sorts largest first; without dimensions that order
        // is the only signal.
        let images = vec![
            ImageCandidate {
                width: None,
                height: None,
                source: "first".to_string(),
            },
            ImageCandidate {
                width: None,
                height: None,
                source: "second".to_string(),
            },
        ];
        assert_eq!(largest_candidate(&images).unwrap().source, "first");
    }

    #[test]
    fn test_largest_candidate_empty() {
        assert!(largest_candidate(&[]).is_none());
    }
}
