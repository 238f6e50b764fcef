//! Wall-post media sync.
//!
//! The feed hands back fully-formed `paging.next` URLs rather than a
//! reliable cursors block, so continuation follows the link. Only the
//! `after` parameter extracted from it is ever persisted.

use std::time::Duration;

use rand::Rng;
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;

use crate::api::types::FeedPost;
use crate::api::GraphApi;
use crate::config::{CollectionKind, Config};
use crate::download::media::sync_media_item;
use crate::download::pager::{clear_position, persist_position, synthetic_cursor, LinkPager};
use crate::download::state::{SyncState, WallReport};
use crate::error::Result;
use crate::media::{flatten_attachments, parse_created_time};
use crate::store::MediaStore;

/// Sync media attached to the target's wall posts (`/{user}/feed`).
pub async fn sync_wall(
    api: &GraphApi,
    config: &Config,
    store: &MediaStore,
    state: &mut SyncState,
    cancel: &CancellationToken,
) -> Result<WallReport> {
    let collection = CollectionKind::Wall;
    let delay = Duration::from_millis(config.options.min_request_delay_ms);
    let mut pager = LinkPager::new(config.options.max_pages, delay);
    let before = state.counts();

    // The first request goes through the typed endpoint; --start-after
    // and persisted state both enter as its `after` parameter.
    let mut first_after: Option<String> = None;
    if let Some(media_id) = &config.options.start_after {
        tracing::info!("Starting {} after media {}", collection, media_id);
        first_after = Some(synthetic_cursor(media_id));
    } else if config.options.resume {
        match store.load_cursor(state.owner_id, collection.as_key()) {
            Ok(Some(saved)) => {
                tracing::info!("Resuming {} from page {}", collection, saved.pages_loaded + 1);
                pager = pager.with_pages_loaded(saved.pages_loaded);
                first_after = Some(saved.cursor);
            }
            Ok(None) => {}
            Err(e) => tracing::warn!("Failed to load {} cursor: {}", collection, e),
        }
    }

    tracing::info!("Syncing wall media for {}...", state.label());

    let mut fetched_first = false;

    while pager.should_fetch() {
        if cancel.is_cancelled() {
            tracing::info!("Cancelled while syncing {} for {}", collection, state.label());
            return Ok(state.wall_report_since(before));
        }

        pager.pace().await;

        let page = if !fetched_first {
            fetched_first = true;
            api.get_feed_page(
                &state.target_id,
                config.options.page_size,
                first_after.as_deref(),
            )
            .await?
        } else {
            let next_url = match pager.next_link() {
                Some(url) => url.to_string(),
                None => break,
            };
            api.get_next_page::<FeedPost>(&next_url).await?
        };

        let page = match page {
            Some(page) => page,
            None => {
                tracing::warn!("Lost a page of {} to the retry budget, moving on", collection);
                break;
            }
        };

        for post in &page.data {
            let post_created = post.created_time.as_deref().and_then(parse_created_time);
            let attachments = post
                .attachments
                .as_ref()
                .map(|list| list.data.as_slice())
                .unwrap_or_default();

            for item in flatten_attachments(attachments, post_created) {
                let delay_ms = rand::thread_rng().gen_range(400..750);
                sleep(Duration::from_millis(delay_ms)).await;

                if let Err(e) = sync_media_item(api, config, store, state, &item).await {
                    tracing::warn!("Failed to download media {}: {}", item.media_id, e);
                    state.increment_error();
                }
            }
        }

        pager.page_received(page.data.len(), page.paging.as_ref());
        persist_position(
            store,
            state.owner_id,
            collection,
            pager.persistable_cursor().as_deref(),
            pager.pages_loaded(),
        );
    }

    if pager.completed() {
        clear_position(store, state.owner_id, collection);
    }

    let report = state.wall_report_since(before);
    tracing::info!(
        "Wall media for {}: {} photos, {} videos, {} skipped",
        state.label(),
        report.saved_photos,
        report.saved_videos,
        report.skipped_photos + report.skipped_videos
    );

    Ok(report)
}
