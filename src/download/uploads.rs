//! Uploaded-photo sync.

use std::time::Duration;

use rand::Rng;
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;

use crate::api::GraphApi;
use crate::config::{CollectionKind, Config};
use crate::download::media::sync_media_item;
use crate::download::pager::{clear_position, persist_position, seed_pager};
use crate::download::state::{SyncReport, SyncState};
use crate::error::Result;
use crate::media::MediaRef;
use crate::store::MediaStore;

/// Sync the target's uploaded photos (`/{user}/photos?type=uploaded`).
pub async fn sync_uploads(
    api: &GraphApi,
    config: &Config,
    store: &MediaStore,
    state: &mut SyncState,
    cancel: &CancellationToken,
) -> Result<SyncReport> {
    let collection = CollectionKind::Uploads;
    let mut pager = seed_pager(config, store, state.owner_id, collection);
    let before = state.counts();

    tracing::info!("Syncing uploaded photos for {}...", state.label());

    while pager.should_fetch() {
        if cancel.is_cancelled() {
            tracing::info!("Cancelled while syncing {} for {}", collection, state.label());
            return Ok(state.report_since(before));
        }

        pager.pace().await;

        let page = match api
            .get_uploaded_photos_page(&state.target_id, config.options.page_size, pager.after())
            .await?
        {
            Some(page) => page,
            None => {
                tracing::warn!("Lost a page of {} to the retry budget, moving on", collection);
                break;
            }
        };

        let items: Vec<MediaRef> = page.data.iter().filter_map(MediaRef::from_photo).collect();

        for item in &items {
            let delay_ms = rand::thread_rng().gen_range(400..750);
            sleep(Duration::from_millis(delay_ms)).await;

            if let Err(e) = sync_media_item(api, config, store, state, item).await {
                tracing::warn!("Failed to download media {}: {}", item.media_id, e);
                state.increment_error();
            }
        }

        pager.page_received(page.data.len(), page.paging.as_ref());
        persist_position(
            store,
            state.owner_id,
            collection,
            pager.after(),
            pager.pages_loaded(),
        );
    }

    if pager.completed() {
        clear_position(store, state.owner_id, collection);
    }

    let report = state.report_since(before);
    let upgrades = state.upgrades_since(before);
    tracing::info!(
        "Uploaded photos for {}: {} new, {} skipped, {} upgraded",
        state.label(),
        report.saved,
        report.skipped,
        upgrades
    );

    Ok(report)
}
