//! Batch orchestration across sync targets.

use std::time::Duration;

use tokio::time::sleep;
use tokio_util::sync::CancellationToken;

use crate::api::GraphApi;
use crate::config::{Config, SyncMode};
use crate::download::state::{GlobalState, SyncState};
use crate::download::{albums, uploads, videos, wall};
use crate::error::{Error, Result};
use crate::output::stats::print_target_stats;
use crate::store::MediaStore;

/// Outcome of one target's sync.
#[derive(Debug)]
pub struct TargetOutcome {
    pub target: String,
    pub saved: u64,
    pub skipped: u64,
    pub errors: u64,
    /// Fatal error text when the target's sync aborted.
    pub failed: Option<String>,
}

/// Aggregated outcome of a whole run.
#[derive(Debug, Default)]
pub struct BatchSummary {
    pub outcomes: Vec<TargetOutcome>,
    pub cancelled: bool,
}

impl BatchSummary {
    pub fn failed_count(&self) -> usize {
        self.outcomes.iter().filter(|o| o.failed.is_some()).count()
    }
}

/// Run the configured sync mode across all targets, strictly one at a
/// time with a fixed pause in between.
pub async fn run_batch(
    api: &GraphApi,
    config: &Config,
    store: &MediaStore,
    global: &mut GlobalState,
    cancel: &CancellationToken,
) -> Result<BatchSummary> {
    let targets: Vec<String> = match config.options.sync_mode {
        // In album mode the album node is the sole target.
        SyncMode::Album => {
            let album_id = config
                .options
                .album_id
                .clone()
                .ok_or_else(|| Error::MissingConfig("album_id is required in album mode".into()))?;
            vec![album_id]
        }
        _ => config.targets.ids.clone(),
    };

    let mut summary = BatchSummary::default();

    for (index, target) in targets.iter().enumerate() {
        if cancel.is_cancelled() {
            summary.cancelled = true;
            break;
        }

        if index > 0 && config.options.target_delay_seconds > 0 {
            sleep(Duration::from_secs(config.options.target_delay_seconds)).await;
        }

        let outcome = sync_target(api, config, store, global, cancel, target).await;
        summary.outcomes.push(outcome);
    }

    if cancel.is_cancelled() {
        summary.cancelled = true;
    }

    Ok(summary)
}

/// Sync a single target according to the configured mode.
async fn sync_target(
    api: &GraphApi,
    config: &Config,
    store: &MediaStore,
    global: &mut GlobalState,
    cancel: &CancellationToken,
    target: &str,
) -> TargetOutcome {
    tracing::info!("Processing target {}", target);

    // Resolve the display name. Code 100 means the node does not exist
    // or is not visible to this token; anything else degrades to using
    // the id as the folder name.
    let name = match api.get_node_metadata(target).await {
        Ok(Some(metadata)) => metadata.name,
        Ok(None) => None,
        Err(Error::Graph { code: 100, message }) => {
            let error = Error::TargetNotFound(format!("{}: {}", target, message));
            tracing::error!("{}", error);
            global.mark_target_failed();
            return failed_outcome(target, &error.to_string());
        }
        Err(e) => {
            tracing::warn!("Metadata lookup for {} failed: {}", target, e);
            None
        }
    };

    // Without an owner row there is no dedup key to work under.
    let owner = match store.get_or_create_owner(target, name.as_deref()) {
        Ok(owner) => owner,
        Err(e) => {
            tracing::error!("Cannot open sync state for {}: {}", target, e);
            global.mark_target_failed();
            return failed_outcome(target, &e.to_string());
        }
    };

    let mut state = SyncState::new(target.to_string(), owner.id);
    state.target_name = owner.name.clone();

    let result: Result<()> = match config.options.sync_mode {
        SyncMode::Full => sync_full(api, config, store, &mut state, cancel).await,
        SyncMode::Photos => uploads::sync_uploads(api, config, store, &mut state, cancel)
            .await
            .map(|_| ()),
        SyncMode::Videos => videos::sync_videos(api, config, store, &mut state, cancel)
            .await
            .map(|_| ()),
        SyncMode::Wall => wall::sync_wall(api, config, store, &mut state, cancel)
            .await
            .map(|_| ()),
        SyncMode::Album => albums::sync_album(api, config, store, &mut state, cancel)
            .await
            .map(|_| ()),
    };

    let outcome = TargetOutcome {
        target: target.to_string(),
        saved: state.total_saved(),
        skipped: state.total_skipped(),
        errors: state.error_count,
        failed: result.as_ref().err().map(|e| e.to_string()),
    };

    match result {
        Ok(()) => {
            print_target_stats(&state);
            global.add_target_stats(&state);
        }
        Err(e) => {
            tracing::error!("Sync of {} failed: {}", target, e);
            global.mark_target_failed();
        }
    }

    outcome
}

/// Full mode walks every collection of the target in order.
async fn sync_full(
    api: &GraphApi,
    config: &Config,
    store: &MediaStore,
    state: &mut SyncState,
    cancel: &CancellationToken,
) -> Result<()> {
    uploads::sync_uploads(api, config, store, state, cancel).await?;
    if cancel.is_cancelled() {
        return Ok(());
    }

    videos::sync_videos(api, config, store, state, cancel).await?;
    if cancel.is_cancelled() {
        return Ok(());
    }

    wall::sync_wall(api, config, store, state, cancel).await?;
    Ok(())
}

fn failed_outcome(target: &str, message: &str) -> TargetOutcome {
    TargetOutcome {
        target: target.to_string(),
        saved: 0,
        skipped: 0,
        errors: 0,
        failed: Some(message.to_string()),
    }
}
