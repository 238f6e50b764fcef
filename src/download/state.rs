//! Sync state tracking and per-run reports.

use crate::media::MediaKind;

/// Per-target sync state.
#[derive(Debug)]
pub struct SyncState {
    /// Graph node ID of the target being synced.
    pub target_id: String,

    /// Display name, when the metadata lookup produced one.
    pub target_name: Option<String>,

    /// Store row backing the (owner, media) dedup key.
    pub owner_id: i64,

    // Statistics
    pub photo_count: u64,
    pub video_count: u64,
    pub upgrade_count: u64,
    pub skipped_photos: u64,
    pub skipped_videos: u64,
    pub error_count: u64,
}

/// Counter snapshot, taken before a collection walk so the walk's own
/// numbers can be reported afterwards.
#[derive(Debug, Clone, Copy)]
pub struct Counts {
    photos: u64,
    videos: u64,
    upgrades: u64,
    skipped_photos: u64,
    skipped_videos: u64,
    errors: u64,
}

/// What one collection walk did.
#[derive(Debug, Clone, Copy)]
pub struct SyncReport {
    pub saved: u64,
    pub skipped: u64,
    pub errors: u64,
}

/// What a wall walk did, split by media kind.
#[derive(Debug, Clone, Copy)]
pub struct WallReport {
    pub saved_photos: u64,
    pub saved_videos: u64,
    pub skipped_photos: u64,
    pub skipped_videos: u64,
    pub errors: u64,
}

impl SyncState {
    /// Create a new sync state for a target.
    pub fn new(target_id: String, owner_id: i64) -> Self {
        Self {
            target_id,
            target_name: None,
            owner_id,
            photo_count: 0,
            video_count: 0,
            upgrade_count: 0,
            skipped_photos: 0,
            skipped_videos: 0,
            error_count: 0,
        }
    }

    /// Folder and log label: display name when known, node ID otherwise.
    pub fn label(&self) -> &str {
        self.target_name.as_deref().unwrap_or(&self.target_id)
    }

    /// Increment the saved counter for a media kind.
    pub fn increment_saved(&mut self, kind: MediaKind) {
        match kind {
            MediaKind::Photo => self.photo_count += 1,
            MediaKind::Video => self.video_count += 1,
        }
    }

    /// Increment the skip counter for a media kind.
    pub fn increment_skip(&mut self, kind: MediaKind) {
        match kind {
            MediaKind::Photo => self.skipped_photos += 1,
            MediaKind::Video => self.skipped_videos += 1,
        }
    }

    /// Increment upgrade count.
    pub fn increment_upgrade(&mut self) {
        self.upgrade_count += 1;
    }

    /// Increment error count.
    pub fn increment_error(&mut self) {
        self.error_count += 1;
    }

    /// Get total saved count.
    pub fn total_saved(&self) -> u64 {
        self.photo_count + self.video_count
    }

    /// Get total skipped count.
    pub fn total_skipped(&self) -> u64 {
        self.skipped_photos + self.skipped_videos
    }

    /// Snapshot the counters at the start of a collection walk.
    pub fn counts(&self) -> Counts {
        Counts {
            photos: self.photo_count,
            videos: self.video_count,
            upgrades: self.upgrade_count,
            skipped_photos: self.skipped_photos,
            skipped_videos: self.skipped_videos,
            errors: self.error_count,
        }
    }

    /// Report what happened since a snapshot.
    pub fn report_since(&self, before: Counts) -> SyncReport {
        SyncReport {
            saved: self.total_saved() - (before.photos + before.videos),
            skipped: self.total_skipped() - (before.skipped_photos + before.skipped_videos),
            errors: self.error_count - before.errors,
        }
    }

    /// Report what happened since a snapshot, split by media kind.
    pub fn wall_report_since(&self, before: Counts) -> WallReport {
        WallReport {
            saved_photos: self.photo_count - before.photos,
            saved_videos: self.video_count - before.videos,
            skipped_photos: self.skipped_photos - before.skipped_photos,
            skipped_videos: self.skipped_videos - before.skipped_videos,
            errors: self.error_count - before.errors,
        }
    }

    /// Upgrades performed since a snapshot.
    pub fn upgrades_since(&self, before: Counts) -> u64 {
        self.upgrade_count - before.upgrades
    }
}

/// Global statistics across all targets.
#[derive(Debug, Default)]
pub struct GlobalState {
    pub photo_count: u64,
    pub video_count: u64,
    pub upgrade_count: u64,
    pub skip_count: u64,
    pub error_count: u64,
    pub targets_processed: u64,
    pub targets_failed: u64,
}

impl GlobalState {
    /// Add statistics from a target's sync state.
    pub fn add_target_stats(&mut self, state: &SyncState) {
        self.photo_count += state.photo_count;
        self.video_count += state.video_count;
        self.upgrade_count += state.upgrade_count;
        self.skip_count += state.total_skipped();
        self.error_count += state.error_count;
        self.targets_processed += 1;
    }

    /// Mark a target as failed.
    pub fn mark_target_failed(&mut self) {
        self.targets_failed += 1;
    }

    /// Get total saved count.
    pub fn total_saved(&self) -> u64 {
        self.photo_count + self.video_count
    }
}
