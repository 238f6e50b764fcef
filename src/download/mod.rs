//! Download module for media syncing.
//!
//! This module provides:
//! - Per-target and global sync state tracking
//! - Pagination bookkeeping (cursor and next-link)
//! - Collection drivers for uploads, feed videos, wall posts, and albums
//! - Per-item download with dedup and HD upgrades
//! - Batch orchestration across targets

pub mod albums;
pub mod batch;
pub mod media;
pub mod pager;
pub mod state;
pub mod uploads;
pub mod videos;
pub mod wall;

pub use batch::{run_batch, BatchSummary, TargetOutcome};
pub use media::sync_media_item;
pub use pager::{CursorPager, LinkPager};
pub use state::{GlobalState, SyncReport, SyncState, WallReport};
