//! Store record types.

/// Outcome of the pre-download check for one media item.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipDecision {
    /// Not tracked yet: download and record it.
    Proceed,
    /// Already tracked at sufficient quality: nothing to do.
    Skip,
    /// Tracked in standard quality while HD is wanted: fetch only the
    /// improved asset.
    Upgrade,
}

/// One persisted media row.
#[derive(Debug, Clone)]
pub struct MediaRecord {
    pub owner_id: i64,
    pub media_id: String,
    pub is_hd: bool,
    pub file_path: String,
    /// When the row was first written, unix seconds.
    pub created_at: i64,
}

/// Persisted resume point for one (owner, collection) pair.
#[derive(Debug, Clone)]
pub struct CursorState {
    pub cursor: String,
    pub pages_loaded: u32,
}

/// A sync target tracked in the store.
#[derive(Debug, Clone)]
pub struct Owner {
    pub id: i64,
    pub external_id: String,
    pub name: Option<String>,
}
