//! SQLite-backed sync state.
//!
//! Every operation is a synchronous single-statement call; point
//! lookups and upserts are fast enough to run inline on the async
//! control thread.

use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};

use chrono::Utc;
use rusqlite::{Connection, OptionalExtension};

use crate::error::Result;
use crate::store::schema;
use crate::store::types::{CursorState, MediaRecord, Owner, SkipDecision};

/// Persistent record of what has been mirrored already.
///
/// The media table is the single source of truth for dedup: file
/// presence on disk is never consulted.
pub struct MediaStore {
    /// Wrapped in Mutex because rusqlite::Connection is not Sync.
    conn: Mutex<Connection>,
    path: PathBuf,
}

impl std::fmt::Debug for MediaStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MediaStore")
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}

impl MediaStore {
    /// Open or create a database at the given path.
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let conn = Connection::open(path)?;

        // WAL keeps readers cheap while the sync loop writes.
        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.pragma_update(None, "synchronous", "NORMAL")?;

        schema::migrate(&conn)?;

        Ok(Self {
            conn: Mutex::new(conn),
            path: path.to_path_buf(),
        })
    }

    /// Open an in-memory database (for tests).
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        schema::migrate(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
            path: PathBuf::from(":memory:"),
        })
    }

    /// Path this store was opened at.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Look up an owner row by external ID, creating it on first sight.
    /// A non-empty `name` refreshes the stored one.
    pub fn get_or_create_owner(&self, external_id: &str, name: Option<&str>) -> Result<Owner> {
        let conn = self.lock_conn();

        conn.execute(
            "INSERT INTO owners (external_id, name) VALUES (?1, ?2)
             ON CONFLICT(external_id) DO UPDATE SET
                 name = COALESCE(excluded.name, owners.name)",
            rusqlite::params![external_id, name],
        )?;

        let owner = conn.query_row(
            "SELECT id, external_id, name FROM owners WHERE external_id = ?1",
            [external_id],
            |row| {
                Ok(Owner {
                    id: row.get(0)?,
                    external_id: row.get(1)?,
                    name: row.get(2)?,
                })
            },
        )?;

        Ok(owner)
    }

    /// Decide what to do with a media item before any network work.
    pub fn skip_decision(
        &self,
        owner_id: i64,
        media_id: &str,
        want_hd: bool,
    ) -> Result<SkipDecision> {
        let conn = self.lock_conn();

        let is_hd: Option<bool> = conn
            .query_row(
                "SELECT is_hd FROM media WHERE owner_id = ?1 AND media_id = ?2",
                rusqlite::params![owner_id, media_id],
                |row| row.get(0),
            )
            .optional()?;

        Ok(match is_hd {
            None => SkipDecision::Proceed,
            Some(is_hd) => {
                if !want_hd || is_hd {
                    SkipDecision::Skip
                } else {
                    SkipDecision::Upgrade
                }
            }
        })
    }

    /// Record a completed download. Inserts on first save; an HD save
    /// over a standard row flips the flag and path. The quality flag
    /// never moves backwards and `created_at` keeps its original value.
    pub fn record_saved(
        &self,
        owner_id: i64,
        media_id: &str,
        is_hd: bool,
        file_path: &Path,
    ) -> Result<()> {
        let conn = self.lock_conn();

        conn.execute(
            "INSERT INTO media (owner_id, media_id, is_hd, file_path, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)
             ON CONFLICT(owner_id, media_id) DO UPDATE SET
                 is_hd = MAX(media.is_hd, excluded.is_hd),
                 file_path = CASE
                     WHEN excluded.is_hd >= media.is_hd THEN excluded.file_path
                     ELSE media.file_path
                 END",
            rusqlite::params![
                owner_id,
                media_id,
                is_hd,
                file_path.to_string_lossy(),
                Utc::now().timestamp(),
            ],
        )?;

        Ok(())
    }

    /// Fetch one media row.
    pub fn get_media(&self, owner_id: i64, media_id: &str) -> Result<Option<MediaRecord>> {
        let conn = self.lock_conn();

        let record = conn
            .query_row(
                "SELECT owner_id, media_id, is_hd, file_path, created_at
                 FROM media WHERE owner_id = ?1 AND media_id = ?2",
                rusqlite::params![owner_id, media_id],
                |row| {
                    Ok(MediaRecord {
                        owner_id: row.get(0)?,
                        media_id: row.get(1)?,
                        is_hd: row.get(2)?,
                        file_path: row.get(3)?,
                        created_at: row.get(4)?,
                    })
                },
            )
            .optional()?;

        Ok(record)
    }

    /// Number of media rows tracked for an owner.
    pub fn media_count(&self, owner_id: i64) -> Result<u64> {
        let conn = self.lock_conn();
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM media WHERE owner_id = ?1",
            [owner_id],
            |row| row.get(0),
        )?;
        Ok(count as u64)
    }

    /// Persist the resume point after a fully processed page.
    pub fn save_cursor(
        &self,
        owner_id: i64,
        collection: &str,
        cursor: &str,
        pages_loaded: u32,
    ) -> Result<()> {
        let conn = self.lock_conn();

        conn.execute(
            "INSERT INTO cursors (owner_id, collection, cursor, pages_loaded, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5)
             ON CONFLICT(owner_id, collection) DO UPDATE SET
                 cursor = excluded.cursor,
                 pages_loaded = excluded.pages_loaded,
                 updated_at = excluded.updated_at",
            rusqlite::params![
                owner_id,
                collection,
                cursor,
                pages_loaded,
                Utc::now().timestamp(),
            ],
        )?;

        Ok(())
    }

    /// Load the resume point for an (owner, collection) pair.
    pub fn load_cursor(&self, owner_id: i64, collection: &str) -> Result<Option<CursorState>> {
        let conn = self.lock_conn();

        let state = conn
            .query_row(
                "SELECT cursor, pages_loaded FROM cursors
                 WHERE owner_id = ?1 AND collection = ?2",
                rusqlite::params![owner_id, collection],
                |row| {
                    Ok(CursorState {
                        cursor: row.get(0)?,
                        pages_loaded: row.get(1)?,
                    })
                },
            )
            .optional()?;

        Ok(state)
    }

    /// Drop the resume point once a collection walk completes, so the
    /// next run starts from the head again.
    pub fn clear_cursor(&self, owner_id: i64, collection: &str) -> Result<()> {
        let conn = self.lock_conn();
        conn.execute(
            "DELETE FROM cursors WHERE owner_id = ?1 AND collection = ?2",
            rusqlite::params![owner_id, collection],
        )?;
        Ok(())
    }

    fn lock_conn(&self) -> MutexGuard<'_, Connection> {
        // Statements are atomic; a poisoned lock leaves no partial state.
        self.conn.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
