//! Persistent sync state: media records, resume cursors, owners.

pub mod db;
pub mod schema;
pub mod types;

pub use db::MediaStore;
pub use types::{CursorState, MediaRecord, Owner, SkipDecision};
