//! Media module for item representation and attachment extraction.

pub mod attachments;
pub mod item;

pub use attachments::flatten_attachments;
pub use item::{parse_created_time, MediaKind, MediaRef};
