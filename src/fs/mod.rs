//! Filesystem module.
//!
//! Provides:
//! - Path and directory management
//! - Filename generation and manipulation

pub mod naming;
pub mod paths;

pub use naming::{pick_extension, sanitize_filename, sanitize_path_component};
pub use paths::{ensure_dir, get_download_path, get_target_folder};
