//! Path and directory management.

use std::path::{Path, PathBuf};

use crate::config::Config;
use crate::error::Result;
use crate::fs::naming::sanitize_path_component;
use crate::media::MediaKind;

/// Get the base folder for a sync target, named after its display name
/// when the Graph API provides one and its id otherwise.
pub fn get_target_folder(config: &Config, target_label: &str) -> Result<PathBuf> {
    let folder = sanitize_path_component(target_label)?;
    Ok(config.download_directory().join(folder))
}

/// Get the download path for a media item of the given kind:
/// `<download_dir>/<target>/<Photos|Videos>`.
pub fn get_download_path(
    config: &Config,
    target_label: &str,
    kind: MediaKind,
) -> Result<PathBuf> {
    Ok(get_target_folder(config, target_label)?.join(kind.folder_name()))
}

/// Ensure a directory exists, creating it if necessary.
pub fn ensure_dir(path: &Path) -> Result<()> {
    if !path.exists() {
        std::fs::create_dir_all(path)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{
        AccountConfig, Config, OptionsConfig, ProxyConfig, StoreConfig, TargetsConfig,
    };

    fn make_test_config(download_dir: &str) -> Config {
        Config {
            targets: TargetsConfig {
                ids: vec!["12345".to_string()],
            },
            account: AccountConfig::default(),
            options: OptionsConfig {
                download_directory: Some(PathBuf::from(download_dir)),
                ..Default::default()
            },
            proxy: ProxyConfig::default(),
            store: StoreConfig::default(),
        }
    }

    #[test]
    fn test_download_path_layout() {
        let config = make_test_config("/downloads");

        let photos = get_download_path(&config, "Some Page", MediaKind::Photo).unwrap();
        assert_eq!(photos, PathBuf::from("/downloads/Some Page/Photos"));

        let videos = get_download_path(&config, "Some Page", MediaKind::Video).unwrap();
        assert_eq!(videos, PathBuf::from("/downloads/Some Page/Videos"));
    }

    #[test]
    fn test_target_folder_sanitized() {
        let config = make_test_config("/downloads");

        let folder = get_target_folder(&config, "name/with:odd*chars").unwrap();
        assert_eq!(folder, PathBuf::from("/downloads/name_with_odd_chars"));
    }

    #[test]
    fn test_target_folder_rejects_traversal() {
        let config = make_test_config("/downloads");
        assert!(get_target_folder(&config, "../escape").is_err());
    }

    #[test]
    fn test_ensure_dir() {
        let tmp = tempfile::tempdir().unwrap();
        let nested = tmp.path().join("a").join("b").join("c");

        assert!(!nested.exists());
        ensure_dir(&nested).unwrap();
        assert!(nested.is_dir());

        // Calling again on an existing directory is a no-op
        ensure_dir(&nested).unwrap();
    }
}
