//! Configuration validation logic.

use crate::config::loader::Config;
use crate::config::modes::SyncMode;
use crate::error::{Error, Result};
use regex::Regex;

/// Minimum length for an access token.
const MIN_TOKEN_LENGTH: usize = 30;

/// Maximum length for a target node ID.
const MAX_TARGET_ID_LENGTH: usize = 64;

/// Validate the entire configuration.
pub fn validate_config(config: &Config) -> Result<()> {
    validate_token(&config.account.access_token)?;

    if config.options.sync_mode == SyncMode::Album {
        if config.options.album_id.is_none() {
            return Err(Error::MissingConfig(
                "album_id (required for album sync mode)".to_string(),
            ));
        }
        // Album mode syncs the album node itself; target ids are unused
        // and may be absent.
        if !config.targets.ids.is_empty() {
            validate_target_ids(&config.targets.ids)?;
        }
    } else {
        validate_target_ids(&config.targets.ids)?;
    }

    if config.proxy.enabled && config.proxy.proxies.is_empty() && config.proxy.proxy_file.is_none()
    {
        return Err(Error::ConfigValidation {
            field: "proxy".to_string(),
            message: "Proxy support is enabled but no proxies or proxy_file configured"
                .to_string(),
        });
    }

    Ok(())
}

/// Validate the Graph API access token.
pub fn validate_token(token: &str) -> Result<()> {
    if token.is_empty() {
        return Err(Error::MissingConfig("access_token".to_string()));
    }

    if token.len() < MIN_TOKEN_LENGTH {
        return Err(Error::ConfigValidation {
            field: "access_token".to_string(),
            message: format!(
                "Token must be at least {} characters (got {})",
                MIN_TOKEN_LENGTH,
                token.len()
            ),
        });
    }

    // Check for placeholder values
    let token_lower = token.to_lowercase();
    if token_lower.contains("replaceme") || token_lower.contains("your_token") {
        return Err(Error::ConfigValidation {
            field: "access_token".to_string(),
            message: "Token appears to be a placeholder. Please provide your actual access token."
                .to_string(),
        });
    }

    Ok(())
}

/// Validate sync target node IDs.
pub fn validate_target_ids<S: AsRef<str>, I: IntoIterator<Item = S>>(ids: I) -> Result<()> {
    let ids: Vec<_> = ids.into_iter().collect();

    if ids.is_empty() {
        return Err(Error::MissingConfig(
            "ids (at least one target node ID required)".to_string(),
        ));
    }

    // Node ID pattern: alphanumeric plus dot, underscore, hyphen
    let id_pattern = Regex::new(r"^[A-Za-z0-9_.-]+$").unwrap();

    for id in ids {
        let id = id.as_ref();

        if id.is_empty() || id.len() > MAX_TARGET_ID_LENGTH {
            return Err(Error::ConfigValidation {
                field: "ids".to_string(),
                message: format!(
                    "Target ID '{}' must be between 1 and {} characters",
                    id, MAX_TARGET_ID_LENGTH
                ),
            });
        }

        if !id_pattern.is_match(id) {
            return Err(Error::ConfigValidation {
                field: "ids".to_string(),
                message: format!(
                    "Target ID '{}' contains invalid characters. Only alphanumeric, dots, hyphens, and underscores allowed.",
                    id
                ),
            });
        }

        // Check for placeholder values
        let lower = id.to_lowercase();
        if lower == "replaceme" || lower == "target" || lower == "page_id" {
            return Err(Error::ConfigValidation {
                field: "ids".to_string(),
                message: format!(
                    "Target ID '{}' appears to be a placeholder. Please provide actual node IDs.",
                    id
                ),
            });
        }
    }

    Ok(())
}

/// Extract an album ID from a URL or direct ID string.
pub fn parse_album_id(input: &str) -> Result<String> {
    let input = input.trim();

    // If it's a URL, extract the album ID
    if input.starts_with("http://") || input.starts_with("https://") {
        // Pattern: https://www.facebook.com/media/set/?set=a.1234567890123
        let set_pattern = Regex::new(r"[?&]set=a\.(\d{6,})").unwrap();
        if let Some(captures) = set_pattern.captures(input) {
            if let Some(id) = captures.get(1) {
                return Ok(id.as_str().to_string());
            }
        }

        // Pattern: .../albums/1234567890123
        let path_pattern = Regex::new(r"/albums/(\d{6,})").unwrap();
        if let Some(captures) = path_pattern.captures(input) {
            if let Some(id) = captures.get(1) {
                return Ok(id.as_str().to_string());
            }
        }

        return Err(Error::ConfigValidation {
            field: "album_id".to_string(),
            message: format!("Could not extract album ID from URL: {}", input),
        });
    }

    // Direct ID - must be 6+ digits
    let id_pattern = Regex::new(r"^\d{6,}$").unwrap();
    if id_pattern.is_match(input) {
        return Ok(input.to_string());
    }

    Err(Error::ConfigValidation {
        field: "album_id".to_string(),
        message: format!(
            "Invalid album ID: '{}'. Must be 6+ digits or a valid album URL.",
            input
        ),
    })
}
