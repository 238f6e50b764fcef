//! Filename generation and manipulation.

use crate::error::{Error, Result};
use crate::media::MediaKind;

/// How path separators in a candidate name are handled.
#[derive(Clone, Copy, PartialEq)]
enum Separators {
    /// Filenames are always generated as bare names; a separator means
    /// the caller was handed something else.
    Reject,
    /// Display names become folder components, so separators flatten
    /// to `_` like any other reserved character.
    Replace,
}

fn sanitize(name: &str, separators: Separators) -> Result<String> {
    if name.contains("..") {
        return Err(Error::InvalidFilename(format!(
            "Path traversal detected: '{}'",
            name
        )));
    }

    if name.contains('\0') {
        return Err(Error::InvalidFilename(format!(
            "Null bytes not allowed: '{}'",
            name
        )));
    }

    if separators == Separators::Reject && (name.contains('/') || name.contains('\\')) {
        return Err(Error::InvalidFilename(format!(
            "Path separators not allowed in filename: '{}'",
            name
        )));
    }

    let sanitized: String = name
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();

    if sanitized.trim().is_empty() {
        return Err(Error::InvalidFilename(
            "Name cannot be empty or whitespace-only".to_string(),
        ));
    }

    Ok(sanitized)
}

/// Sanitize a generated filename, rejecting anything that is not a
/// bare name.
pub fn sanitize_filename(name: &str) -> Result<String> {
    sanitize(name, Separators::Reject)
}

/// Sanitize a target display name for use as a folder component.
pub fn sanitize_path_component(name: &str) -> Result<String> {
    sanitize(name, Separators::Replace)
}

/// Pick a file extension for a media item: from the URL path when it
/// carries one, else from the response Content-Type, else the default
/// for the media kind.
pub fn pick_extension(url: &str, content_type: Option<&str>, kind: MediaKind) -> String {
    if let Some(ext) = extension_from_url(url) {
        return ext;
    }

    if let Some(ext) = content_type.and_then(extension_from_content_type) {
        return ext;
    }

    match kind {
        MediaKind::Photo => "jpg".to_string(),
        MediaKind::Video => "mp4".to_string(),
    }
}

/// Extract extension from a URL path.
fn extension_from_url(url: &str) -> Option<String> {
    // Remove query string
    let path = url.split('?').next()?;

    // Get the last segment
    let filename = path.rsplit('/').next()?;

    if !filename.contains('.') {
        return None;
    }

    let ext = filename.rsplit('.').next()?;

    // Validate it looks like an extension (1-10 chars, alphanumeric)
    if !ext.is_empty() && ext.len() <= 10 && ext.chars().all(|c| c.is_ascii_alphanumeric()) {
        Some(ext.to_lowercase())
    } else {
        None
    }
}

/// Convert a Content-Type value to a file extension.
fn extension_from_content_type(content_type: &str) -> Option<String> {
    // Strip any charset suffix
    let mime = content_type.split(';').next().unwrap_or("").trim();

    let ext = match mime {
        "image/jpeg" => "jpg",
        "image/png" => "png",
        "image/gif" => "gif",
        "image/webp" => "webp",
        "video/mp4" => "mp4",
        "video/webm" => "webm",
        "video/quicktime" => "mov",
        _ => {
            return mime_guess::get_mime_extensions_str(mime)
                .and_then(|exts| exts.first())
                .map(|s| s.to_string())
        }
    };

    Some(ext.to_string())
}
