// Google Drive share-link handling: marker check, file id extraction
// and construction of the direct-download URL.

use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;
use url::Url;

/// Substring every supported share link must contain.
pub const DRIVE_HOST_MARKER: &str = "drive.google.com";

/// Endpoint that serves raw file bytes instead of the viewer page.
pub const DRIVE_DOWNLOAD_BASE: &str = "https://drive.google.com/uc";

static FILE_ID_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"/d/([A-Za-z0-9_-]+)").expect("valid file id regex"));

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DriveUrlError {
    #[error("Only Google Drive URLs are supported")]
    UnsupportedSource,

    #[error("Invalid Google Drive URL format")]
    InvalidFormat,
}

pub fn is_drive_url(url: &str) -> bool {
    url.contains(DRIVE_HOST_MARKER)
}

/// Returns the first `/d/<id>` segment of a share link, if any.
pub fn extract_file_id(url: &str) -> Option<&str> {
    FILE_ID_REGEX
        .captures(url)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

/// Validates a share link and builds `<base>?export=download&id=<id>`.
///
/// `base` is normally [`DRIVE_DOWNLOAD_BASE`]; the marker check always runs
/// against the caller's link, never against `base`.
pub fn resolve_download_url(url: &str, base: &str) -> Result<Url, DriveUrlError> {
    if !is_drive_url(url) {
        return Err(DriveUrlError::UnsupportedSource);
    }

    let file_id = extract_file_id(url).ok_or(DriveUrlError::InvalidFormat)?;

    Url::parse_with_params(base, &[("export", "download"), ("id", file_id)])
        .map_err(|_| DriveUrlError::InvalidFormat)
}
