//! Storage key layout and URL reversal.
//!
//! Keys are `{uuid}{ext}` files placed under a `yyyy/MM/dd` date partition
//! and the caller's subdirectory. The local backend puts the date first, the
//! object stores put the subdirectory first.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::StorageError;
use crate::upload::FileUpload;

/// Order of the date partition and the subdirectory inside a key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyLayout {
    /// `{yyyy}/{MM}/{dd}/{subdirectory}/{name}`
    DateFirst,
    /// `{subdirectory}/{yyyy}/{MM}/{dd}/{name}`
    SubdirectoryFirst,
}

impl KeyLayout {
    /// Build a key for `upload` stored under `subdirectory` at time `at`.
    ///
    /// # Errors
    ///
    /// Returns an error if `subdirectory` is not a safe relative path.
    pub fn generate(
        self,
        subdirectory: &str,
        upload: &FileUpload,
        at: DateTime<Utc>,
    ) -> Result<String, StorageError> {
        let subdirectory = normalize_subdirectory(subdirectory)?;
        let date = date_path(at);
        let name = object_name(upload);

        Ok(match self {
            Self::DateFirst => format!("{date}/{subdirectory}/{name}"),
            Self::SubdirectoryFirst => format!("{subdirectory}/{date}/{name}"),
        })
    }
}

/// `yyyy/MM/dd` partition for a timestamp.
#[must_use]
pub fn date_path(at: DateTime<Utc>) -> String {
    at.format("%Y/%m/%d").to_string()
}

/// Random file name keeping the upload's extension.
#[must_use]
pub fn object_name(upload: &FileUpload) -> String {
    format!("{}{}", Uuid::new_v4(), upload.extension())
}

/// Trim surrounding slashes and reject anything that could escape the
/// storage root.
///
/// # Errors
///
/// Returns an error for empty paths, empty segments, `.`/`..` segments,
/// backslashes, control characters, or URL delimiters (`?`, `#`, `%`) that
/// would stop the key from round-tripping through a URL.
pub fn normalize_subdirectory(subdirectory: &str) -> Result<String, StorageError> {
    let trimmed = subdirectory.trim_matches('/');
    if trimmed.is_empty() {
        return Err(StorageError::invalid_path("subdirectory is empty"));
    }
    if trimmed
        .chars()
        .any(|c| c.is_control() || matches!(c, '\\' | '?' | '#' | '%'))
    {
        return Err(StorageError::invalid_path(subdirectory));
    }
    if trimmed
        .split('/')
        .any(|segment| segment.is_empty() || segment == "." || segment == "..")
    {
        return Err(StorageError::invalid_path(subdirectory));
    }
    Ok(trimmed.to_string())
}

/// Recover a storage key from a public URL by stripping `prefix`.
///
/// Returns `None` when the URL was not issued under `prefix`, or when the
/// remainder is empty or contains a `..` segment.
#[must_use]
pub fn key_from_url<'a>(url: &'a str, prefix: &str) -> Option<&'a str> {
    let key = url.strip_prefix(prefix)?;
    if key.is_empty() || key.split('/').any(|segment| segment == "..") {
        return None;
    }
    Some(key)
}
