//! Upload validation rules.
//!
//! Each backend carries its own policy. The ceilings and content-type rules
//! differ between backends and are kept that way:
//!
//! | backend  | ceiling  | content types                    |
//! |----------|----------|----------------------------------|
//! | local    | config   | configured allow-list            |
//! | r2       | 10 MiB   | anything starting with `image/`  |
//! | supabase | 5 MiB    | anything starting with `image/`  |

use crate::error::StorageError;
use crate::upload::FileUpload;

/// Rule a declared content type must satisfy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContentTypeRule {
    /// Content type must start with one of the listed types.
    AllowList(Vec<String>),
    /// Content type must start with this prefix.
    Prefix(String),
}

impl ContentTypeRule {
    /// Check a declared content type. A missing content type never matches.
    #[must_use]
    pub fn allows(&self, content_type: Option<&str>) -> bool {
        let Some(content_type) = content_type else {
            return false;
        };
        match self {
            Self::AllowList(types) => types.iter().any(|t| content_type.starts_with(t.as_str())),
            Self::Prefix(prefix) => content_type.starts_with(prefix.as_str()),
        }
    }
}

/// Size and content-type limits applied before any I/O.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadPolicy {
    /// Largest accepted payload, in bytes.
    pub max_file_size: u64,
    /// Content-type rule.
    pub content_types: ContentTypeRule,
}

impl UploadPolicy {
    /// R2 ceiling: 10 MiB.
    pub const R2_MAX_FILE_SIZE: u64 = 10 * 1024 * 1024;
    /// Supabase ceiling: 5 MiB.
    pub const SUPABASE_MAX_FILE_SIZE: u64 = 5 * 1024 * 1024;

    /// Policy for the local backend.
    #[must_use]
    pub fn allow_list(max_file_size: u64, types: Vec<String>) -> Self {
        Self {
            max_file_size,
            content_types: ContentTypeRule::AllowList(types),
        }
    }

    /// Any `image/*` content type up to `max_file_size`.
    #[must_use]
    pub fn images(max_file_size: u64) -> Self {
        Self {
            max_file_size,
            content_types: ContentTypeRule::Prefix("image/".to_string()),
        }
    }

    /// Policy for the R2 backend.
    #[must_use]
    pub fn r2() -> Self {
        Self::images(Self::R2_MAX_FILE_SIZE)
    }

    /// Policy for the Supabase backend.
    #[must_use]
    pub fn supabase() -> Self {
        Self::images(Self::SUPABASE_MAX_FILE_SIZE)
    }

    /// Validate an upload against this policy.
    ///
    /// # Errors
    ///
    /// Returns an error if the upload is empty, too large, or has a
    /// disallowed content type.
    pub fn validate(&self, upload: &FileUpload) -> Result<(), StorageError> {
        if upload.is_empty() {
            return Err(StorageError::EmptyFile);
        }

        if upload.len() > self.max_file_size {
            return Err(StorageError::file_too_large(
                upload.len(),
                self.max_file_size,
            ));
        }

        let content_type = upload.content_type.as_deref();
        if !self.content_types.allows(content_type) {
            return Err(StorageError::invalid_mime_type(
                content_type.unwrap_or("<none>"),
            ));
        }

        Ok(())
    }
}
