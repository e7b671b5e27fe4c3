//! Local filesystem backend.
//!
//! Files land at `{root}/{yyyy}/{MM}/{dd}/{subdirectory}/{uuid}{ext}` and are
//! published as `{base_url}/files/{yyyy}/{MM}/{dd}/{subdirectory}/{uuid}{ext}`.
//! The HTTP layer serves `root` under `/files/`.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::Utc;
use inkpress_shared::LocalStorageConfig;
use opendal::{ErrorKind, Metadata, Operator, services};
use tracing::{debug, error, info, warn};

use crate::backend::FileStore;
use crate::config::StorageProvider;
use crate::error::StorageError;
use crate::key::{KeyLayout, key_from_url};
use crate::policy::UploadPolicy;
use crate::upload::FileUpload;

/// Stores files on the local disk.
pub struct LocalFileStore {
    operator: Operator,
    root: PathBuf,
    url_prefix: String,
    policy: UploadPolicy,
}

impl LocalFileStore {
    /// Create the backend, creating the storage root if needed.
    ///
    /// # Errors
    ///
    /// Returns an error if the root cannot be created or is not valid UTF-8.
    pub fn new(config: &LocalStorageConfig) -> Result<Self, StorageError> {
        std::fs::create_dir_all(&config.root)?;
        let root = config.root.canonicalize()?;

        let builder = services::Fs::default().root(
            root.to_str()
                .ok_or_else(|| StorageError::configuration("storage root is not valid UTF-8"))?,
        );
        let operator = Operator::new(builder)
            .map_err(|e| StorageError::configuration(e.to_string()))?
            .finish();

        let url_prefix = format!("{}/files/", config.base_url.trim_end_matches('/'));
        let policy = UploadPolicy::allow_list(config.max_file_size, config.allowed_types.clone());

        Ok(Self {
            operator,
            root,
            url_prefix,
            policy,
        })
    }

    /// Absolute storage root.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Prefix every issued URL starts with.
    #[must_use]
    pub fn url_prefix(&self) -> &str {
        &self.url_prefix
    }

    /// Validation rules for this backend.
    #[must_use]
    pub fn policy(&self) -> &UploadPolicy {
        &self.policy
    }

    fn key_for<'a>(&self, url: &'a str) -> Option<&'a str> {
        let key = key_from_url(url, &self.url_prefix);
        if key.is_none() {
            warn!(url, "URL was not issued by local storage");
        }
        key
    }

    /// Metadata of the file behind `key`; `None` if absent or not a file.
    async fn stat_file(&self, key: &str) -> Result<Option<Metadata>, opendal::Error> {
        match self.operator.stat(key).await {
            Ok(meta) if meta.is_file() => Ok(Some(meta)),
            Ok(_) => Ok(None),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e),
        }
    }
}

#[async_trait]
impl FileStore for LocalFileStore {
    fn provider(&self) -> StorageProvider {
        StorageProvider::Local
    }

    async fn store(&self, upload: &FileUpload, subdirectory: &str) -> Result<String, StorageError> {
        self.policy.validate(upload)?;

        let key = KeyLayout::DateFirst.generate(subdirectory, upload, Utc::now())?;
        debug!(key = %key, "Writing file to local storage");

        self.operator
            .write(&key, upload.bytes.clone())
            .await
            .map_err(StorageError::from)?;

        let url = format!("{}{key}", self.url_prefix);
        info!(url = %url, size = upload.len(), "File stored successfully");
        Ok(url)
    }

    async fn delete(&self, url: &str) -> bool {
        let Some(key) = self.key_for(url) else {
            return false;
        };

        match self.stat_file(key).await {
            Ok(Some(_)) => {}
            Ok(None) => return false,
            Err(e) => {
                error!(url, error = %e, "Error deleting file");
                return false;
            }
        }

        match self.operator.delete(key).await {
            Ok(()) => {
                info!(url, "File deleted successfully");
                true
            }
            Err(e) => {
                error!(url, error = %e, "Error deleting file");
                false
            }
        }
    }

    async fn exists(&self, url: &str) -> bool {
        let Some(key) = self.key_for(url) else {
            return false;
        };

        match self.stat_file(key).await {
            Ok(found) => found.is_some(),
            Err(e) => {
                error!(url, error = %e, "Error checking file existence");
                false
            }
        }
    }

    async fn size(&self, url: &str) -> u64 {
        let Some(key) = self.key_for(url) else {
            return 0;
        };

        match self.stat_file(key).await {
            Ok(Some(meta)) => meta.content_length(),
            Ok(None) => 0,
            Err(e) => {
                error!(url, error = %e, "Error getting file size");
                0
            }
        }
    }
}
