//! Provider selection.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use inkpress_shared::StorageConfig;
use tracing::{info, warn};

use crate::backend::FileStore;
use crate::backends::{LocalFileStore, R2FileStore, SupabaseFileStore};
use crate::config::StorageProvider;
use crate::error::StorageError;
use crate::upload::FileUpload;

/// The storage backend bound at startup, shared by every caller.
#[derive(Clone)]
pub struct StorageService {
    backend: Arc<dyn FileStore>,
    local_root: Option<PathBuf>,
}

impl StorageService {
    /// Select and build the configured backend.
    ///
    /// An unrecognized provider falls back to local storage with a warning.
    ///
    /// # Errors
    ///
    /// Returns an error if the selected backend cannot be initialized.
    pub fn from_config(config: &StorageConfig) -> Result<Self, StorageError> {
        let provider = StorageProvider::parse(&config.provider).unwrap_or_else(|| {
            warn!(
                provider = %config.provider,
                "Unknown storage provider, falling back to local"
            );
            StorageProvider::Local
        });
        let timeout = Duration::from_secs(config.request_timeout_secs);

        let service = match provider {
            StorageProvider::Local => {
                let store = LocalFileStore::new(&config.local)?;
                let root = store.root().to_path_buf();
                Self {
                    backend: Arc::new(store),
                    local_root: Some(root),
                }
            }
            StorageProvider::R2 => Self::new(Arc::new(R2FileStore::new(&config.r2, timeout)?)),
            StorageProvider::Supabase => Self::new(Arc::new(SupabaseFileStore::new(
                &config.supabase,
                timeout,
            )?)),
        };

        info!(provider = %provider, "Storage provider selected");
        Ok(service)
    }

    /// Wrap an already-built backend.
    #[must_use]
    pub fn new(backend: Arc<dyn FileStore>) -> Self {
        Self {
            backend,
            local_root: None,
        }
    }

    /// Directory to serve under `/files/`, when the local backend is bound.
    #[must_use]
    pub fn local_root(&self) -> Option<&Path> {
        self.local_root.as_deref()
    }
}

#[async_trait]
impl FileStore for StorageService {
    fn provider(&self) -> StorageProvider {
        self.backend.provider()
    }

    async fn store(&self, upload: &FileUpload, subdirectory: &str) -> Result<String, StorageError> {
        self.backend.store(upload, subdirectory).await
    }

    async fn delete(&self, url: &str) -> bool {
        self.backend.delete(url).await
    }

    async fn exists(&self, url: &str) -> bool {
        self.backend.exists(url).await
    }

    async fn size(&self, url: &str) -> u64 {
        self.backend.size(url).await
    }
}
