//! The storage contract every backend implements.

use async_trait::async_trait;

use crate::config::StorageProvider;
use crate::error::StorageError;
use crate::upload::{AssetRole, FileUpload};

/// Uniform operations over one storage medium.
///
/// `store` is the only fallible operation. `delete`, `exists` and `size`
/// are best-effort: failures are logged and reported as `false`/`false`/`0`,
/// so a caller cannot tell "not found" from "backend unreachable".
///
/// # Example
///
/// ```rust,ignore
/// let url = store.store_avatar(&upload, "u1").await?;
/// assert!(store.exists(&url).await);
/// assert_eq!(store.size(&url).await, upload.len());
/// ```
#[async_trait]
pub trait FileStore: Send + Sync {
    /// Which backend this is.
    fn provider(&self) -> StorageProvider;

    /// Validate and persist `upload` under `subdirectory`, returning its
    /// public URL.
    ///
    /// Validation runs before any I/O.
    async fn store(&self, upload: &FileUpload, subdirectory: &str) -> Result<String, StorageError>;

    /// Delete the object behind `url`. Returns `true` only if something was
    /// deleted.
    async fn delete(&self, url: &str) -> bool;

    /// Whether the object behind `url` exists.
    async fn exists(&self, url: &str) -> bool;

    /// Size in bytes of the object behind `url`, or 0.
    async fn size(&self, url: &str) -> u64;

    // === Role helpers ===

    /// Store `upload` in the subdirectory owned by `role`.
    async fn store_for_role(
        &self,
        upload: &FileUpload,
        role: &AssetRole,
    ) -> Result<String, StorageError> {
        self.store(upload, &role.subdirectory()).await
    }

    /// Store a user's avatar under `avatars/{user_id}`.
    async fn store_avatar(&self, upload: &FileUpload, user_id: &str) -> Result<String, StorageError> {
        let role = AssetRole::Avatar {
            user_id: user_id.to_string(),
        };
        self.store_for_role(upload, &role).await
    }

    /// Store a webtoon cover under `webtoons/{webtoon_id}/covers`.
    async fn store_cover(
        &self,
        upload: &FileUpload,
        webtoon_id: &str,
    ) -> Result<String, StorageError> {
        let role = AssetRole::Cover {
            webtoon_id: webtoon_id.to_string(),
        };
        self.store_for_role(upload, &role).await
    }

    /// Store a chapter page under `webtoons/{webtoon_id}/chapters/{chapter_id}`.
    async fn store_page(
        &self,
        upload: &FileUpload,
        webtoon_id: &str,
        chapter_id: &str,
    ) -> Result<String, StorageError> {
        let role = AssetRole::Page {
            webtoon_id: webtoon_id.to_string(),
            chapter_id: chapter_id.to_string(),
        };
        self.store_for_role(upload, &role).await
    }
}
