//! Supabase Storage backend, spoken to over its REST API.
//!
//! | operation | request                                               |
//! |-----------|-------------------------------------------------------|
//! | store     | `POST   {url}/storage/v1/object/{bucket}/{key}`        |
//! | delete    | `DELETE {url}/storage/v1/object/{bucket}/{key}`        |
//! | exists    | `HEAD   {url}/storage/v1/object/{bucket}/{key}`        |
//! | size      | `GET    {url}/storage/v1/object/info/{bucket}/{key}`   |
//!
//! Public URLs are `{url}/storage/v1/object/public/{bucket}/{key}`.

use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use inkpress_shared::SupabaseConfig;
use reqwest::{Client, RequestBuilder, header};
use serde::Deserialize;
use tracing::{debug, error, info, warn};

use crate::backend::FileStore;
use crate::config::StorageProvider;
use crate::error::StorageError;
use crate::key::{KeyLayout, key_from_url};
use crate::policy::UploadPolicy;
use crate::upload::FileUpload;

/// Body of the object info endpoint. Newer API versions report `size` at the
/// top level, older ones only inside `metadata`.
#[derive(Debug, Default, Deserialize)]
struct ObjectInfo {
    #[serde(default)]
    size: Option<u64>,
    #[serde(default)]
    metadata: Option<ObjectMetadata>,
}

#[derive(Debug, Default, Deserialize)]
struct ObjectMetadata {
    #[serde(default)]
    size: Option<u64>,
}

impl ObjectInfo {
    fn size(&self) -> Option<u64> {
        self.size
            .or_else(|| self.metadata.as_ref().and_then(|m| m.size))
    }
}

/// Stores objects in a Supabase Storage bucket.
pub struct SupabaseFileStore {
    client: Client,
    base_url: String,
    anon_key: String,
    bucket: String,
    url_prefix: String,
    policy: UploadPolicy,
}

impl SupabaseFileStore {
    /// Create the backend with an HTTP client bounded by `timeout`.
    ///
    /// # Errors
    ///
    /// Returns an error if the project URL or bucket is missing, or the HTTP
    /// client cannot be built.
    pub fn new(config: &SupabaseConfig, timeout: Duration) -> Result<Self, StorageError> {
        let base_url = config.url.trim_end_matches('/').to_string();
        if base_url.is_empty() {
            return Err(StorageError::configuration("supabase url is not set"));
        }
        if config.bucket.is_empty() {
            return Err(StorageError::configuration("supabase bucket is not set"));
        }

        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| StorageError::configuration(e.to_string()))?;

        let url_prefix = format!(
            "{base_url}/storage/v1/object/public/{}/",
            config.bucket
        );

        Ok(Self {
            client,
            base_url,
            anon_key: config.anon_key.clone(),
            bucket: config.bucket.clone(),
            url_prefix,
            policy: UploadPolicy::supabase(),
        })
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

    fn object_url(&self, key: &str) -> String {
        format!("{}/storage/v1/object/{}/{key}", self.base_url, self.bucket)
    }

    fn info_url(&self, key: &str) -> String {
        format!(
            "{}/storage/v1/object/info/{}/{key}",
            self.base_url, self.bucket
        )
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        request
            .bearer_auth(&self.anon_key)
            .header("apikey", &self.anon_key)
    }

    fn key_for<'a>(&self, url: &'a str) -> Option<&'a str> {
        let key = key_from_url(url, &self.url_prefix);
        if key.is_none() {
            warn!(url, "URL was not issued by Supabase storage");
        }
        key
    }

    async fn head(&self, key: &str) -> Result<bool, StorageError> {
        let response = self
            .authorized(self.client.head(self.object_url(key)))
            .send()
            .await?;
        Ok(response.status().is_success())
    }
}

#[async_trait]
impl FileStore for SupabaseFileStore {
    fn provider(&self) -> StorageProvider {
        StorageProvider::Supabase
    }

    async fn store(&self, upload: &FileUpload, subdirectory: &str) -> Result<String, StorageError> {
        self.policy.validate(upload)?;

        let key = KeyLayout::SubdirectoryFirst.generate(subdirectory, upload, Utc::now())?;
        let content_type = upload
            .content_type
            .clone()
            .unwrap_or_else(|| "application/octet-stream".to_string());
        debug!(key = %key, content_type = %content_type, "Uploading file to Supabase");

        let response = self
            .authorized(self.client.post(self.object_url(&key)))
            .header(header::CONTENT_TYPE, content_type)
            .body(upload.bytes.clone())
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(StorageError::Upstream {
                status: status.as_u16(),
                body,
            });
        }

        let url = format!("{}{key}", self.url_prefix);
        info!(url = %url, size = upload.len(), "File uploaded to Supabase");
        Ok(url)
    }

    async fn delete(&self, url: &str) -> bool {
        let Some(key) = self.key_for(url) else {
            return false;
        };

        match self.head(key).await {
            Ok(true) => {}
            Ok(false) => return false,
            Err(e) => {
                error!(url, error = %e, "Error deleting file from Supabase");
                return false;
            }
        }

        let result = self
            .authorized(self.client.delete(self.object_url(key)))
            .send()
            .await;
        match result {
            Ok(response) if response.status().is_success() => {
                info!(url, "File deleted from Supabase");
                true
            }
            Ok(response) => {
                warn!(url, status = response.status().as_u16(), "Supabase refused delete");
                false
            }
            Err(e) => {
                error!(url, error = %e, "Error deleting file from Supabase");
                false
            }
        }
    }

    async fn exists(&self, url: &str) -> bool {
        let Some(key) = self.key_for(url) else {
            return false;
        };

        match self.head(key).await {
            Ok(found) => found,
            Err(e) => {
                error!(url, error = %e, "Error checking file existence in Supabase");
                false
            }
        }
    }

    async fn size(&self, url: &str) -> u64 {
        let Some(key) = self.key_for(url) else {
            return 0;
        };

        let response = match self
            .authorized(self.client.get(self.info_url(key)))
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => {
                error!(url, error = %e, "Error getting file size from Supabase");
                return 0;
            }
        };

        if !response.status().is_success() {
            debug!(url, status = response.status().as_u16(), "No object info");
            return 0;
        }

        match response.json::<ObjectInfo>().await {
            Ok(info) => info.size().unwrap_or(0),
            Err(e) => {
                error!(url, error = %e, "Error decoding Supabase object info");
                0
            }
        }
    }
}
