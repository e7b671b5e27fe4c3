//! Cloudflare R2 backend, spoken to through its S3-compatible API.

use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use inkpress_shared::R2Config;
use once_cell::sync::OnceCell;
use opendal::layers::TimeoutLayer;
use opendal::{ErrorKind, Metadata, Operator, services};
use tracing::{debug, error, info, warn};

use crate::backend::FileStore;
use crate::config::StorageProvider;
use crate::error::StorageError;
use crate::key::{KeyLayout, key_from_url};
use crate::policy::UploadPolicy;
use crate::upload::FileUpload;

/// R2 accepts any region name; `auto` is the documented one.
const R2_REGION: &str = "auto";

/// Stores objects in an R2 bucket.
///
/// The S3 client is built on first use and reused afterwards.
pub struct R2FileStore {
    config: R2Config,
    timeout: Duration,
    operator: OnceCell<Operator>,
    url_prefix: String,
    policy: UploadPolicy,
}

impl R2FileStore {
    /// Create the backend. No network traffic happens here.
    ///
    /// # Errors
    ///
    /// Returns an error if no public URL is configured.
    pub fn new(config: &R2Config, timeout: Duration) -> Result<Self, StorageError> {
        let public_url = config.public_url.trim_end_matches('/');
        if public_url.is_empty() {
            return Err(StorageError::configuration("r2 public_url is not set"));
        }

        Ok(Self {
            config: config.clone(),
            timeout,
            operator: OnceCell::new(),
            url_prefix: format!("{public_url}/"),
            policy: UploadPolicy::r2(),
        })
    }

    /// S3 endpoint objects are written to.
    #[must_use]
    pub fn endpoint(&self) -> String {
        self.config.endpoint.clone().unwrap_or_else(|| {
            format!(
                "https://{}.r2.cloudflarestorage.com",
                self.config.account_id
            )
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

    fn operator(&self) -> Result<&Operator, StorageError> {
        self.operator.get_or_try_init(|| self.create_operator())
    }

    fn create_operator(&self) -> Result<Operator, StorageError> {
        if self.config.endpoint.is_none() && self.config.account_id.is_empty() {
            return Err(StorageError::configuration("r2 account_id is not set"));
        }
        if self.config.bucket.is_empty() {
            return Err(StorageError::configuration("r2 bucket is not set"));
        }

        let endpoint = self.endpoint();
        debug!(endpoint = %endpoint, bucket = %self.config.bucket, "Creating R2 client");

        let builder = services::S3::default()
            .endpoint(&endpoint)
            .bucket(&self.config.bucket)
            .region(R2_REGION)
            .access_key_id(&self.config.access_key)
            .secret_access_key(&self.config.secret_key)
            .disable_config_load()
            .disable_ec2_metadata();

        Ok(Operator::new(builder)
            .map_err(|e| StorageError::configuration(e.to_string()))?
            .layer(TimeoutLayer::new().with_timeout(self.timeout))
            .finish())
    }

    fn key_for<'a>(&self, url: &'a str) -> Option<&'a str> {
        let key = key_from_url(url, &self.url_prefix);
        if key.is_none() {
            warn!(url, "URL was not issued by R2 storage");
        }
        key
    }

    /// Head the object behind `key`; `None` if it does not exist.
    async fn head(&self, key: &str) -> Result<Option<Metadata>, StorageError> {
        match self.operator()?.stat(key).await {
            Ok(meta) => Ok(Some(meta)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

#[async_trait]
impl FileStore for R2FileStore {
    fn provider(&self) -> StorageProvider {
        StorageProvider::R2
    }

    async fn store(&self, upload: &FileUpload, subdirectory: &str) -> Result<String, StorageError> {
        self.policy.validate(upload)?;

        let key = KeyLayout::SubdirectoryFirst.generate(subdirectory, upload, Utc::now())?;
        let content_type = upload
            .content_type
            .as_deref()
            .unwrap_or("application/octet-stream");
        debug!(key = %key, content_type, "Uploading file to R2");

        self.operator()?
            .write_with(&key, upload.bytes.clone())
            .content_type(content_type)
            .await
            .map_err(StorageError::from)?;

        let url = format!("{}{key}", self.url_prefix);
        info!(url = %url, size = upload.len(), "File uploaded to R2");
        Ok(url)
    }

    async fn delete(&self, url: &str) -> bool {
        let Some(key) = self.key_for(url) else {
            return false;
        };

        match self.head(key).await {
            Ok(Some(_)) => {}
            Ok(None) => return false,
            Err(e) => {
                error!(url, error = %e, "Error deleting file from R2");
                return false;
            }
        }

        let deleted = match self.operator() {
            Ok(operator) => operator.delete(key).await.map_err(StorageError::from),
            Err(e) => Err(e),
        };
        match deleted {
            Ok(()) => {
                info!(url, "File deleted from R2");
                true
            }
            Err(e) => {
                error!(url, error = %e, "Error deleting file from R2");
                false
            }
        }
    }

    async fn exists(&self, url: &str) -> bool {
        let Some(key) = self.key_for(url) else {
            return false;
        };

        match self.head(key).await {
            Ok(found) => found.is_some(),
            Err(e) => {
                error!(url, error = %e, "Error checking file existence in R2");
                false
            }
        }
    }

    async fn size(&self, url: &str) -> u64 {
        let Some(key) = self.key_for(url) else {
            return 0;
        };

        match self.head(key).await {
            Ok(Some(meta)) => meta.content_length(),
            Ok(None) => 0,
            Err(e) => {
                error!(url, error = %e, "Error getting file size from R2");
                0
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> R2Config {
        R2Config {
            account_id: "acct123".into(),
            access_key: "access".into(),
            secret_key: "secret".into(),
            bucket: "pages".into(),
            public_url: "https://cdn.example.com/".into(),
            endpoint: None,
        }
    }

    #[test]
    fn test_endpoint_derived_from_account() {
        let store = R2FileStore::new(&config(), Duration::from_secs(5)).expect("should create");
        assert_eq!(store.endpoint(), "https://acct123.r2.cloudflarestorage.com");
        assert_eq!(store.url_prefix(), "https://cdn.example.com/");
    }

    #[test]
    fn test_endpoint_override() {
        let mut cfg = config();
        cfg.endpoint = Some("http://127.0.0.1:9000".into());
        let store = R2FileStore::new(&cfg, Duration::from_secs(5)).expect("should create");
        assert_eq!(store.endpoint(), "http://127.0.0.1:9000");
    }

    #[test]
    fn test_missing_public_url_is_configuration_error() {
        let mut cfg = config();
        cfg.public_url = String::new();
        let err = R2FileStore::new(&cfg, Duration::from_secs(5))
            .err()
            .expect("should fail");
        assert!(matches!(err, StorageError::Configuration(_)));
    }

    #[test]
    fn test_client_is_built_once() {
        let store = R2FileStore::new(&config(), Duration::from_secs(5)).expect("should create");
        let first: *const Operator = store.operator().expect("operator");
        let second: *const Operator = store.operator().expect("operator");
        assert_eq!(first, second);
    }

    #[test]
    fn test_missing_account_fails_lazily() {
        let mut cfg = config();
        cfg.account_id = String::new();
        let store = R2FileStore::new(&cfg, Duration::from_secs(5)).expect("construction is lazy");
        assert!(matches!(
            store.operator(),
            Err(StorageError::Configuration(_))
        ));
    }
}
