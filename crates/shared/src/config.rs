//! Application configuration management.

use std::path::PathBuf;

use serde::Deserialize;

/// Application configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// Server configuration.
    #[serde(default)]
    pub server: ServerConfig,
    /// Storage configuration.
    #[serde(default)]
    pub storage: StorageConfig,
}

/// Server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host to bind to.
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to listen on.
    #[serde(default = "default_port")]
    pub port: u16,
    /// Largest request body accepted, multipart framing included.
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            max_body_bytes: default_max_body_bytes(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8081
}

fn default_max_body_bytes() -> usize {
    12 * 1024 * 1024
}

/// Storage configuration.
///
/// `provider` is kept as a raw string so that an unknown value never fails
/// deserialization; the storage crate resolves it.
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    /// Storage provider selector: `local`, `r2` or `supabase`.
    #[serde(default = "default_provider")]
    pub provider: String,
    /// Timeout applied to every network call, in seconds.
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
    /// Local filesystem settings.
    #[serde(default)]
    pub local: LocalStorageConfig,
    /// Cloudflare R2 settings.
    #[serde(default)]
    pub r2: R2Config,
    /// Supabase Storage settings.
    #[serde(default)]
    pub supabase: SupabaseConfig,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            request_timeout_secs: default_request_timeout(),
            local: LocalStorageConfig::default(),
            r2: R2Config::default(),
            supabase: SupabaseConfig::default(),
        }
    }
}

fn default_provider() -> String {
    "local".to_string()
}

fn default_request_timeout() -> u64 {
    30
}

/// Local filesystem storage settings.
#[derive(Debug, Clone, Deserialize)]
pub struct LocalStorageConfig {
    /// Directory uploads are written under.
    #[serde(default = "default_local_root")]
    pub root: PathBuf,
    /// Public base URL; files are served from `{base_url}/files/`.
    #[serde(default = "default_local_base_url")]
    pub base_url: String,
    /// Maximum file size in bytes.
    #[serde(default = "default_local_max_file_size")]
    pub max_file_size: u64,
    /// Allowed content types.
    #[serde(default = "default_allowed_types")]
    pub allowed_types: Vec<String>,
}

impl Default for LocalStorageConfig {
    fn default() -> Self {
        Self {
            root: default_local_root(),
            base_url: default_local_base_url(),
            max_file_size: default_local_max_file_size(),
            allowed_types: default_allowed_types(),
        }
    }
}

fn default_local_root() -> PathBuf {
    PathBuf::from("./uploads")
}

fn default_local_base_url() -> String {
    "http://localhost:8081".to_string()
}

fn default_local_max_file_size() -> u64 {
    10 * 1024 * 1024 // 10 MiB
}

fn default_allowed_types() -> Vec<String> {
    vec![
        "image/jpeg".to_string(),
        "image/png".to_string(),
        "image/webp".to_string(),
    ]
}

/// Cloudflare R2 settings.
#[derive(Debug, Clone, Deserialize)]
pub struct R2Config {
    /// Cloudflare account ID, used to derive the endpoint.
    #[serde(default)]
    pub account_id: String,
    /// R2 access key ID.
    #[serde(default)]
    pub access_key: String,
    /// R2 secret access key.
    #[serde(default)]
    pub secret_key: String,
    /// Bucket name.
    #[serde(default = "default_bucket")]
    pub bucket: String,
    /// Public base URL objects are served from (custom domain or r2.dev).
    #[serde(default)]
    pub public_url: String,
    /// Explicit S3 endpoint; overrides the one derived from `account_id`.
    #[serde(default)]
    pub endpoint: Option<String>,
}

impl Default for R2Config {
    fn default() -> Self {
        Self {
            account_id: String::new(),
            access_key: String::new(),
            secret_key: String::new(),
            bucket: default_bucket(),
            public_url: String::new(),
            endpoint: None,
        }
    }
}

/// Supabase Storage settings.
#[derive(Debug, Clone, Deserialize)]
pub struct SupabaseConfig {
    /// Project URL, e.g. `https://abcd.supabase.co`.
    #[serde(default)]
    pub url: String,
    /// Anonymous API key.
    #[serde(default)]
    pub anon_key: String,
    /// Bucket name.
    #[serde(default = "default_bucket")]
    pub bucket: String,
}

impl Default for SupabaseConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            anon_key: String::new(),
            bucket: default_bucket(),
        }
    }
}

fn default_bucket() -> String {
    "inkpress".to_string()
}

impl AppConfig {
    /// Loads configuration from environment and config files.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration cannot be loaded.
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{run_mode}")).required(false))
            .add_source(
                config::Environment::with_prefix("INKPRESS")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("storage.local.allowed_types")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }
}
