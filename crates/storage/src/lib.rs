//! Pluggable image storage for Inkpress.
//!
//! One contract, [`FileStore`], with three backends chosen once at startup:
//! - `local` - local filesystem, served by the API under `/files/`
//! - `r2` - Cloudflare R2 through its S3-compatible API (Apache OpenDAL)
//! - `supabase` - Supabase Storage REST API
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                  StorageService (FileStore)                      │
//! │         selected from `storage.provider` at startup              │
//! ├─────────────────────┬─────────────────────┬─────────────────────┤
//! │   LocalFileStore    │     R2FileStore     │  SupabaseFileStore  │
//! │    OpenDAL `fs`     │    OpenDAL `s3`     │    reqwest REST     │
//! └─────────────────────┴─────────────────────┴─────────────────────┘
//! ```
//!
//! Every URL handed out by `store` maps back to its storage key by stripping
//! a fixed prefix, so no metadata has to be kept anywhere else.

pub mod backend;
pub mod backends;
pub mod config;
pub mod error;
pub mod key;
pub mod policy;
pub mod service;
pub mod upload;

pub use backend::FileStore;
pub use backends::{LocalFileStore, R2FileStore, SupabaseFileStore};
pub use config::StorageProvider;
pub use error::StorageError;
pub use policy::{ContentTypeRule, UploadPolicy};
pub use service::StorageService;
pub use upload::{AssetRole, FileUpload};
