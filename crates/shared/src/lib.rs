//! Shared errors and configuration for Inkpress.
//!
//! This crate provides common types used across all other crates:
//! - Application-wide error types
//! - Configuration management

pub mod config;
pub mod error;

pub use config::{
    AppConfig, LocalStorageConfig, R2Config, ServerConfig, StorageConfig, SupabaseConfig,
};
pub use error::{AppError, AppResult};
