//! Storage error types.

use inkpress_shared::AppError;
use thiserror::Error;

/// Storage operation errors.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Upload carried no bytes.
    #[error("file is empty")]
    EmptyFile,

    /// File size exceeds maximum allowed.
    #[error("file size {size} bytes exceeds maximum allowed {max} bytes")]
    FileTooLarge {
        /// Actual file size.
        size: u64,
        /// Maximum allowed size.
        max: u64,
    },

    /// MIME type not allowed.
    #[error("file type '{mime_type}' is not allowed")]
    InvalidMimeType {
        /// The rejected MIME type, or `<none>` when the upload declared none.
        mime_type: String,
    },

    /// Subdirectory cannot be used as a storage path.
    #[error("invalid storage path: {0}")]
    InvalidPath(String),

    /// Storage provider configuration error.
    #[error("storage configuration error: {0}")]
    Configuration(String),

    /// Local filesystem failure.
    #[error("storage I/O failed: {0}")]
    Io(#[from] std::io::Error),

    /// OpenDAL operation error.
    #[error("storage operation failed: {0}")]
    Operation(String),

    /// REST storage API answered with a non-success status.
    #[error("storage API returned {status}: {body}")]
    Upstream {
        /// HTTP status code.
        status: u16,
        /// Response body, as returned.
        body: String,
    },

    /// HTTP transport failure talking to the REST storage API.
    #[error("storage request failed: {0}")]
    Http(String),
}

impl StorageError {
    /// Create a file too large error.
    #[must_use]
    pub fn file_too_large(size: u64, max: u64) -> Self {
        Self::FileTooLarge { size, max }
    }

    /// Create an invalid MIME type error.
    #[must_use]
    pub fn invalid_mime_type(mime_type: impl Into<String>) -> Self {
        Self::InvalidMimeType {
            mime_type: mime_type.into(),
        }
    }

    /// Create an invalid path error.
    #[must_use]
    pub fn invalid_path(msg: impl Into<String>) -> Self {
        Self::InvalidPath(msg.into())
    }

    /// Create a configuration error.
    #[must_use]
    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    /// Create an operation error.
    #[must_use]
    pub fn operation(msg: impl Into<String>) -> Self {
        Self::Operation(msg.into())
    }

    /// Whether this error was caused by the client's input rather than the
    /// backend.
    #[must_use]
    pub const fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::EmptyFile
                | Self::FileTooLarge { .. }
                | Self::InvalidMimeType { .. }
                | Self::InvalidPath(_)
        )
    }
}

impl From<opendal::Error> for StorageError {
    fn from(err: opendal::Error) -> Self {
        Self::Operation(err.to_string())
    }
}

impl From<reqwest::Error> for StorageError {
    fn from(err: reqwest::Error) -> Self {
        Self::Http(err.to_string())
    }
}

impl From<StorageError> for AppError {
    fn from(err: StorageError) -> Self {
        if err.is_validation() {
            return Self::Validation(err.to_string());
        }
        match err {
            StorageError::Configuration(_) => Self::Internal(err.to_string()),
            _ => Self::ExternalService(err.to_string()),
        }
    }
}
