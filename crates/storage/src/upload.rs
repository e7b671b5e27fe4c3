//! Upload payloads and asset placement.

use bytes::Bytes;

/// A file received from a client, already read into memory.
#[derive(Debug, Clone)]
pub struct FileUpload {
    /// File contents.
    pub bytes: Bytes,
    /// Declared content type, as sent by the client.
    pub content_type: Option<String>,
    /// Original filename, as sent by the client.
    pub filename: Option<String>,
}

impl FileUpload {
    /// Create an upload from its parts.
    #[must_use]
    pub fn new(
        bytes: impl Into<Bytes>,
        content_type: Option<String>,
        filename: Option<String>,
    ) -> Self {
        Self {
            bytes: bytes.into(),
            content_type,
            filename,
        }
    }

    /// Size in bytes.
    #[must_use]
    pub fn len(&self) -> u64 {
        self.bytes.len() as u64
    }

    /// Whether the upload carries no bytes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Extension of the original filename including the leading dot, or an
    /// empty string.
    ///
    /// Only ASCII alphanumeric characters survive, so the extension is always
    /// safe to embed in a storage key.
    #[must_use]
    pub fn extension(&self) -> String {
        let Some((_, ext)) = self.filename.as_deref().and_then(|f| f.rsplit_once('.')) else {
            return String::new();
        };
        let ext: String = ext.chars().filter(char::is_ascii_alphanumeric).collect();
        if ext.is_empty() {
            String::new()
        } else {
            format!(".{ext}")
        }
    }
}

/// What an image is used for; each role owns one subdirectory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssetRole {
    /// A user's profile picture.
    Avatar {
        /// Owning user.
        user_id: String,
    },
    /// A webtoon's cover image.
    Cover {
        /// Owning webtoon.
        webtoon_id: String,
    },
    /// One page of a webtoon chapter.
    Page {
        /// Owning webtoon.
        webtoon_id: String,
        /// Owning chapter.
        chapter_id: String,
    },
}

impl AssetRole {
    /// Subdirectory assets of this role are stored under.
    #[must_use]
    pub fn subdirectory(&self) -> String {
        match self {
            Self::Avatar { user_id } => format!("avatars/{user_id}"),
            Self::Cover { webtoon_id } => format!("webtoons/{webtoon_id}/covers"),
            Self::Page {
                webtoon_id,
                chapter_id,
            } => format!("webtoons/{webtoon_id}/chapters/{chapter_id}"),
        }
    }
}
