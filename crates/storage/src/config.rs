//! Storage provider selection.

use std::fmt;

use serde::Serialize;

/// Storage backend an application is bound to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum StorageProvider {
    /// Local filesystem, served by this process under `/files/`.
    #[default]
    Local,
    /// Cloudflare R2 through its S3-compatible API.
    R2,
    /// Supabase Storage REST API.
    Supabase,
}

impl StorageProvider {
    /// Resolve a configured provider name.
    ///
    /// Matching is case-insensitive and ignores surrounding whitespace.
    /// Returns `None` for anything unrecognized.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "local" => Some(Self::Local),
            "r2" => Some(Self::R2),
            "supabase" => Some(Self::Supabase),
            _ => None,
        }
    }

    /// Resolve a configured provider name, falling back to [`Self::Local`].
    #[must_use]
    pub fn from_setting(value: &str) -> Self {
        Self::parse(value).unwrap_or_default()
    }

    /// Get the provider name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Local => "local",
            Self::R2 => "r2",
            Self::Supabase => "supabase",
        }
    }
}

impl fmt::Display for StorageProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("local", StorageProvider::Local)]
    #[case("LOCAL", StorageProvider::Local)]
    #[case("r2", StorageProvider::R2)]
    #[case("R2", StorageProvider::R2)]
    #[case(" r2 ", StorageProvider::R2)]
    #[case("supabase", StorageProvider::Supabase)]
    #[case("SupaBase", StorageProvider::Supabase)]
    fn test_from_setting_known(#[case] value: &str, #[case] expected: StorageProvider) {
        assert_eq!(StorageProvider::from_setting(value), expected);
        assert_eq!(StorageProvider::parse(value), Some(expected));
    }

    #[rstest]
    #[case("azure")]
    #[case("s3")]
    #[case("")]
    fn test_from_setting_unknown_falls_back_to_local(#[case] value: &str) {
        assert_eq!(StorageProvider::parse(value), None);
        assert_eq!(StorageProvider::from_setting(value), StorageProvider::Local);
    }

    #[test]
    fn test_name_round_trips() {
        for provider in [
            StorageProvider::Local,
            StorageProvider::R2,
            StorageProvider::Supabase,
        ] {
            assert_eq!(StorageProvider::parse(provider.name()), Some(provider));
            assert_eq!(provider.to_string(), provider.name());
        }
    }
}
