//! Storage, Source and Target Abstractions
//!
//! Provides the platform-agnostic secure credential store plus the two
//! collaborator seams the sync orchestrator is written against:
//!
//! - [`MediaSource`]: the photo library descriptions are read from
//! - [`AssetTarget`]: the asset manager descriptions are written to

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Secure credential storage trait
///
/// Stores opaque secret blobs under string keys. The desktop implementation
/// keeps the OAuth token artifact on disk; tests use an in-memory map.
///
/// # Security Requirements
///
/// Implementations MUST never log or expose the stored values.
///
/// # Example
///
/// ```ignore
/// use bridge_traits::storage::SecureStore;
///
/// async fn store_token(store: &dyn SecureStore, token: &str) -> Result<()> {
///     store.set_secret("oauth_token", token.as_bytes()).await?;
///     Ok(())
/// }
/// ```
#[async_trait]
pub trait SecureStore: Send + Sync {
    /// Store a secret value, replacing any previous value for `key`
    async fn set_secret(&self, key: &str, value: &[u8]) -> Result<()>;

    /// Retrieve a secret value
    ///
    /// Returns `Ok(None)` if the key doesn't exist.
    async fn get_secret(&self, key: &str) -> Result<Option<Vec<u8>>>;

    /// Delete a secret. Deleting a missing key is not an error.
    async fn delete_secret(&self, key: &str) -> Result<()>;
}

/// A media item as returned by a photo-library source.
///
/// This is an immutable snapshot fetched once per run and never persisted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaItem {
    /// Source-side identifier
    pub id: String,
    /// Original file name, used for matching against the target
    pub filename: String,
    /// Free-text description, if the user wrote one
    pub description: Option<String>,
    /// MIME type reported by the source
    pub mime_type: Option<String>,
    /// Creation time as reported by the source (RFC 3339)
    pub creation_time: Option<String>,
}

/// Projection of a [`MediaItem`] onto the fields the sync cares about.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MediaMetadata {
    pub id: String,
    pub filename: String,
    pub description: Option<String>,
    pub creation_time: Option<DateTime<Utc>>,
}

impl MediaMetadata {
    /// The description when it is present and non-empty.
    ///
    /// Whitespace-only descriptions count as present and are copied as-is.
    pub fn usable_description(&self) -> Option<&str> {
        self.description
            .as_deref()
            .filter(|description| !description.is_empty())
    }
}

/// Result of looking an asset up by file name on the target.
///
/// A failed search is reported separately from an empty result so that
/// callers can decide whether both should be handled alike.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssetLookup {
    /// The first matching asset's identifier
    Found(String),
    /// The search succeeded and returned no assets
    NotFound,
    /// The search request failed; the reason is for logging only
    Failed(String),
}

impl AssetLookup {
    /// The asset id when the lookup found one.
    pub fn asset_id(&self) -> Option<&str> {
        match self {
            AssetLookup::Found(id) => Some(id),
            _ => None,
        }
    }
}

/// Photo library that descriptions are read from.
#[async_trait]
pub trait MediaSource: Send + Sync {
    /// Fetch every item created within the trailing `window_days`.
    ///
    /// Must paginate the underlying API until exhausted. Ordering is whatever
    /// the upstream API returns.
    ///
    /// # Errors
    ///
    /// Network, authentication and API failures are returned; the caller is
    /// expected to abort the run.
    async fn fetch_items(&self, window_days: u32) -> Result<Vec<MediaItem>>;

    /// Project an item onto its sync-relevant metadata. Never fails.
    fn extract_metadata(&self, item: &MediaItem) -> MediaMetadata;
}

/// Asset manager that descriptions are written to.
#[async_trait]
pub trait AssetTarget: Send + Sync {
    /// Look an asset up by exact original file name.
    async fn find_asset_by_filename(&self, filename: &str) -> AssetLookup;

    /// Current description of an asset, or an empty string when absent,
    /// not found, or the request failed.
    async fn get_asset_description(&self, asset_id: &str) -> String;

    /// Replace an asset's description.
    ///
    /// Returns `Ok(true)` only for a success-class response and `Ok(false)`
    /// for any other status.
    ///
    /// # Errors
    ///
    /// Only transport-level failures are returned as errors.
    async fn update_asset_description(&self, asset_id: &str, description: &str) -> Result<bool>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_usable_description() {
        let mut meta = MediaMetadata {
            id: "1".to_string(),
            filename: "photo.jpg".to_string(),
            description: Some("Sunset".to_string()),
            creation_time: None,
        };
        assert_eq!(meta.usable_description(), Some("Sunset"));

        meta.description = Some("   ".to_string());
        assert_eq!(meta.usable_description(), Some("   "));

        meta.description = Some(String::new());
        assert_eq!(meta.usable_description(), None);

        meta.description = None;
        assert_eq!(meta.usable_description(), None);
    }

    #[test]
    fn test_asset_lookup_id() {
        assert_eq!(
            AssetLookup::Found("asset123".to_string()).asset_id(),
            Some("asset123")
        );
        assert_eq!(AssetLookup::NotFound.asset_id(), None);
        assert_eq!(AssetLookup::Failed("boom".to_string()).asset_id(), None);
    }
}
