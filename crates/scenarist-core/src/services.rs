//! Collaborator contracts the core consumes.
//!
//! The editor host wires concrete implementations in at construction time;
//! the core never reaches for process-wide singletons, so every piece is
//! testable without a live host environment.

use async_trait::async_trait;

use crate::asset::{AssetCategory, CacheRecord, LibraryEntry};
use crate::error::Result;

/// Remote catalog listing, one library per asset category.
#[async_trait]
pub trait RemoteCatalog: Send + Sync {
    /// Fetch the library rows for `category`. Transport failures surface as
    /// [`Error::RemoteListing`](crate::Error::RemoteListing).
    async fn get_library(&self, category: AssetCategory) -> Result<Vec<LibraryEntry>>;
}

/// Download transport for packaged assets.
#[async_trait]
pub trait DownloadService: Send + Sync {
    /// Fetch the archive for `asset_id`. On success the archive is
    /// guaranteed to exist at [`CacheRecord::local_path`].
    async fn get_asset(
        &self,
        category: AssetCategory,
        asset_id: &str,
        display_name: &str,
    ) -> Result<CacheRecord>;
}

/// Read-only view of the local archive cache.
pub trait CacheIndex: Send + Sync {
    /// All cached records for `category`.
    fn list(&self, category: AssetCategory) -> Vec<CacheRecord>;
}

/// User-visible progress messages. Fire and forget; implementations swallow
/// their own failures, preparation never depends on the sink.
pub trait NotificationSink: Send + Sync {
    fn enqueue_info(&self, message: String);
}
