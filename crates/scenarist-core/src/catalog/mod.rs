//! Variant catalog assembly.
//!
//! At editor startup the catalog merges the remote library listing for a
//! category with the local archive cache: every remote row becomes a
//! variant, and rows whose archive is already cached are restored to ready
//! without touching the network.

pub mod variant;

use std::sync::Arc;

use tracing::{debug, warn};

use crate::asset::AssetCategory;
use crate::error::Result;
use crate::services::{CacheIndex, RemoteCatalog};

use self::variant::{RemoteVariant, SourceServices, SourceVariant};

/// Builds the variant list for one asset category.
pub struct VariantCatalog {
    category: AssetCategory,
    library: Arc<dyn RemoteCatalog>,
    cache: Arc<dyn CacheIndex>,
    services: Arc<SourceServices>,
}

impl VariantCatalog {
    pub fn new(
        category: AssetCategory,
        library: Arc<dyn RemoteCatalog>,
        cache: Arc<dyn CacheIndex>,
        services: Arc<SourceServices>,
    ) -> Self {
        Self {
            category,
            library,
            cache,
            services,
        }
    }

    pub fn category(&self) -> AssetCategory {
        self.category
    }

    /// Fetch the remote listing and merge it with the local cache.
    ///
    /// Returns one variant per listing row, in listing order. A listing
    /// failure aborts the whole initialization; a cached archive that fails
    /// to unpack only demotes its variant to not-ready, since the download
    /// path can still replace it later.
    pub async fn initialize(&self) -> Result<Vec<Arc<dyn SourceVariant>>> {
        let listing = self.library.get_library(self.category).await?;
        let cached = self.cache.list(self.category);
        debug!(
            category = %self.category,
            remote = listing.len(),
            cached = cached.len(),
            "building variant catalog"
        );

        let mut variants: Vec<Arc<dyn SourceVariant>> = Vec::with_capacity(listing.len());
        for entry in listing {
            let variant = RemoteVariant::new(
                entry.name,
                entry.remote_id,
                entry.asset_id,
                self.category,
                Arc::clone(&self.services),
            );

            if let Some(record) = cached.iter().find(|r| r.asset_id == variant.asset_id()) {
                if let Err(err) = variant.restore_from_cache(record.clone()) {
                    warn!(
                        variant = variant.name(),
                        archive = %record.local_path.display(),
                        error = %err,
                        "cached archive could not be restored; variant stays not ready"
                    );
                }
            }

            variants.push(Arc::new(variant));
        }
        Ok(variants)
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use async_trait::async_trait;
    use tempfile::TempDir;

    use crate::asset::bundle::test_archive::TestArchive;
    use crate::asset::bundle::BundleUnpacker;
    use crate::asset::{CacheRecord, LibraryEntry, Platform};
    use crate::config::BundleVersions;
    use crate::error::Error;
    use crate::services::{DownloadService, NotificationSink};

    use super::*;

    struct FixedLibrary {
        entries: Vec<LibraryEntry>,
    }

    #[async_trait]
    impl RemoteCatalog for FixedLibrary {
        async fn get_library(&self, _category: AssetCategory) -> Result<Vec<LibraryEntry>> {
            Ok(self.entries.clone())
        }
    }

    struct FailingLibrary;

    #[async_trait]
    impl RemoteCatalog for FailingLibrary {
        async fn get_library(&self, _category: AssetCategory) -> Result<Vec<LibraryEntry>> {
            Err(Error::RemoteListing("503 from the catalog".to_string()))
        }
    }

    struct FixedCache {
        records: Vec<CacheRecord>,
    }

    impl CacheIndex for FixedCache {
        fn list(&self, _category: AssetCategory) -> Vec<CacheRecord> {
            self.records.clone()
        }
    }

    struct NoDownloads;

    #[async_trait]
    impl DownloadService for NoDownloads {
        async fn get_asset(
            &self,
            _category: AssetCategory,
            asset_id: &str,
            _display_name: &str,
        ) -> Result<CacheRecord> {
            Err(Error::Download {
                asset_id: asset_id.to_string(),
                reason: "downloads disabled in this test".to_string(),
            })
        }
    }

    struct SilentSink;

    impl NotificationSink for SilentSink {
        fn enqueue_info(&self, _message: String) {}
    }

    fn services() -> Arc<SourceServices> {
        Arc::new(SourceServices {
            downloads: Arc::new(NoDownloads),
            notifications: Arc::new(SilentSink),
            unpacker: Arc::new(BundleUnpacker::new(
                BundleVersions::default(),
                Platform::current(),
            )),
        })
    }

    fn entry(name: &str, asset_id: &str) -> LibraryEntry {
        LibraryEntry {
            name: name.to_string(),
            remote_id: format!("r-{asset_id}"),
            asset_id: asset_id.to_string(),
        }
    }

    fn catalog(entries: Vec<LibraryEntry>, records: Vec<CacheRecord>) -> VariantCatalog {
        VariantCatalog::new(
            AssetCategory::Vehicle,
            Arc::new(FixedLibrary { entries }),
            Arc::new(FixedCache { records }),
            services(),
        )
    }

    #[tokio::test]
    async fn cached_rows_start_ready_and_the_rest_do_not() {
        let temp = TempDir::new().expect("temp");
        let cached_path = temp.path().join("a2.zip");
        TestArchive::vehicle("a2").write(&cached_path);

        let variants = catalog(
            vec![
                entry("SUV", "a1"),
                entry("Sedan", "a2"),
                entry("Hatchback", "a3"),
            ],
            vec![CacheRecord {
                asset_id: "a2".to_string(),
                local_path: cached_path,
            }],
        )
        .initialize()
        .await
        .expect("initialize");

        // Listing order is preserved.
        let names: Vec<&str> = variants.iter().map(|v| v.name()).collect();
        assert_eq!(names, ["SUV", "Sedan", "Hatchback"]);

        assert!(!variants[0].ready());
        assert!(variants[1].ready());
        assert!(variants[1].asset().is_some());
        assert!(!variants[2].ready());
    }

    #[tokio::test]
    async fn listing_failure_aborts_initialization() {
        let catalog = VariantCatalog::new(
            AssetCategory::Vehicle,
            Arc::new(FailingLibrary),
            Arc::new(FixedCache {
                records: Vec::new(),
            }),
            services(),
        );

        let err = catalog.initialize().await.expect_err("listing down");
        assert!(matches!(err, Error::RemoteListing(_)));
    }

    #[tokio::test]
    async fn stale_cached_archive_keeps_its_variant_not_ready() {
        let temp = TempDir::new().expect("temp");
        let stale_path = temp.path().join("a1.zip");
        TestArchive::vehicle("a1")
            .with_version(BundleVersions::default().vehicle + 1)
            .write(&stale_path);

        let variants = catalog(
            vec![entry("SUV", "a1")],
            vec![CacheRecord {
                asset_id: "a1".to_string(),
                local_path: stale_path,
            }],
        )
        .initialize()
        .await
        .expect("stale cache is not fatal");

        assert_eq!(variants.len(), 1);
        assert!(!variants[0].ready());
        assert!(!variants[0].busy());
        assert!(variants[0].asset().is_none());
    }

    #[tokio::test]
    async fn cache_rows_without_a_listing_row_are_ignored() {
        let variants = catalog(
            vec![entry("SUV", "a1")],
            vec![CacheRecord {
                asset_id: "retired".to_string(),
                local_path: PathBuf::from("/nonexistent/retired.zip"),
            }],
        )
        .initialize()
        .await
        .expect("initialize");

        assert_eq!(variants.len(), 1);
        assert_eq!(variants[0].name(), "SUV");
        assert!(!variants[0].ready());
    }

    #[tokio::test]
    async fn first_matching_cache_record_wins() {
        let temp = TempDir::new().expect("temp");
        let good_path = temp.path().join("good.zip");
        TestArchive::vehicle("a1").write(&good_path);

        let variants = catalog(
            vec![entry("SUV", "a1")],
            vec![
                CacheRecord {
                    asset_id: "a1".to_string(),
                    local_path: good_path,
                },
                CacheRecord {
                    asset_id: "a1".to_string(),
                    local_path: PathBuf::from("/nonexistent/dup.zip"),
                },
            ],
        )
        .initialize()
        .await
        .expect("initialize");

        assert!(variants[0].ready());
    }

    #[tokio::test]
    async fn empty_listing_yields_an_empty_catalog() {
        let variants = catalog(Vec::new(), Vec::new())
            .initialize()
            .await
            .expect("initialize");
        assert!(variants.is_empty());
    }
}
