//! Asset archive unpacking.
//!
//! An asset archive is a zip container produced by the content pipeline: a
//! `manifest.json` describing format version and asset identity, an optional
//! texture payload, and one main payload per platform. [`BundleUnpacker`]
//! validates the manifest, selects the payload for the configured platform
//! and extracts the single asset it holds. Every intermediate container is
//! scoped to the unpack call and released on every exit path; only the
//! extracted [`AssetHandle`] escapes.

use std::fs::File;
use std::io::{BufReader, Cursor, Read, Seek};
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;
use zip::result::ZipError;
use zip::ZipArchive;

use crate::asset::{AssetBlob, AssetCategory, AssetHandle, Platform};
use crate::config::{BundleVersions, EditorConfig};
use crate::error::{Error, Result};

const MANIFEST_ENTRY: &str = "manifest.json";

/// Archive manifest. Field names are the on-disk contract shared with the
/// producer pipeline; do not rename.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Manifest {
    #[serde(rename = "assetFormatVersion")]
    pub asset_format_version: u32,

    #[serde(rename = "assetId")]
    pub asset_id: String,
}

/// Entry name of the optional texture payload.
pub fn texture_entry_name(asset_id: &str, category: AssetCategory) -> String {
    format!("{}_{}_textures", asset_id, category.label())
}

/// Entry name of the required platform-specific main payload.
pub fn main_entry_name(asset_id: &str, category: AssetCategory, platform: Platform) -> String {
    format!("{}_{}_main_{}", asset_id, category.label(), platform.label())
}

/// Unpacks validated asset archives for one platform.
///
/// The expected format versions and the platform are fixed at construction;
/// callers hand the unpacker around instead of consulting globals.
#[derive(Debug, Clone)]
pub struct BundleUnpacker {
    versions: BundleVersions,
    platform: Platform,
}

impl BundleUnpacker {
    pub fn new(versions: BundleVersions, platform: Platform) -> Self {
        Self { versions, platform }
    }

    pub fn from_config(config: &EditorConfig) -> Self {
        Self::new(config.bundle_versions, config.platform)
    }

    pub fn platform(&self) -> Platform {
        self.platform
    }

    /// Validate the archive at `archive_path` and extract its single asset.
    ///
    /// Blocks the calling thread for the duration; archives are small and
    /// unpacking happens off the time-critical path.
    pub fn unpack(&self, archive_path: &Path, category: AssetCategory) -> Result<AssetHandle> {
        let file = File::open(archive_path).map_err(|err| Error::ArchiveOpen {
            path: archive_path.to_path_buf(),
            message: err.to_string(),
        })?;
        let mut archive = ZipArchive::new(BufReader::new(file)).map_err(|err| Error::ArchiveOpen {
            path: archive_path.to_path_buf(),
            message: err.to_string(),
        })?;

        let manifest = read_manifest(&mut archive, archive_path)?;
        let expected = self.versions.expected(category);
        if manifest.asset_format_version != expected {
            return Err(Error::VersionMismatch {
                path: archive_path.to_path_buf(),
                category,
                expected,
                found: manifest.asset_format_version,
            });
        }

        // Optional texture payload. A missing entry is fine; a present but
        // unreadable one means the archive is corrupt.
        let texture_entry = texture_entry_name(&manifest.asset_id, category);
        let mut textures = if archive.index_for_name(&texture_entry).is_some() {
            let container = archive
                .by_name(&texture_entry)
                .map_err(|err| err.to_string())
                .and_then(PayloadContainer::load)
                .map_err(|message| Error::TexturePayloadLoad {
                    path: archive_path.to_path_buf(),
                    entry: texture_entry.clone(),
                    message,
                })?;
            Some(container)
        } else {
            None
        };

        let main_entry = main_entry_name(&manifest.asset_id, category, self.platform);
        let mut main = archive
            .by_name(&main_entry)
            .map_err(|err| err.to_string())
            .and_then(PayloadContainer::load)
            .map_err(|message| Error::MainPayloadLoad {
                path: archive_path.to_path_buf(),
                entry: main_entry.clone(),
                message,
            })?;

        let names = main.asset_names();
        if names.len() != 1 {
            return Err(Error::UnsupportedArchiveLayout {
                path: archive_path.to_path_buf(),
                count: names.len(),
            });
        }

        // Resolve the textures before the asset leaves its container so the
        // handle never holds dangling texture references.
        let blobs = match textures.as_mut() {
            Some(container) => {
                container
                    .read_all()
                    .map_err(|message| Error::TexturePayloadLoad {
                        path: archive_path.to_path_buf(),
                        entry: texture_entry,
                        message,
                    })?
            }
            None => Vec::new(),
        };

        let asset = main
            .extract(&names[0], blobs)
            .map_err(|message| Error::MainPayloadLoad {
                path: archive_path.to_path_buf(),
                entry: main_entry,
                message,
            })?;

        debug!(
            archive = %archive_path.display(),
            asset = asset.name(),
            "unpacked asset archive"
        );
        // The payload containers and the archive handle drop here, on error
        // paths as well; nothing but the extracted handle survives the call.
        Ok(asset)
    }
}

fn read_manifest<R: Read + Seek>(archive: &mut ZipArchive<R>, path: &Path) -> Result<Manifest> {
    let mut entry = match archive.by_name(MANIFEST_ENTRY) {
        Ok(entry) => entry,
        Err(ZipError::FileNotFound) => {
            return Err(Error::ManifestMissing {
                path: path.to_path_buf(),
            })
        }
        Err(err) => {
            return Err(Error::ManifestParse {
                path: path.to_path_buf(),
                message: err.to_string(),
            })
        }
    };

    let mut raw = String::new();
    entry
        .read_to_string(&mut raw)
        .map_err(|err| Error::ManifestParse {
            path: path.to_path_buf(),
            message: err.to_string(),
        })?;
    serde_json::from_str(&raw).map_err(|err| Error::ManifestParse {
        path: path.to_path_buf(),
        message: err.to_string(),
    })
}

/// A payload bundle held in memory while its assets are pulled out.
/// Dropping the container releases everything it still holds.
struct PayloadContainer {
    archive: ZipArchive<Cursor<Vec<u8>>>,
}

impl PayloadContainer {
    fn load(mut entry: impl Read) -> std::result::Result<Self, String> {
        let mut bytes = Vec::new();
        entry
            .read_to_end(&mut bytes)
            .map_err(|err| err.to_string())?;
        let archive = ZipArchive::new(Cursor::new(bytes)).map_err(|err| err.to_string())?;
        Ok(Self { archive })
    }

    fn asset_names(&self) -> Vec<String> {
        self.archive.file_names().map(str::to_string).collect()
    }

    /// Read every asset in the container, front to back.
    fn read_all(&mut self) -> std::result::Result<Vec<AssetBlob>, String> {
        let names = self.asset_names();
        let mut blobs = Vec::with_capacity(names.len());
        for name in names {
            let mut entry = self.archive.by_name(&name).map_err(|err| err.to_string())?;
            let mut data = Vec::new();
            entry.read_to_end(&mut data).map_err(|err| err.to_string())?;
            blobs.push(AssetBlob { name, data });
        }
        Ok(blobs)
    }

    fn extract(
        &mut self,
        name: &str,
        textures: Vec<AssetBlob>,
    ) -> std::result::Result<AssetHandle, String> {
        let mut entry = self.archive.by_name(name).map_err(|err| err.to_string())?;
        let mut data = Vec::new();
        entry.read_to_end(&mut data).map_err(|err| err.to_string())?;
        Ok(AssetHandle::new(name.to_string(), data, textures))
    }
}
