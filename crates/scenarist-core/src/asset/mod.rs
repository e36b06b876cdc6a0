//! Asset data model shared by the catalog and the archive unpacker.

pub mod bundle;

use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Agent-type asset categories the editor can place. Each category has its
/// own remote library and its own bundle format version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssetCategory {
    Vehicle,
    Pedestrian,
}

impl AssetCategory {
    /// Entry-name segment used inside asset archives.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Vehicle => "vehicle",
            Self::Pedestrian => "pedestrian",
        }
    }
}

impl fmt::Display for AssetCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Target platform a main payload was built for.
///
/// The producer pipeline ships two payload flavors; every platform that is
/// not Windows uses the "linux" build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Windows,
    Linux,
}

impl Platform {
    /// Platform of the running build.
    pub fn current() -> Self {
        if cfg!(target_os = "windows") {
            Self::Windows
        } else {
            Self::Linux
        }
    }

    /// Entry-name suffix used inside asset archives.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Windows => "windows",
            Self::Linux => "linux",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A single texture resolved from an archive's texture payload.
#[derive(Debug, Clone)]
pub struct AssetBlob {
    pub name: String,
    pub data: Vec<u8>,
}

/// The extracted visual asset a variant owns once it is ready.
///
/// This is the only value that escapes an unpack run; the archive and the
/// payload containers it came from are released before it is returned, so
/// the handle carries its texture data with it.
#[derive(Debug, Clone)]
pub struct AssetHandle {
    name: String,
    data: Vec<u8>,
    textures: Vec<AssetBlob>,
}

impl AssetHandle {
    pub(crate) fn new(name: String, data: Vec<u8>, textures: Vec<AssetBlob>) -> Self {
        Self {
            name,
            data,
            textures,
        }
    }

    /// Name the asset was stored under in its payload.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Textures that were resolved alongside the asset; empty when the
    /// archive shipped no texture payload.
    pub fn textures(&self) -> &[AssetBlob] {
        &self.textures
    }
}

/// Local cache row mapping an asset to its archive on disk. Owned by the
/// cache collaborator; the core only reads it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheRecord {
    pub asset_id: String,
    pub local_path: PathBuf,
}

/// One row of the remote library listing for a category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LibraryEntry {
    pub name: String,
    pub remote_id: String,
    pub asset_id: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn category_labels_match_archive_contract() {
        assert_eq!(AssetCategory::Vehicle.label(), "vehicle");
        assert_eq!(AssetCategory::Pedestrian.label(), "pedestrian");
    }

    #[test]
    fn platform_labels_match_archive_contract() {
        assert_eq!(Platform::Windows.label(), "windows");
        assert_eq!(Platform::Linux.label(), "linux");
    }

    #[test]
    fn current_platform_is_one_of_the_two_flavors() {
        // Everything that is not Windows maps onto the linux build.
        let current = Platform::current();
        assert!(matches!(current, Platform::Windows | Platform::Linux));
    }
}
