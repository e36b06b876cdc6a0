//! Editor configuration for the asset subsystem.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::asset::{AssetCategory, Platform};

/// Configuration for variant preparation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EditorConfig {
    /// Directory the download service stores fetched archives in.
    #[serde(default = "default_cache_dir")]
    pub cache_dir: PathBuf,

    /// Platform whose main payloads are selected during unpacking.
    #[serde(default = "Platform::current")]
    pub platform: Platform,

    /// Expected bundle format versions, per category.
    #[serde(default)]
    pub bundle_versions: BundleVersions,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            cache_dir: default_cache_dir(),
            platform: Platform::current(),
            bundle_versions: BundleVersions::default(),
        }
    }
}

fn default_cache_dir() -> PathBuf {
    if let Ok(from_env) = std::env::var("SCENARIST_CACHE_DIR") {
        let trimmed = from_env.trim();
        if !trimmed.is_empty() {
            return PathBuf::from(trimmed);
        }
    }

    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("scenarist")
        .join("assets")
}

/// Bundle format versions this build understands. Bumped in lockstep with
/// the producer pipeline whenever an archive layout changes; an archive
/// carrying another version is stale and has to be rebuilt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BundleVersions {
    #[serde(default = "default_vehicle_version")]
    pub vehicle: u32,

    #[serde(default = "default_pedestrian_version")]
    pub pedestrian: u32,
}

impl BundleVersions {
    /// Version an archive of `category` must carry.
    pub fn expected(&self, category: AssetCategory) -> u32 {
        match category {
            AssetCategory::Vehicle => self.vehicle,
            AssetCategory::Pedestrian => self.pedestrian,
        }
    }
}

impl Default for BundleVersions {
    fn default() -> Self {
        Self {
            vehicle: default_vehicle_version(),
            pedestrian: default_pedestrian_version(),
        }
    }
}

fn default_vehicle_version() -> u32 {
    8
}

fn default_pedestrian_version() -> u32 {
    5
}
