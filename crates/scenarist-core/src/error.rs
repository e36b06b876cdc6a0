//! Crate-wide error type.

use std::path::PathBuf;

use thiserror::Error;

use crate::asset::AssetCategory;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// The remote library listing could not be fetched.
    #[error("remote library listing unavailable: {0}")]
    RemoteListing(String),

    /// Downloading a packaged asset failed. Retryable; the variant stays
    /// not ready and a later `prepare` runs the full sequence again.
    #[error("download of asset {asset_id} failed: {reason}")]
    Download { asset_id: String, reason: String },

    /// The archive path does not exist or is not a readable archive.
    #[error("failed to open asset archive {path}: {message}")]
    ArchiveOpen { path: PathBuf, message: String },

    #[error("asset archive {path} has no manifest.json entry")]
    ManifestMissing { path: PathBuf },

    #[error("asset archive {path} has a malformed manifest: {message}")]
    ManifestParse { path: PathBuf, message: String },

    /// The archive was produced for another bundle format. It is stale and
    /// must be rebuilt by the producer; the editor never migrates it.
    #[error(
        "asset archive {path} carries {category} bundle format {found}, this build expects {expected}"
    )]
    VersionMismatch {
        path: PathBuf,
        category: AssetCategory,
        expected: u32,
        found: u32,
    },

    /// A texture payload entry exists but cannot be loaded.
    #[error("failed to load texture payload {entry} from {path}: {message}")]
    TexturePayloadLoad {
        path: PathBuf,
        entry: String,
        message: String,
    },

    /// The platform main payload is missing or cannot be loaded.
    #[error("failed to load main payload {entry} from {path}: {message}")]
    MainPayloadLoad {
        path: PathBuf,
        entry: String,
        message: String,
    },

    /// The main payload does not hold exactly one asset.
    #[error("unsupported layout in asset archive {path}: expected exactly one asset, found {count}")]
    UnsupportedArchiveLayout { path: PathBuf, count: usize },

    /// A locally supplied variant without an asset has no acquisition path.
    #[error("variant {0} cannot be prepared: no asset was supplied and none can be acquired")]
    Unpreparable(String),

    /// An instantiation-dependent operation was called on a variant whose
    /// asset is not loaded.
    #[error("variant {0} has to be prepared before its asset can be used")]
    NotPrepared(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
