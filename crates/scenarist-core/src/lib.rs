//! Scenarist core - variant preparation and asset acquisition for the
//! scenario editor.
//!
//! The editor places agents (vehicles, pedestrians) whose visual
//! representation may live in a remote catalog as a packaged archive. This
//! crate owns the contract for making such a variant ready to instantiate:
//! awaiting the download, validating the archive manifest, selecting and
//! unpacking the platform payload, and keeping the per-variant state machine
//! honest while several callers observe the same preparation.
//!
//! Scene placement, input handling, undo history and the download transport
//! itself are host concerns; the core consumes them through the traits in
//! [`services`].

pub mod asset;
pub mod catalog;
pub mod config;
pub mod error;
pub mod services;

pub use asset::bundle::{BundleUnpacker, Manifest};
pub use asset::{AssetBlob, AssetCategory, AssetHandle, CacheRecord, LibraryEntry, Platform};
pub use catalog::variant::{
    LocalVariant, PrepareState, PrepareStatus, RemoteVariant, SourceServices, SourceVariant,
};
pub use catalog::VariantCatalog;
pub use config::{BundleVersions, EditorConfig};
pub use error::{Error, Result};
pub use services::{CacheIndex, DownloadService, NotificationSink, RemoteCatalog};
