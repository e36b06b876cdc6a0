//! Variant kinds and the preparation state machine.
//!
//! Two kinds exist today: [`LocalVariant`], whose asset the host supplies at
//! construction, and [`RemoteVariant`], whose archive lives in the remote
//! catalog until first use. Both sit behind the [`SourceVariant`] trait so
//! the editor never depends on the concrete kind.

use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use tracing::error;

use crate::asset::bundle::BundleUnpacker;
use crate::asset::{AssetCategory, AssetHandle, CacheRecord};
use crate::error::{Error, Result};
use crate::services::{DownloadService, NotificationSink};

/// Externally observable preparation state of a variant.
///
/// `Ready` and `Preparing` are states of one cell, so an observer can never
/// see a variant that is both ready and busy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrepareState {
    NotReady,
    Preparing,
    Ready,
}

/// What a [`SourceVariant::prepare`] call did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrepareStatus {
    /// The variant was already ready; nothing happened.
    AlreadyReady,
    /// Another preparation is in flight; nothing was started.
    InFlight,
    /// This call performed the preparation.
    Prepared,
}

/// One selectable visual/behavioral representation of an agent type.
#[async_trait]
pub trait SourceVariant: Send + Sync {
    /// Display identity, stable for the lifetime of the variant.
    fn name(&self) -> &str;

    /// The loaded visual asset, if the variant is ready.
    fn asset(&self) -> Option<Arc<AssetHandle>>;

    fn state(&self) -> PrepareState;

    fn ready(&self) -> bool {
        self.state() == PrepareState::Ready
    }

    fn busy(&self) -> bool {
        self.state() == PrepareState::Preparing
    }

    /// Make the variant ready to instantiate.
    ///
    /// Idempotent: an already ready variant returns immediately with no
    /// side effects. A call that observes an in-flight preparation returns
    /// [`PrepareStatus::InFlight`] at once and never starts a second
    /// download or unpack for the same variant; callers poll or retry.
    async fn prepare(&self) -> Result<PrepareStatus>;

    /// Asset accessor for instantiation paths. Using an unprepared variant
    /// is a caller bug; it is logged and the operation aborts gracefully.
    fn require_asset(&self) -> Result<Arc<AssetHandle>> {
        self.asset().ok_or_else(|| {
            error!("variant {} was used before it was prepared", self.name());
            Error::NotPrepared(self.name().to_string())
        })
    }
}

impl std::fmt::Debug for dyn SourceVariant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SourceVariant")
            .field("name", &self.name())
            .field("state", &self.state())
            .finish()
    }
}

const NOT_READY: u8 = 0;
const PREPARING: u8 = 1;
const READY: u8 = 2;

/// Atomic holder for [`PrepareState`]. The only way into `Preparing` is the
/// compare-and-swap in [`StateCell::try_begin`], so two preparations can
/// never run at once for the same variant.
#[derive(Debug)]
struct StateCell(AtomicU8);

impl StateCell {
    fn new() -> Self {
        Self(AtomicU8::new(NOT_READY))
    }

    fn get(&self) -> PrepareState {
        decode(self.0.load(Ordering::Acquire))
    }

    /// `NotReady -> Preparing`. On failure returns the state that was
    /// observed instead.
    fn try_begin(&self) -> std::result::Result<(), PrepareState> {
        self.0
            .compare_exchange(NOT_READY, PREPARING, Ordering::AcqRel, Ordering::Acquire)
            .map(|_| ())
            .map_err(decode)
    }

    fn finish_ready(&self) {
        self.0.store(READY, Ordering::Release);
    }

    fn abort(&self) {
        self.0.store(NOT_READY, Ordering::Release);
    }
}

fn decode(raw: u8) -> PrepareState {
    match raw {
        PREPARING => PrepareState::Preparing,
        READY => PrepareState::Ready,
        _ => PrepareState::NotReady,
    }
}

/// Clears `Preparing` on every exit path of a preparation.
///
/// [`PrepareGuard::complete`] publishes `Ready`; dropping the guard without
/// completing returns the variant to `NotReady` so a later call can retry
/// the full sequence.
struct PrepareGuard<'a> {
    state: &'a StateCell,
    done: bool,
}

impl<'a> PrepareGuard<'a> {
    fn begin(state: &'a StateCell) -> std::result::Result<Self, PrepareState> {
        state.try_begin()?;
        Ok(Self { state, done: false })
    }

    fn complete(mut self) {
        self.state.finish_ready();
        self.done = true;
    }
}

impl Drop for PrepareGuard<'_> {
    fn drop(&mut self) {
        if !self.done {
            self.state.abort();
        }
    }
}

/// Collaborators a remote variant needs to acquire its asset. Wired in by
/// the host at construction; the core owns no singletons.
pub struct SourceServices {
    pub downloads: Arc<dyn DownloadService>,
    pub notifications: Arc<dyn NotificationSink>,
    pub unpacker: Arc<BundleUnpacker>,
}

/// Variant whose asset is supplied by the host at construction.
pub struct LocalVariant {
    name: String,
    asset: Option<Arc<AssetHandle>>,
}

impl LocalVariant {
    pub fn new(name: impl Into<String>, asset: Option<AssetHandle>) -> Self {
        Self {
            name: name.into(),
            asset: asset.map(Arc::new),
        }
    }
}

#[async_trait]
impl SourceVariant for LocalVariant {
    fn name(&self) -> &str {
        &self.name
    }

    fn asset(&self) -> Option<Arc<AssetHandle>> {
        self.asset.clone()
    }

    fn state(&self) -> PrepareState {
        if self.asset.is_some() {
            PrepareState::Ready
        } else {
            PrepareState::NotReady
        }
    }

    async fn prepare(&self) -> Result<PrepareStatus> {
        if self.asset.is_some() {
            Ok(PrepareStatus::AlreadyReady)
        } else {
            // No acquisition path exists for a local variant without an
            // asset; constructing one this way is a host configuration bug.
            Err(Error::Unpreparable(self.name.clone()))
        }
    }
}

/// Variant whose packaged archive lives in the remote catalog until it is
/// first needed.
pub struct RemoteVariant {
    name: String,
    remote_id: String,
    asset_id: String,
    category: AssetCategory,
    state: StateCell,
    slots: Mutex<Slots>,
    services: Arc<SourceServices>,
}

#[derive(Default)]
struct Slots {
    cache_entry: Option<CacheRecord>,
    asset: Option<Arc<AssetHandle>>,
}

impl RemoteVariant {
    pub fn new(
        name: impl Into<String>,
        remote_id: impl Into<String>,
        asset_id: impl Into<String>,
        category: AssetCategory,
        services: Arc<SourceServices>,
    ) -> Self {
        Self {
            name: name.into(),
            remote_id: remote_id.into(),
            asset_id: asset_id.into(),
            category,
            state: StateCell::new(),
            slots: Mutex::new(Slots::default()),
            services,
        }
    }

    pub fn remote_id(&self) -> &str {
        &self.remote_id
    }

    pub fn asset_id(&self) -> &str {
        &self.asset_id
    }

    pub fn category(&self) -> AssetCategory {
        self.category
    }

    /// The cache record backing this variant, once one is known.
    pub fn cache_entry(&self) -> Option<CacheRecord> {
        self.slots().cache_entry.clone()
    }

    fn slots(&self) -> MutexGuard<'_, Slots> {
        self.slots.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Unpack an already cached archive so the variant starts ready without
    /// a network download. Used by the catalog at initialization; errors go
    /// back to the caller, which decides whether they are fatal.
    pub fn restore_from_cache(&self, record: CacheRecord) -> Result<PrepareStatus> {
        let guard = match PrepareGuard::begin(&self.state) {
            Ok(guard) => guard,
            Err(PrepareState::Ready) => return Ok(PrepareStatus::AlreadyReady),
            Err(_) => return Ok(PrepareStatus::InFlight),
        };

        self.slots().cache_entry = Some(record.clone());
        let handle = self
            .services
            .unpacker
            .unpack(&record.local_path, self.category)?;
        self.slots().asset = Some(Arc::new(handle));
        guard.complete();
        Ok(PrepareStatus::Prepared)
    }
}

#[async_trait]
impl SourceVariant for RemoteVariant {
    fn name(&self) -> &str {
        &self.name
    }

    fn asset(&self) -> Option<Arc<AssetHandle>> {
        self.slots().asset.clone()
    }

    fn state(&self) -> PrepareState {
        self.state.get()
    }

    async fn prepare(&self) -> Result<PrepareStatus> {
        let guard = match PrepareGuard::begin(&self.state) {
            Ok(guard) => guard,
            Err(PrepareState::Ready) => return Ok(PrepareStatus::AlreadyReady),
            Err(_) => return Ok(PrepareStatus::InFlight),
        };

        self.services.notifications.enqueue_info(format!(
            "Started a download process of the {} agent variant.",
            self.name
        ));

        // The sole suspension point of the subsystem.
        let record = self
            .services
            .downloads
            .get_asset(self.category, &self.asset_id, &self.name)
            .await?;
        self.slots().cache_entry = Some(record.clone());

        // Runs on the calling task; archives are small and unpacking stays
        // off the time-critical path.
        let handle = self
            .services
            .unpacker
            .unpack(&record.local_path, self.category)?;
        self.slots().asset = Some(Arc::new(handle));
        guard.complete();

        self.services.notifications.enqueue_info(format!(
            "Agent variant {} has been downloaded.",
            self.name
        ));
        Ok(PrepareStatus::Prepared)
    }
}
