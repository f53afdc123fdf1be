//! Install, activate and eviction.
//!
//! - install: pre-populate the static partition from a fixed manifest. The
//!   bulk write is all-or-nothing; a single failed asset leaves the
//!   partition untouched and the worker redundant.
//! - activate: delete every partition that does not belong to the current
//!   version, then claim open clients.
//! - eviction: cap every partition at the most recently added entries, on
//!   demand or on a fixed interval.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use futures_util::future::try_join_all;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use url::Url;

use senial_core::{AppConfig, CacheDb, CacheNames, Error};

use crate::fetch::{Fetcher, resolve};
use crate::host::Clients;
use crate::request::{WorkerRequest, to_stored};
use crate::route::RouteRules;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum WorkerState {
    Parsed,
    Installing,
    Installed,
    Activating,
    Activated,
    Redundant,
}

/// Deployment settings for one worker version, fixed for the process lifetime.
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    pub origin: Url,
    pub names: CacheNames,
    /// Local paths, resolved against `origin` at install time.
    pub static_assets: Vec<String>,
    /// Absolute third-party URLs.
    pub cdn_assets: Vec<String>,
    pub rules: RouteRules,
    pub max_entries: usize,
    pub eviction_interval: Duration,
}

impl WorkerConfig {
    pub fn from_app_config(config: &AppConfig) -> Result<Self, Error> {
        let origin = Url::parse(&config.origin).map_err(|e| Error::InvalidUrl(format!("origin: {e}")))?;
        Ok(Self {
            rules: RouteRules::from_config(config),
            origin,
            names: config.cache_names(),
            static_assets: config.static_assets.clone(),
            cdn_assets: config.cdn_assets.clone(),
            max_entries: config.max_entries_per_partition,
            eviction_interval: config.eviction_interval(),
        })
    }

    /// Install manifest as GET requests, local assets first.
    pub fn manifest(&self) -> Result<Vec<WorkerRequest>, Error> {
        self.static_assets
            .iter()
            .chain(&self.cdn_assets)
            .map(|asset| {
                resolve(asset, &self.origin)
                    .map(WorkerRequest::get)
                    .map_err(|e| Error::InvalidUrl(format!("{asset}: {e}")))
            })
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
pub struct ActivationReport {
    /// Partitions of earlier versions that were removed.
    pub deleted: Vec<String>,
    /// Client windows taken over.
    pub claimed: usize,
}

/// Owns the worker state machine and the cache housekeeping.
pub struct Lifecycle {
    config: Arc<WorkerConfig>,
    db: CacheDb,
    fetcher: Arc<dyn Fetcher>,
    clients: Arc<Clients>,
    state: RwLock<WorkerState>,
    skip_waiting: AtomicBool,
}

impl std::fmt::Debug for Lifecycle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Lifecycle")
            .field("names", &self.config.names)
            .field("skip_waiting", &self.skip_waiting)
            .finish_non_exhaustive()
    }
}

impl Lifecycle {
    pub fn new(config: Arc<WorkerConfig>, db: CacheDb, fetcher: Arc<dyn Fetcher>, clients: Arc<Clients>) -> Self {
        Self {
            config,
            db,
            fetcher,
            clients,
            state: RwLock::new(WorkerState::Parsed),
            skip_waiting: AtomicBool::new(false),
        }
    }

    pub async fn state(&self) -> WorkerState {
        *self.state.read().await
    }

    async fn set_state(&self, state: WorkerState) {
        *self.state.write().await = state;
        tracing::debug!(?state, "worker state changed");
    }

    /// Whether install asked to activate without waiting for clients to close.
    pub fn skipped_waiting(&self) -> bool {
        self.skip_waiting.load(Ordering::SeqCst)
    }

    /// Pre-populate the static partition.
    ///
    /// Returns the number of cached assets. On failure nothing is written and
    /// the worker becomes redundant.
    pub async fn install(&self) -> Result<usize, Error> {
        let current = self.state().await;
        if current != WorkerState::Parsed {
            return Err(Error::InvalidState(format!("cannot install from {current:?}")));
        }

        self.set_state(WorkerState::Installing).await;

        match self.populate_static().await {
            Ok(count) => {
                self.skip_waiting.store(true, Ordering::SeqCst);
                self.set_state(WorkerState::Installed).await;
                tracing::info!(partition = %self.config.names.static_name, assets = count, "worker installed");
                Ok(count)
            }
            Err(e) => {
                self.set_state(WorkerState::Redundant).await;
                tracing::error!(partition = %self.config.names.static_name, error = %e, "install failed");
                Err(e)
            }
        }
    }

    async fn populate_static(&self) -> Result<usize, Error> {
        let partition = &self.config.names.static_name;
        self.db.open_partition(partition).await?;

        let manifest = self.config.manifest()?;
        let fetches = manifest.iter().map(|request| async move {
            let response = self
                .fetcher
                .fetch(request)
                .await
                .map_err(|e| Error::ManifestFailed(format!("{}: {e}", request.url)))?;
            if !response.status.is_success() {
                return Err(Error::ManifestFailed(format!("{}: status {}", request.url, response.status.as_u16())));
            }
            Ok(to_stored(request, &response))
        });
        let responses = try_join_all(fetches).await?;

        self.db.put_entries(partition, &responses).await?;
        Ok(responses.len())
    }

    /// Retire partitions from other versions and claim open clients.
    ///
    /// Partitions that fail to delete are logged and left for the next
    /// activation.
    pub async fn activate(&self) -> Result<ActivationReport, Error> {
        let current = self.state().await;
        if current != WorkerState::Installed {
            return Err(Error::InvalidState(format!("cannot activate from {current:?}")));
        }

        self.set_state(WorkerState::Activating).await;

        let names = match self.db.partition_names().await {
            Ok(names) => names,
            Err(e) => {
                tracing::warn!(error = %e, "could not enumerate partitions during activation");
                Vec::new()
            }
        };

        let mut deleted = Vec::new();
        for name in names.into_iter().filter(|n| !self.config.names.is_current(n)) {
            match self.db.delete_partition(&name).await {
                Ok(_) => {
                    tracing::info!(partition = %name, "deleted outdated partition");
                    deleted.push(name);
                }
                Err(e) => tracing::warn!(partition = %name, error = %e, "failed to delete outdated partition"),
            }
        }

        let claimed = self.clients.claim().await;
        self.set_state(WorkerState::Activated).await;
        tracing::info!(deleted = deleted.len(), claimed, "worker activated");

        Ok(ActivationReport { deleted, claimed })
    }

    /// Trim one partition to `max_entries`.
    pub async fn evict_partition(&self, partition: &str, max_entries: usize) -> Result<u64, Error> {
        if !self.db.has_partition(partition).await? {
            return Err(Error::PartitionNotFound(partition.to_string()));
        }
        self.db.trim_partition(partition, max_entries).await
    }

    /// Trim every partition to `max_entries`. Per-partition failures are
    /// logged and the sweep continues. Returns the number of removed entries.
    pub async fn evict_all(&self, max_entries: usize) -> u64 {
        let names = match self.db.partition_names().await {
            Ok(names) => names,
            Err(e) => {
                tracing::warn!(error = %e, "could not enumerate partitions for eviction");
                return 0;
            }
        };

        let mut removed = 0;
        for name in names {
            match self.db.trim_partition(&name, max_entries).await {
                Ok(count) => {
                    if count > 0 {
                        tracing::debug!(partition = %name, removed = count, "trimmed partition");
                    }
                    removed += count;
                }
                Err(e) => tracing::warn!(partition = %name, error = %e, "eviction failed"),
            }
        }
        removed
    }

    /// Eviction sweep with the configured cap.
    pub async fn evict(&self) -> u64 {
        self.evict_all(self.config.max_entries).await
    }

    /// Run `evict` every `eviction_interval`, first run one interval from now.
    ///
    /// The task stops when the returned handle is dropped.
    pub fn spawn_eviction(self: &Arc<Self>) -> EvictionTask {
        let lifecycle = Arc::clone(self);
        let period = self.config.eviction_interval;
        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                let removed = lifecycle.evict().await;
                tracing::debug!(removed, "periodic eviction sweep");
            }
        });
        EvictionTask { handle }
    }
}

/// Handle to the periodic eviction task; aborts it on drop.
#[derive(Debug)]
pub struct EvictionTask {
    handle: JoinHandle<()>,
}

impl EvictionTask {
    pub fn is_running(&self) -> bool {
        !self.handle.is_finished()
    }
}

impl Drop for EvictionTask {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
