//! The service worker as one handle: routing, strategies, lifecycle and the
//! page-facing event handlers behind a single owner.

use std::sync::Arc;

use reqwest::Method;
use serde::Serialize;

use senial_core::{AppConfig, CacheDb, Error};

use crate::events::{self, ClickOutcome, SyncOutcome, SyncQueue, WorkerMessage};
use crate::fetch::{FetchClient, FetchConfig, Fetcher, resolve};
use crate::host::{Clients, Notification, Notifications};
use crate::lifecycle::{ActivationReport, EvictionTask, Lifecycle, WorkerConfig, WorkerState};
use crate::request::{WorkerRequest, WorkerResponse};
use crate::route::{Classification, Route, Strategy, classify};
use crate::strategy::StrategyContext;

/// Result of offering a request to the worker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    /// The worker did not intercept; the caller performs a plain network fetch.
    Passthrough,
    Respond { classification: Classification, strategy: Strategy, response: WorkerResponse },
}

#[derive(Debug, Clone, Serialize, schemars::JsonSchema)]
pub struct WorkerStatus {
    pub state: WorkerState,
    pub static_partition: String,
    pub dynamic_partition: String,
}

pub struct ServiceWorker {
    config: Arc<WorkerConfig>,
    strategies: StrategyContext,
    lifecycle: Arc<Lifecycle>,
    clients: Arc<Clients>,
    notifications: Notifications,
    sync_queue: SyncQueue,
}

impl std::fmt::Debug for ServiceWorker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceWorker")
            .field("origin", &self.config.origin.as_str())
            .field("names", &self.config.names)
            .finish_non_exhaustive()
    }
}

impl ServiceWorker {
    pub fn new(config: WorkerConfig, db: CacheDb, fetcher: Arc<dyn Fetcher>) -> Self {
        let config = Arc::new(config);
        let clients = Arc::new(Clients::new());
        let strategies = StrategyContext::new(db.clone(), fetcher.clone(), config.names.clone());
        let lifecycle = Arc::new(Lifecycle::new(config.clone(), db, fetcher, clients.clone()));
        Self { config, strategies, lifecycle, clients, notifications: Notifications::new(), sync_queue: SyncQueue }
    }

    /// Build a worker backed by a real HTTP client.
    pub fn from_app_config(config: &AppConfig, db: CacheDb) -> Result<Self, Error> {
        let fetcher = FetchClient::new(FetchConfig::from(config))?;
        Ok(Self::new(WorkerConfig::from_app_config(config)?, db, Arc::new(fetcher)))
    }

    pub fn config(&self) -> &WorkerConfig {
        &self.config
    }

    pub fn db(&self) -> &CacheDb {
        &self.strategies.db
    }

    pub fn clients(&self) -> &Clients {
        &self.clients
    }

    pub fn notifications(&self) -> &Notifications {
        &self.notifications
    }

    pub async fn state(&self) -> WorkerState {
        self.lifecycle.state().await
    }

    pub async fn status(&self) -> WorkerStatus {
        WorkerStatus {
            state: self.state().await,
            static_partition: self.config.names.static_name.clone(),
            dynamic_partition: self.config.names.dynamic_name.clone(),
        }
    }

    pub async fn install(&self) -> Result<usize, Error> {
        self.lifecycle.install().await
    }

    pub async fn activate(&self) -> Result<ActivationReport, Error> {
        self.lifecycle.activate().await
    }

    pub async fn evict(&self) -> u64 {
        self.lifecycle.evict().await
    }

    pub async fn evict_all(&self, max_entries: usize) -> u64 {
        self.lifecycle.evict_all(max_entries).await
    }

    pub async fn evict_partition(&self, partition: &str, max_entries: usize) -> Result<u64, Error> {
        self.lifecycle.evict_partition(partition, max_entries).await
    }

    pub fn spawn_eviction(&self) -> EvictionTask {
        self.lifecycle.spawn_eviction()
    }

    /// Parse page input into a request, relative paths resolving against the origin.
    pub fn request(&self, method: &str, input: &str) -> Result<WorkerRequest, Error> {
        let method = Method::from_bytes(method.trim().to_ascii_uppercase().as_bytes())
            .map_err(|_| Error::InvalidInput(format!("invalid method: {method}")))?;
        WorkerRequest::parse(method, input, &self.config.origin).map_err(|e| Error::InvalidUrl(e.to_string()))
    }

    pub fn route(&self, request: &WorkerRequest) -> Route {
        classify(request, &self.config.rules)
    }

    /// Intercept a request. Only an activated worker answers; before that,
    /// and for requests the router ignores, the caller goes to the network.
    pub async fn handle_fetch(&self, request: &WorkerRequest) -> FetchOutcome {
        if self.state().await != WorkerState::Activated {
            tracing::debug!(url = %request.url, "worker not active, passing through");
            return FetchOutcome::Passthrough;
        }

        match self.route(request) {
            Route::Ignore => {
                tracing::debug!(method = %request.method, url = %request.url, "request not intercepted");
                FetchOutcome::Passthrough
            }
            Route::Handle { classification, strategy } => {
                let response = self.strategies.run(strategy, request).await;
                tracing::debug!(
                    url = %request.url,
                    ?classification,
                    ?strategy,
                    status = response.status,
                    source = ?response.source,
                    "request handled"
                );
                FetchOutcome::Respond { classification, strategy, response }
            }
        }
    }

    /// Plain network fetch for requests the worker passed through; nothing is cached.
    pub async fn network_fetch(&self, request: &WorkerRequest) -> Result<WorkerResponse, Error> {
        self.strategies.fetcher.fetch(request).await.map(WorkerResponse::from)
    }

    pub fn handle_message(&self, raw: &str) -> Result<WorkerMessage, Error> {
        events::handle_message(raw)
    }

    pub async fn handle_push(&self, data: Option<&str>) -> Notification {
        events::handle_push(&self.notifications, data).await
    }

    pub async fn handle_notification_click(&self, id: u64, action: Option<&str>) -> Result<ClickOutcome, Error> {
        let origin = &self.config.origin;
        events::handle_notification_click(&self.notifications, &self.clients, id, action, |url| {
            resolve(url, origin).map(String::from).unwrap_or_else(|_| url.to_string())
        })
        .await
    }

    pub fn handle_sync(&self, tag: &str) -> SyncOutcome {
        events::handle_sync(&self.sync_queue, tag)
    }
}
