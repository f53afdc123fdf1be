//! Fetch strategies.
//!
//! Each invocation is independent: no state is carried between requests
//! apart from the cache partitions themselves. Network failures never
//! escape a strategy; they turn into a cached response or a plain-text 503.
//!
//! - cache-first: cache hit is returned without touching the network; a miss
//!   is fetched and successful responses land in the static partition.
//! - network-first: successful responses land in the dynamic partition; on
//!   failure the cache answers, else a 503.
//! - stale-while-revalidate: the static partition answers at once while the
//!   network refresh runs on its own task and overwrites the entry later.

use std::sync::Arc;

use tokio::sync::oneshot;

use senial_core::{CacheDb, CacheEntry, CacheNames, Error};

use crate::fetch::{FetchResponse, Fetcher};
use crate::request::{OFFLINE_CONTENT, OFFLINE_RESOURCE, WorkerRequest, WorkerResponse, to_stored};
use crate::route::Strategy;

/// Everything a strategy needs; cheap to clone into spawned tasks.
#[derive(Clone)]
pub struct StrategyContext {
    pub db: CacheDb,
    pub fetcher: Arc<dyn Fetcher>,
    pub names: CacheNames,
}

impl std::fmt::Debug for StrategyContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StrategyContext").field("names", &self.names).finish_non_exhaustive()
    }
}

impl StrategyContext {
    pub fn new(db: CacheDb, fetcher: Arc<dyn Fetcher>, names: CacheNames) -> Self {
        Self { db, fetcher, names }
    }

    /// Produce a response for `request` with the given strategy.
    pub async fn run(&self, strategy: Strategy, request: &WorkerRequest) -> WorkerResponse {
        match strategy {
            Strategy::CacheFirst => cache_first(self, request).await,
            Strategy::NetworkFirst => network_first(self, request).await,
            Strategy::StaleWhileRevalidate => stale_while_revalidate(self, request).await,
        }
    }

    /// Write a successful network response; failures are logged only.
    async fn store(&self, partition: &str, request: &WorkerRequest, response: &FetchResponse) {
        if let Err(e) = self.db.put_entry(partition, &to_stored(request, response)).await {
            tracing::warn!(partition, url = %request.url, error = %e, "cache write failed");
        }
    }

    async fn lookup_any(&self, request: &WorkerRequest) -> Option<CacheEntry> {
        match self.db.match_any(request.cache_key()).await {
            Ok(entry) => entry,
            Err(e) => {
                tracing::warn!(url = %request.url, error = %e, "cache read failed");
                None
            }
        }
    }
}

pub async fn cache_first(ctx: &StrategyContext, request: &WorkerRequest) -> WorkerResponse {
    if let Some(entry) = ctx.lookup_any(request).await {
        tracing::debug!(url = %request.url, partition = %entry.partition, "cache-first hit");
        return entry.into();
    }

    match ctx.fetcher.fetch(request).await {
        Ok(response) => {
            if response.status.is_success() {
                ctx.store(&ctx.names.static_name, request, &response).await;
            }
            response.into()
        }
        Err(e) => {
            tracing::warn!(url = %request.url, error = %e, "cache-first miss and network failed");
            WorkerResponse::offline(OFFLINE_RESOURCE)
        }
    }
}

pub async fn network_first(ctx: &StrategyContext, request: &WorkerRequest) -> WorkerResponse {
    let failure = match ctx.fetcher.fetch(request).await {
        Ok(response) if response.status.is_success() => {
            ctx.store(&ctx.names.dynamic_name, request, &response).await;
            return response.into();
        }
        Ok(response) => {
            tracing::debug!(url = %request.url, status = response.status.as_u16(), "network-first got non-success");
            Some(response)
        }
        Err(e) => {
            tracing::warn!(url = %request.url, error = %e, "network-first fetch failed, trying cache");
            None
        }
    };

    if let Some(entry) = ctx.lookup_any(request).await {
        return entry.into();
    }

    match failure {
        Some(response) => response.into(),
        None => WorkerResponse::offline(OFFLINE_CONTENT),
    }
}

pub async fn stale_while_revalidate(ctx: &StrategyContext, request: &WorkerRequest) -> WorkerResponse {
    let (tx, rx) = oneshot::channel::<Result<WorkerResponse, Error>>();

    let task_ctx = ctx.clone();
    let task_request = request.clone();
    tokio::spawn(async move {
        match task_ctx.fetcher.fetch(&task_request).await {
            Ok(response) => {
                let stored = response.status.is_success().then(|| to_stored(&task_request, &response));
                // The caller may have answered from cache already.
                let _ = tx.send(Ok(response.into()));
                if let Some(stored) = stored {
                    match task_ctx.db.put_entry(&task_ctx.names.static_name, &stored).await {
                        Ok(()) => tracing::debug!(url = %task_request.url, "revalidated cache entry"),
                        Err(e) => tracing::warn!(url = %task_request.url, error = %e, "revalidation write failed"),
                    }
                }
            }
            Err(e) => {
                let _ = tx.send(Err(e));
            }
        }
    });

    let cached = match ctx.db.match_entry(&ctx.names.static_name, request.cache_key()).await {
        Ok(entry) => entry,
        Err(e) => {
            tracing::warn!(url = %request.url, error = %e, "cache read failed");
            None
        }
    };

    if let Some(entry) = cached {
        tracing::debug!(url = %request.url, "serving stale entry while revalidating");
        return entry.into();
    }

    match rx.await {
        Ok(Ok(response)) => response,
        Ok(Err(e)) => {
            tracing::warn!(url = %request.url, error = %e, "revalidation fetch failed with nothing cached");
            WorkerResponse::offline(OFFLINE_RESOURCE)
        }
        Err(_) => WorkerResponse::offline(OFFLINE_RESOURCE),
    }
}
