//! senial-sw server entry point.
//!
//! Boots the service worker (install, activate, periodic eviction) and then
//! serves it as an MCP server on stdio transport.
//! Logging goes to stderr to avoid interfering with the JSON-RPC protocol on stdout.

use std::sync::Arc;

use anyhow::Result;
use rmcp::service::serve_server;
use rmcp::transport::io::stdio;
use senial_core::{AppConfig, CacheDb};
use senial_worker::ServiceWorker;
use tracing_subscriber::EnvFilter;

mod handler;
mod tools;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .json()
        .init();

    let config = AppConfig::load()?;
    let names = config.cache_names();
    tracing::info!(
        origin = %config.origin,
        static_partition = %names.static_name,
        dynamic_partition = %names.dynamic_name,
        "Starting senial-sw server on stdio transport"
    );

    let db = CacheDb::open(&config.db_path).await?;
    let worker = Arc::new(ServiceWorker::from_app_config(&config, db)?);

    // A failed install leaves the worker passive; requests then pass through.
    if worker.install().await.is_ok() {
        worker.activate().await?;
    }
    let _eviction = worker.spawn_eviction();

    let handler = handler::SenialSwServer::new(worker);
    let transport = stdio();
    let server = serve_server(handler, transport).await?;

    server.waiting().await?;

    Ok(())
}
