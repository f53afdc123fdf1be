//! cache_purge tool implementation.
//!
//! Runs an eviction sweep, keeping only the most recently added entries.

use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use senial_core::Error;
use senial_worker::ServiceWorker;
use serde::{Deserialize, Serialize};

use crate::tools::json_result;

/// Parameters for the cache_purge tool.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct CachePurgeParams {
    /// Keep only the newest N entries per partition (default: configured cap).
    pub max_entries: Option<usize>,

    /// Restrict the sweep to one partition.
    pub partition: Option<String>,
}

/// Output from the cache_purge tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CachePurgeOutput {
    /// Number of entries deleted.
    pub deleted: u64,
    pub max_entries: usize,
}

/// Implementation of the cache_purge tool.
pub async fn purge_impl(worker: &ServiceWorker, params: CachePurgeParams) -> Result<CallToolResult, McpError> {
    let max_entries = params.max_entries.unwrap_or(worker.config().max_entries);
    if max_entries == 0 {
        return Err(Error::InvalidInput("max_entries must be greater than 0".into()).into());
    }

    let deleted = match &params.partition {
        Some(partition) => worker.evict_partition(partition, max_entries).await?,
        None => worker.evict_all(max_entries).await,
    };

    json_result(&CachePurgeOutput { deleted, max_entries })
}
