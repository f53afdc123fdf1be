//! cache_list tool implementation.
//!
//! Lists partitions with entry counts alongside the worker state.

use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use senial_core::cache::PartitionInfo;
use senial_worker::{ServiceWorker, WorkerStatus};
use serde::{Deserialize, Serialize};

use crate::tools::json_result;

/// Parameters for the cache_list tool.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct CacheListParams {}

/// Output from the cache_list tool.
#[derive(Debug, Clone, Serialize, JsonSchema)]
pub struct CacheListOutput {
    pub worker: WorkerStatus,
    /// Partitions in creation order.
    pub partitions: Vec<PartitionInfo>,
}

/// Implementation of the cache_list tool.
pub async fn list_impl(worker: &ServiceWorker, _params: CacheListParams) -> Result<CallToolResult, McpError> {
    let partitions = worker.db().list_partitions().await?;
    let output = CacheListOutput { worker: worker.status().await, partitions };
    json_result(&output)
}
