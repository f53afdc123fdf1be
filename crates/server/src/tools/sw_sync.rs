//! sw_sync tool implementation.

use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use senial_worker::ServiceWorker;
use serde::{Deserialize, Serialize};

use super::json_result;

/// Input parameters for sw_sync tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SwSyncParams {
    /// Sync registration tag; only "background-sync" is handled.
    pub tag: String,
}

pub async fn sync_impl(worker: &ServiceWorker, params: SwSyncParams) -> Result<CallToolResult, McpError> {
    json_result(&worker.handle_sync(&params.tag))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::test_support::{output, worker};
    use senial_worker::SyncOutcome;

    #[tokio::test]
    async fn test_sync_background_tag() {
        let worker = worker("http://localhost:5000").await;
        let params = SwSyncParams { tag: "background-sync".into() };

        let outcome: SyncOutcome = output(&sync_impl(&worker, params).await.unwrap());

        assert!(outcome.handled);
        assert_eq!(outcome.replayed, 0);
    }

    #[tokio::test]
    async fn test_sync_other_tag() {
        let worker = worker("http://localhost:5000").await;
        let outcome: SyncOutcome = output(&sync_impl(&worker, SwSyncParams { tag: "x".into() }).await.unwrap());
        assert!(!outcome.handled);
    }
}
