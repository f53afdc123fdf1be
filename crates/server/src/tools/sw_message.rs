//! sw_message tool implementation.
//!
//! Delivers a page message to the worker. Performance metrics are logged;
//! nothing is stored and the worker sends no reply.

use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use senial_worker::{ServiceWorker, WorkerMessage};
use serde::{Deserialize, Serialize};

use super::json_result;

/// Input parameters for sw_message tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SwMessageParams {
    /// JSON message, e.g. `{"type":"PERFORMANCE_METRIC","metric":{...}}`.
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SwMessageOutput {
    pub accepted: bool,
    pub message: WorkerMessage,
}

pub async fn message_impl(worker: &ServiceWorker, params: SwMessageParams) -> Result<CallToolResult, McpError> {
    let message = worker.handle_message(&params.message)?;
    json_result(&SwMessageOutput { accepted: true, message })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::test_support::{output, worker};

    #[tokio::test]
    async fn test_message_metric() {
        let worker = worker("http://localhost:5000").await;
        let params =
            SwMessageParams { message: r#"{"type":"PERFORMANCE_METRIC","metric":{"name":"FCP","value":80}}"#.into() };

        let result: SwMessageOutput = output(&message_impl(&worker, params).await.unwrap());

        assert!(result.accepted);
        assert!(matches!(result.message, WorkerMessage::PerformanceMetric { .. }));
    }

    #[tokio::test]
    async fn test_message_malformed() {
        let worker = worker("http://localhost:5000").await;
        let params = SwMessageParams { message: "{".into() };

        let err = message_impl(&worker, params).await.unwrap_err();
        assert_eq!(err.code.0, -32602);
    }
}
