//! sw_push tool implementation.

use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use senial_worker::ServiceWorker;
use serde::{Deserialize, Serialize};

use super::json_result;

/// Input parameters for sw_push tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SwPushParams {
    /// Push data: a JSON object with optional `title`, `body` and `url`, or plain text.
    #[serde(default)]
    pub payload: Option<String>,
}

/// Show the notification for a push message. Returns the notification shown.
pub async fn push_impl(worker: &ServiceWorker, params: SwPushParams) -> Result<CallToolResult, McpError> {
    let notification = worker.handle_push(params.payload.as_deref()).await;
    json_result(&notification)
}
