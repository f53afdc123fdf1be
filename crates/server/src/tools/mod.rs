//! MCP tool implementations.
//!
//! This module contains all tools exposed by the senial-sw server.

pub mod cache;
pub mod sw_fetch;
pub mod sw_message;
pub mod sw_notification_click;
pub mod sw_push;
pub mod sw_sync;

use rmcp::{
    ErrorData as McpError,
    model::{CallToolResult, Content},
};
use senial_core::Error;
use serde::Serialize;

/// Serialize a tool output as pretty JSON text content.
pub(crate) fn json_result<T: Serialize>(output: &T) -> Result<CallToolResult, McpError> {
    let json = serde_json::to_string_pretty(output)
        .map_err(|e| Error::InvalidInput(format!("Failed to serialize output: {e}")))?;
    Ok(CallToolResult::success(vec![Content::text(json)]))
}

#[cfg(test)]
pub(crate) mod test_support {
    use rmcp::model::CallToolResult;
    use senial_core::{AppConfig, CacheDb};
    use senial_worker::ServiceWorker;

    /// Worker whose origin is `origin` with only `/` in the install manifest.
    pub async fn worker(origin: &str) -> ServiceWorker {
        let config = AppConfig {
            origin: origin.to_string(),
            static_assets: vec!["/".to_string()],
            cdn_assets: Vec::new(),
            timeout_ms: 2000,
            ..Default::default()
        };
        let db = CacheDb::open_in_memory().await.unwrap();
        ServiceWorker::from_app_config(&config, db).unwrap()
    }

    /// Parse the JSON text of the first content item.
    pub fn output<T: serde::de::DeserializeOwned>(result: &CallToolResult) -> T {
        let content_val = serde_json::to_value(&result.content[0]).unwrap();
        let text = content_val
            .get("text")
            .and_then(|v| v.as_str())
            .expect("Expected text field in content");
        serde_json::from_str(text).unwrap()
    }
}
