//! sw_notification_click tool implementation.

use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use senial_worker::ServiceWorker;
use serde::{Deserialize, Serialize};

use super::json_result;

/// Input parameters for sw_notification_click tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SwNotificationClickParams {
    /// Id returned by sw_push.
    pub notification_id: u64,

    /// Clicked action: "view" opens or focuses the notification URL; anything else only closes it.
    #[serde(default)]
    pub action: Option<String>,
}

pub async fn notification_click_impl(
    worker: &ServiceWorker, params: SwNotificationClickParams,
) -> Result<CallToolResult, McpError> {
    let outcome = worker
        .handle_notification_click(params.notification_id, params.action.as_deref())
        .await?;
    json_result(&outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::test_support::{output, worker};
    use senial_worker::ClickOutcome;

    #[tokio::test]
    async fn test_click_view_opens_window() {
        let worker = worker("http://localhost:5000").await;
        let notification = worker.handle_push(Some(r#"{"url":"/signals"}"#)).await;

        let params = SwNotificationClickParams { notification_id: notification.id, action: Some("view".into()) };
        let outcome: ClickOutcome = output(&notification_click_impl(&worker, params).await.unwrap());

        match outcome {
            ClickOutcome::Opened { client } => {
                assert_eq!(client.url, "http://localhost:5000/signals");
                assert!(client.focused);
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_click_unknown_id() {
        let worker = worker("http://localhost:5000").await;
        let params = SwNotificationClickParams { notification_id: 7, action: None };
        assert!(notification_click_impl(&worker, params).await.is_err());
    }
}
