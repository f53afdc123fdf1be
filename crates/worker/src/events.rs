//! Page-facing events besides fetch: messages, push, notification clicks
//! and background sync.

use serde::{Deserialize, Serialize};

use senial_core::Error;

use crate::host::{Client, Clients, Notification, NotificationAction, Notifications};

pub const DEFAULT_PUSH_TITLE: &str = "SenialSOLID";
pub const DEFAULT_PUSH_BODY: &str = "New update available";
pub const NOTIFICATION_ICON: &str = "/static/favicon.ico";
pub const VIEW_ACTION: &str = "view";
pub const DISMISS_ACTION: &str = "dismiss";
pub const BACKGROUND_SYNC_TAG: &str = "background-sync";

/// Structured message posted by a page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum WorkerMessage {
    #[serde(rename = "PERFORMANCE_METRIC")]
    PerformanceMetric {
        #[serde(default)]
        metric: serde_json::Value,
    },
    #[serde(other)]
    Unknown,
}

/// Parse and log a page message. Nothing is stored and nothing is replied.
pub fn handle_message(raw: &str) -> Result<WorkerMessage, Error> {
    let message: WorkerMessage =
        serde_json::from_str(raw).map_err(|e| Error::InvalidInput(format!("malformed message: {e}")))?;

    match &message {
        WorkerMessage::PerformanceMetric { metric } => {
            tracing::info!(metric = %metric, "performance metric received");
        }
        WorkerMessage::Unknown => {
            tracing::debug!(raw, "ignoring message of unknown type");
        }
    }

    Ok(message)
}

/// Push payload; every field is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PushPayload {
    pub title: Option<String>,
    pub body: Option<String>,
    pub url: Option<String>,
}

impl PushPayload {
    /// Decode push data. Text that is not a JSON object becomes the body.
    pub fn parse(data: Option<&str>) -> Self {
        let Some(data) = data.map(str::trim).filter(|d| !d.is_empty()) else {
            return Self::default();
        };
        serde_json::from_str(data).unwrap_or_else(|_| Self { body: Some(data.to_string()), ..Self::default() })
    }
}

/// Show the notification for a push message.
pub async fn handle_push(notifications: &Notifications, data: Option<&str>) -> Notification {
    let payload = PushPayload::parse(data);
    let notification = notifications
        .show(
            payload.title.unwrap_or_else(|| DEFAULT_PUSH_TITLE.to_string()),
            payload.body.unwrap_or_else(|| DEFAULT_PUSH_BODY.to_string()),
            NOTIFICATION_ICON.to_string(),
            payload.url.unwrap_or_else(|| "/".to_string()),
            vec![
                NotificationAction { action: VIEW_ACTION.into(), title: "View".into() },
                NotificationAction { action: DISMISS_ACTION.into(), title: "Dismiss".into() },
            ],
        )
        .await;
    tracing::info!(id = notification.id, title = %notification.title, "push notification shown");
    notification
}

/// What a notification click did to client windows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ClickOutcome {
    Focused { client: Client },
    Opened { client: Client },
    /// Closed with no window action.
    Dismissed,
}

/// Close the clicked notification and, for `view`, bring up its URL.
///
/// `resolve_url` turns the notification URL into the absolute form client
/// windows are registered under.
pub async fn handle_notification_click(
    notifications: &Notifications, clients: &Clients, id: u64, action: Option<&str>,
    resolve_url: impl Fn(&str) -> String,
) -> Result<ClickOutcome, Error> {
    let notification = notifications
        .close(id)
        .await
        .ok_or_else(|| Error::InvalidInput(format!("no notification with id {id}")))?;

    if action != Some(VIEW_ACTION) {
        return Ok(ClickOutcome::Dismissed);
    }

    let target = resolve_url(&notification.url);
    let existing = clients.matching().await.into_iter().find(|c| c.url == target);
    if let Some(client) = existing
        && let Some(client) = clients.focus(client.id).await
    {
        return Ok(ClickOutcome::Focused { client });
    }

    let client = clients.open_window(&target).await;
    tracing::debug!(url = %target, id = client.id, "opened window from notification");
    Ok(ClickOutcome::Opened { client })
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
pub struct SyncOutcome {
    pub tag: String,
    pub handled: bool,
    pub replayed: usize,
}

/// Requests queued while offline, replayed on background sync.
///
/// Nothing enqueues requests yet, so a sync always replays zero.
#[derive(Debug, Default)]
pub struct SyncQueue;

impl SyncQueue {
    pub fn pending(&self) -> Vec<String> {
        Vec::new()
    }
}

pub fn handle_sync(queue: &SyncQueue, tag: &str) -> SyncOutcome {
    if tag != BACKGROUND_SYNC_TAG {
        tracing::debug!(tag, "ignoring unknown sync tag");
        return SyncOutcome { tag: tag.to_string(), handled: false, replayed: 0 };
    }
    let pending = queue.pending();
    tracing::info!(tag, pending = pending.len(), "background sync");
    SyncOutcome { tag: tag.to_string(), handled: true, replayed: pending.len() }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn absolute(path: &str) -> String {
        format!("http://localhost:5000{path}")
    }

    #[test]
    fn test_performance_metric_message() {
        let message = handle_message(r#"{"type":"PERFORMANCE_METRIC","metric":{"name":"LCP","value":1234}}"#).unwrap();
        match message {
            WorkerMessage::PerformanceMetric { metric } => assert_eq!(metric["name"], "LCP"),
            other => panic!("unexpected message: {other:?}"),
        }
    }

    #[test]
    fn test_unknown_message_type() {
        assert_eq!(handle_message(r#"{"type":"SOMETHING_ELSE"}"#).unwrap(), WorkerMessage::Unknown);
    }

    #[test]
    fn test_malformed_message() {
        assert!(matches!(handle_message("not json"), Err(Error::InvalidInput(_))));
        assert!(matches!(handle_message(r#"{"metric":1}"#), Err(Error::InvalidInput(_))));
    }

    #[test]
    fn test_push_payload_parse() {
        let payload = PushPayload::parse(Some(r#"{"title":"New signal","url":"/signals/7"}"#));
        assert_eq!(payload.title.as_deref(), Some("New signal"));
        assert_eq!(payload.body, None);
        assert_eq!(payload.url.as_deref(), Some("/signals/7"));

        assert_eq!(PushPayload::parse(None), PushPayload::default());
        assert_eq!(PushPayload::parse(Some("plain text")).body.as_deref(), Some("plain text"));
    }

    #[tokio::test]
    async fn test_push_defaults() {
        let notifications = Notifications::new();
        let notification = handle_push(&notifications, None).await;

        assert_eq!(notification.title, DEFAULT_PUSH_TITLE);
        assert_eq!(notification.body, DEFAULT_PUSH_BODY);
        assert_eq!(notification.url, "/");
        assert_eq!(notification.icon, NOTIFICATION_ICON);
        let actions: Vec<_> = notification.actions.iter().map(|a| a.action.as_str()).collect();
        assert_eq!(actions, vec!["view", "dismiss"]);
    }

    #[tokio::test]
    async fn test_click_view_opens_window() {
        let notifications = Notifications::new();
        let clients = Clients::new();
        let notification = handle_push(&notifications, Some(r#"{"url":"/signals/7"}"#)).await;

        let outcome = handle_notification_click(&notifications, &clients, notification.id, Some("view"), absolute)
            .await
            .unwrap();

        match outcome {
            ClickOutcome::Opened { client } => assert_eq!(client.url, "http://localhost:5000/signals/7"),
            other => panic!("unexpected outcome: {other:?}"),
        }
        assert!(notifications.active().await.is_empty());
    }

    #[tokio::test]
    async fn test_click_view_focuses_existing_window() {
        let notifications = Notifications::new();
        let clients = Clients::new();
        let existing = clients.connect("http://localhost:5000/").await;
        let notification = handle_push(&notifications, None).await;

        let outcome = handle_notification_click(&notifications, &clients, notification.id, Some("view"), absolute)
            .await
            .unwrap();

        assert!(matches!(outcome, ClickOutcome::Focused { client } if client.id == existing.id));
        assert_eq!(clients.matching().await.len(), 1);
    }

    #[tokio::test]
    async fn test_click_dismiss() {
        let notifications = Notifications::new();
        let clients = Clients::new();
        let notification = handle_push(&notifications, None).await;

        let outcome = handle_notification_click(&notifications, &clients, notification.id, Some("dismiss"), absolute)
            .await
            .unwrap();

        assert_eq!(outcome, ClickOutcome::Dismissed);
        assert!(clients.matching().await.is_empty());
    }

    #[tokio::test]
    async fn test_click_unknown_notification() {
        let result = handle_notification_click(&Notifications::new(), &Clients::new(), 42, None, absolute).await;
        assert!(matches!(result, Err(Error::InvalidInput(_))));
    }

    #[test]
    fn test_sync() {
        let queue = SyncQueue;
        assert_eq!(
            handle_sync(&queue, "background-sync"),
            SyncOutcome { tag: "background-sync".into(), handled: true, replayed: 0 }
        );
        assert!(!handle_sync(&queue, "other").handled);
    }
}
