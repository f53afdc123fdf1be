//! In-process stand-ins for the runtime surfaces a worker talks to: the
//! client windows it controls and the notifications it shows.

use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

/// A page window within the worker's scope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
pub struct Client {
    pub id: u64,
    pub url: String,
    pub focused: bool,
    /// Whether the active worker intercepts this window's requests.
    pub controlled: bool,
}

#[derive(Debug, Default)]
struct ClientsState {
    next_id: u64,
    windows: Vec<Client>,
}

impl ClientsState {
    fn push(&mut self, url: &str, focused: bool, controlled: bool) -> Client {
        self.next_id += 1;
        if focused {
            self.windows.iter_mut().for_each(|w| w.focused = false);
        }
        let client = Client { id: self.next_id, url: url.to_string(), focused, controlled };
        self.windows.push(client.clone());
        client
    }
}

/// Registry of open client windows.
#[derive(Debug, Default)]
pub struct Clients {
    state: RwLock<ClientsState>,
}

impl Clients {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a window opened by the user; it is uncontrolled until claimed.
    pub async fn connect(&self, url: &str) -> Client {
        self.state.write().await.push(url, false, false)
    }

    /// Take control of every open window. Returns how many changed hands.
    pub async fn claim(&self) -> usize {
        let mut state = self.state.write().await;
        let mut claimed = 0;
        for window in state.windows.iter_mut().filter(|w| !w.controlled) {
            window.controlled = true;
            claimed += 1;
        }
        claimed
    }

    pub async fn matching(&self) -> Vec<Client> {
        self.state.read().await.windows.clone()
    }

    /// Open a new focused window controlled by this worker.
    pub async fn open_window(&self, url: &str) -> Client {
        self.state.write().await.push(url, true, true)
    }

    /// Focus a window by id.
    pub async fn focus(&self, id: u64) -> Option<Client> {
        let mut state = self.state.write().await;
        if !state.windows.iter().any(|w| w.id == id) {
            return None;
        }
        let mut focused = None;
        for window in state.windows.iter_mut() {
            window.focused = window.id == id;
            if window.focused {
                focused = Some(window.clone());
            }
        }
        focused
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
pub struct NotificationAction {
    pub action: String,
    pub title: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
pub struct Notification {
    pub id: u64,
    pub title: String,
    pub body: String,
    pub icon: String,
    /// URL opened by the `view` action.
    pub url: String,
    pub actions: Vec<NotificationAction>,
}

#[derive(Debug, Default)]
struct NotificationsState {
    next_id: u64,
    shown: Vec<Notification>,
}

/// Notifications currently on screen.
#[derive(Debug, Default)]
pub struct Notifications {
    state: RwLock<NotificationsState>,
}

impl Notifications {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn show(
        &self, title: String, body: String, icon: String, url: String, actions: Vec<NotificationAction>,
    ) -> Notification {
        let mut state = self.state.write().await;
        state.next_id += 1;
        let notification = Notification { id: state.next_id, title, body, icon, url, actions };
        state.shown.push(notification.clone());
        notification
    }

    /// Remove a notification from the screen.
    pub async fn close(&self, id: u64) -> Option<Notification> {
        let mut state = self.state.write().await;
        let index = state.shown.iter().position(|n| n.id == id)?;
        Some(state.shown.remove(index))
    }

    pub async fn active(&self) -> Vec<Notification> {
        self.state.read().await.shown.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_claim_controls_existing_windows() {
        let clients = Clients::new();
        clients.connect("http://localhost:5000/").await;
        clients.connect("http://localhost:5000/signals").await;

        assert_eq!(clients.claim().await, 2);
        assert_eq!(clients.claim().await, 0);
        assert!(clients.matching().await.iter().all(|c| c.controlled));
    }

    #[tokio::test]
    async fn test_open_window_takes_focus() {
        let clients = Clients::new();
        let first = clients.open_window("http://localhost:5000/a").await;
        let second = clients.open_window("http://localhost:5000/b").await;

        let windows = clients.matching().await;
        assert!(!windows.iter().find(|w| w.id == first.id).unwrap().focused);
        assert!(windows.iter().find(|w| w.id == second.id).unwrap().focused);
    }

    #[tokio::test]
    async fn test_focus() {
        let clients = Clients::new();
        let first = clients.connect("http://localhost:5000/a").await;
        clients.open_window("http://localhost:5000/b").await;

        let focused = clients.focus(first.id).await.unwrap();
        assert!(focused.focused);
        assert_eq!(clients.matching().await.iter().filter(|w| w.focused).count(), 1);
        assert!(clients.focus(999).await.is_none());
    }

    #[tokio::test]
    async fn test_notifications_show_and_close() {
        let notifications = Notifications::new();
        let shown = notifications
            .show("t".into(), "b".into(), "/i.ico".into(), "/".into(), Vec::new())
            .await;

        assert_eq!(notifications.active().await.len(), 1);
        assert_eq!(notifications.close(shown.id).await, Some(shown.clone()));
        assert!(notifications.close(shown.id).await.is_none());
        assert!(notifications.active().await.is_empty());
    }
}
