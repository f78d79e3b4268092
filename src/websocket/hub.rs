use dashmap::DashMap;
use serde::Serialize;
use std::sync::{
    atomic::{AtomicU64, Ordering},
    Arc,
};
use tokio::sync::mpsc;

pub type WsSender = mpsc::UnboundedSender<String>;

/// Frames pushed to connected browsers.
#[derive(Debug, Serialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum PushMessage {
    Notification {
        id: i32,
        kind: String,
        message: String,
        target_type: String,
        target_id: i32,
        created_at: String,
    },
    UnreadCount {
        count: u64,
    },
}

/// Per-member fan-out of live connections; a member may have several tabs open.
#[derive(Clone)]
pub struct NotificationHub {
    connections: Arc<DashMap<i32, Vec<(u64, WsSender)>>>,
    next_conn_id: Arc<AtomicU64>,
}

impl Default for NotificationHub {
    fn default() -> Self {
        Self::new()
    }
}

impl NotificationHub {
    pub fn new() -> Self {
        Self {
            connections: Arc::new(DashMap::new()),
            next_conn_id: Arc::new(AtomicU64::new(1)),
        }
    }

    pub fn subscribe(&self, user_id: i32) -> (u64, mpsc::UnboundedReceiver<String>) {
        let conn_id = self.next_conn_id.fetch_add(1, Ordering::Relaxed);
        let (tx, rx) = mpsc::unbounded_channel();
        self.connections
            .entry(user_id)
            .or_default()
            .push((conn_id, tx));
        (conn_id, rx)
    }

    pub fn unsubscribe(&self, user_id: i32, conn_id: u64) {
        self.connections
            .remove_if_mut(&user_id, |_, senders| {
                senders.retain(|(id, _)| *id != conn_id);
                senders.is_empty()
            });
    }

    pub fn is_online(&self, user_id: i32) -> bool {
        self.connections.contains_key(&user_id)
    }

    pub fn push(&self, user_id: i32, message: &PushMessage) {
        match serde_json::to_string(message) {
            Ok(json) => self.send_to_user(user_id, &json),
            Err(e) => tracing::warn!("Failed to serialize push message: {}", e),
        }
    }

    fn send_to_user(&self, user_id: i32, message: &str) {
        // Closed channels are dropped while sending.
        self.connections.remove_if_mut(&user_id, |_, senders| {
            senders.retain(|(_, sender)| sender.send(message.to_string()).is_ok());
            senders.is_empty()
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn every_tab_receives_the_push() {
        let hub = NotificationHub::new();
        let (_, mut a) = hub.subscribe(7);
        let (_, mut b) = hub.subscribe(7);

        hub.push(7, &PushMessage::UnreadCount { count: 3 });

        let expected = r#"{"type":"unread_count","data":{"count":3}}"#;
        assert_eq!(a.recv().await.unwrap(), expected);
        assert_eq!(b.recv().await.unwrap(), expected);
    }

    #[tokio::test]
    async fn unsubscribe_removes_only_that_connection() {
        let hub = NotificationHub::new();
        let (first, _rx1) = hub.subscribe(7);
        let (_second, _rx2) = hub.subscribe(7);

        hub.unsubscribe(7, first);
        assert!(hub.is_online(7));
    }

    #[tokio::test]
    async fn dropped_receivers_are_pruned() {
        let hub = NotificationHub::new();
        let (_, rx) = hub.subscribe(9);
        drop(rx);

        hub.push(9, &PushMessage::UnreadCount { count: 1 });
        assert!(!hub.is_online(9));
    }
}
