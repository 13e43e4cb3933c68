use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{RwLock, mpsc};
use uuid::Uuid;

use parley_types::events::ServerEvent;

/// Handle used to emit events to one live connection.
pub type EventSender = mpsc::UnboundedSender<ServerEvent>;

#[derive(Clone)]
struct PresenceEntry {
    conn_id: Uuid,
    tx: EventSender,
}

/// The single source of truth for "is this user currently reachable over a
/// live connection". Maps usernames to the connection currently on record;
/// one connection per username, one username per connection.
#[derive(Clone, Default)]
pub struct PresenceRegistry {
    inner: Arc<RwLock<HashMap<String, PresenceEntry>>>,
}

impl PresenceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `username` as reachable over `conn_id`. Overwrites any prior
    /// entry for the username (last writer wins); also drops any other
    /// username still pointing at this connection.
    pub async fn record(&self, username: &str, conn_id: Uuid, tx: EventSender) {
        let mut map = self.inner.write().await;
        map.retain(|name, entry| name == username || entry.conn_id != conn_id);
        map.insert(username.to_owned(), PresenceEntry { conn_id, tx });
    }

    pub async fn lookup(&self, username: &str) -> Option<(Uuid, EventSender)> {
        self.inner
            .read()
            .await
            .get(username)
            .map(|entry| (entry.conn_id, entry.tx.clone()))
    }

    /// Remove whatever entry `conn_id` currently backs; no-op otherwise.
    /// Keyed by connection, not username: a stale close event from a
    /// connection that has already been replaced must not evict the fresh
    /// entry.
    pub async fn remove(&self, conn_id: Uuid) {
        self.inner
            .write()
            .await
            .retain(|_, entry| entry.conn_id != conn_id);
    }

    pub async fn online_count(&self) -> usize {
        self.inner.read().await.len()
    }
}
