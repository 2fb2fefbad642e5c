use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{RwLock, mpsc};
use tracing::debug;
use uuid::Uuid;

use lifeline_types::events::Frame;

/// Identifies one live socket. A user may hold several at once.
pub type SessionId = Uuid;

/// Routes payloads to every live session joined under a key.
///
/// The gateway keys groups by username and carries [`Frame`]s; group chat
/// rooms reuse the same router keyed by room name. Each group holds one
/// unbounded sender per session and exists only while it has members.
/// Delivery is best effort: a publish to a key with no sessions is dropped,
/// nothing is queued.
pub struct PresenceRouter<T = Frame> {
    inner: Arc<RouterInner<T>>,
}

struct RouterInner<T> {
    /// key -> (session_id -> sender)
    groups: RwLock<HashMap<String, HashMap<SessionId, mpsc::UnboundedSender<T>>>>,
}

impl<T> Clone for PresenceRouter<T> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<T> Default for PresenceRouter<T> {
    fn default() -> Self {
        Self {
            inner: Arc::new(RouterInner {
                groups: RwLock::new(HashMap::new()),
            }),
        }
    }
}

impl<T: Clone> PresenceRouter<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a new session under `key`. Returns its id and the receiver the
    /// session loop drains.
    pub async fn join(&self, key: &str) -> (SessionId, mpsc::UnboundedReceiver<T>) {
        let session_id = Uuid::new_v4();
        let (tx, rx) = mpsc::unbounded_channel();
        self.inner
            .groups
            .write()
            .await
            .entry(key.to_string())
            .or_default()
            .insert(session_id, tx);
        debug!("{} joined with session {}", key, session_id);
        (session_id, rx)
    }

    /// Remove one session. The group is dropped once it is empty.
    pub async fn leave(&self, key: &str, session_id: SessionId) {
        let mut groups = self.inner.groups.write().await;
        if let Some(sessions) = groups.get_mut(key) {
            sessions.remove(&session_id);
            if sessions.is_empty() {
                groups.remove(key);
            }
        }
        debug!("{} left session {}", key, session_id);
    }

    /// Push `payload` to every session under `key`. Returns the number of
    /// sessions it reached; zero when nobody is joined.
    pub async fn publish(&self, key: &str, payload: T) -> usize {
        let groups = self.inner.groups.read().await;
        let Some(sessions) = groups.get(key) else {
            return 0;
        };

        sessions
            .values()
            .filter(|tx| tx.send(payload.clone()).is_ok())
            .count()
    }

    #[cfg(test)]
    pub(crate) async fn session_count(&self, key: &str) -> usize {
        self.inner
            .groups
            .read()
            .await
            .get(key)
            .map_or(0, |sessions| sessions.len())
    }
}
