//! TTL-bounded session map.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument};

use crate::clock::Clock;
use crate::session::{Session, SessionId};

/// Sessions live two minutes from creation, whatever their stage.
pub const DEFAULT_TTL: Duration = Duration::from_secs(2 * 60);

/// In-memory session map. Every operation takes the same async lock, so an [`SessionStore::update`]
/// closure sees and mutates a session atomically. Expired entries are removed on access and
/// reported as absent.
pub struct SessionStore {
    sessions: Mutex<HashMap<SessionId, Session>>,
    clock: Arc<dyn Clock>,
    ttl: Duration,
    seq: AtomicU64,
}

impl SessionStore {
    pub fn new(clock: Arc<dyn Clock>, ttl: Duration) -> Self {
        Self {
            sessions: Mutex::new(HashMap::new()),
            clock,
            ttl,
            seq: AtomicU64::new(0),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Captures `text` in a new session for chat `scope`. Id: `{scope}_{created_at_millis}_{seq}`.
    #[instrument(skip(self, text))]
    pub async fn create(&self, scope: i64, text: impl Into<String>) -> Session {
        let created_at = self.clock.now();
        let seq = self.seq.fetch_add(1, Ordering::Relaxed);
        let id = SessionId::new(format!("{}_{}_{}", scope, created_at.timestamp_millis(), seq));
        let session = Session::new(id.clone(), scope, text.into(), created_at);

        self.sessions.lock().await.insert(id.clone(), session.clone());
        info!(session_id = %id, scope = scope, "Session created");
        session
    }

    /// Snapshot of a live session; `None` if it never existed, was deleted, or has expired.
    pub async fn get(&self, id: &str) -> Option<Session> {
        let mut sessions = self.sessions.lock().await;
        self.live_entry(&mut sessions, id).map(|s| s.clone())
    }

    /// Runs `mutate` on a live session under the store lock. `None` if the session is gone.
    pub async fn update<T, F>(&self, id: &str, mutate: F) -> Option<T>
    where
        F: FnOnce(&mut Session) -> T,
    {
        let mut sessions = self.sessions.lock().await;
        self.live_entry(&mut sessions, id).map(mutate)
    }

    /// Removes a session. Returns whether a live session was removed.
    pub async fn delete(&self, id: &str) -> bool {
        let mut sessions = self.sessions.lock().await;
        match sessions.remove(id) {
            Some(session) => {
                let live = !session.is_expired(self.clock.now(), self.ttl);
                debug!(session_id = %id, live = live, "Session deleted");
                live
            }
            None => false,
        }
    }

    /// Evicts every expired session. Returns how many were removed.
    pub async fn sweep(&self) -> usize {
        let now = self.clock.now();
        let mut sessions = self.sessions.lock().await;
        let before = sessions.len();
        sessions.retain(|_, s| !s.is_expired(now, self.ttl));
        let removed = before - sessions.len();
        if removed > 0 {
            debug!(removed = removed, remaining = sessions.len(), "Expired sessions swept");
        }
        removed
    }

    /// Number of live sessions.
    pub async fn len(&self) -> usize {
        self.sweep().await;
        self.sessions.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Drops every session (shutdown).
    pub async fn clear(&self) {
        let mut sessions = self.sessions.lock().await;
        let count = sessions.len();
        sessions.clear();
        info!(count = count, "Session store cleared");
    }

    /// Sweeps every `interval` until the store is dropped or the handle is aborted.
    pub fn spawn_sweeper(self: &Arc<Self>, interval: Duration) -> JoinHandle<()> {
        let store = Arc::downgrade(self);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                match store.upgrade() {
                    Some(store) => {
                        store.sweep().await;
                    }
                    None => break,
                }
            }
        })
    }

    fn live_entry<'a>(
        &self,
        sessions: &'a mut HashMap<SessionId, Session>,
        id: &str,
    ) -> Option<&'a mut Session> {
        let expired = sessions
            .get(id)
            .map(|s| s.is_expired(self.clock.now(), self.ttl))?;
        if expired {
            sessions.remove(id);
            debug!(session_id = %id, "Session expired");
            return None;
        }
        sessions.get_mut(id)
    }
}
