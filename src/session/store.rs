//! Concurrent in-memory session registry

use super::Session;
use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Thread-safe registry of live sessions
///
/// All sessions share one lock. Requests for different callers only contend
/// for the short time it takes to copy a record in or out.
#[derive(Default, Clone)]
pub struct SessionStore {
    sessions: Arc<RwLock<HashMap<String, Session>>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Existing session for `session_id`, or a fresh one at the main menu.
    /// The flag is `true` when the session was created by this call.
    pub async fn get_or_create(
        &self,
        session_id: &str,
        phone_number: &str,
        now: DateTime<Utc>,
    ) -> (Session, bool) {
        let mut sessions = self.sessions.write().await;
        if let Some(session) = sessions.get(session_id) {
            return (session.clone(), false);
        }
        let session = Session::new(session_id, phone_number, now);
        sessions.insert(session_id.to_string(), session.clone());
        (session, true)
    }

    pub async fn get(&self, session_id: &str) -> Option<Session> {
        self.sessions.read().await.get(session_id).cloned()
    }

    /// Replace the stored record of a live session. Returns `false` and
    /// stores nothing if the session was removed in the meantime.
    pub async fn save(&self, session: Session) -> bool {
        match self.sessions.write().await.get_mut(&session.session_id) {
            Some(slot) => {
                *slot = session;
                true
            }
            None => false,
        }
    }

    /// Remove a session. Absent ids are ignored.
    pub async fn remove(&self, session_id: &str) -> Option<Session> {
        self.sessions.write().await.remove(session_id)
    }

    /// Snapshot of every live session
    pub async fn list(&self) -> Vec<Session> {
        self.sessions.read().await.values().cloned().collect()
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    /// Drop every session older than `ttl`, whatever its state.
    ///
    /// Pure garbage collection: no ledger or notification side effects.
    pub async fn sweep_expired(&self, now: DateTime<Utc>, ttl: Duration) -> Vec<String> {
        let mut sessions = self.sessions.write().await;
        let expired: Vec<String> = sessions
            .values()
            .filter(|s| s.age(now) > ttl)
            .map(|s| s.session_id.clone())
            .collect();
        for id in &expired {
            sessions.remove(id);
        }
        expired
    }
}
