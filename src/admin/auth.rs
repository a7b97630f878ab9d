//! Admin session management.
//!
//! There is a single admin account, authenticated against the credential
//! record from the settings file. A successful login gets a random session
//! ID held in memory; sessions die with the process, which simply logs the
//! operator out.

use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};
use rand::distr::Alphanumeric;
use rand::Rng;
use tokio::sync::RwLock;

/// Cookie name for the session ID
pub const SESSION_COOKIE: &str = "runboard_admin_session";

/// An authenticated admin session.
#[derive(Debug, Clone)]
pub struct AdminSession {
    pub session_id: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

/// In-memory store for admin sessions.
#[derive(Default)]
pub struct SessionStore {
    sessions: RwLock<HashMap<String, AdminSession>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Generate a cryptographically secure session ID.
    fn generate_session_id() -> String {
        rand::rng()
            .sample_iter(&Alphanumeric)
            .take(64)
            .map(char::from)
            .collect()
    }

    /// Create a session valid for `timeout_secs` and return its ID.
    pub async fn create(&self, timeout_secs: u64) -> String {
        let session_id = Self::generate_session_id();
        let now = Utc::now();
        let session = AdminSession {
            session_id: session_id.clone(),
            created_at: now,
            expires_at: now + Duration::seconds(timeout_secs as i64),
        };
        self.sessions
            .write()
            .await
            .insert(session_id.clone(), session);
        session_id
    }

    /// Look up a session, removing it if it has expired.
    pub async fn validate(&self, session_id: &str) -> Option<AdminSession> {
        let mut sessions = self.sessions.write().await;
        match sessions.get(session_id) {
            Some(session) if session.expires_at > Utc::now() => Some(session.clone()),
            Some(_) => {
                sessions.remove(session_id);
                None
            }
            None => None,
        }
    }

    /// Delete a session (logout).
    pub async fn delete(&self, session_id: &str) {
        self.sessions.write().await.remove(session_id);
    }

    /// Drop all expired sessions (background cleanup task).
    pub async fn cleanup_expired(&self) -> usize {
        let now = Utc::now();
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, session| session.expires_at > now);
        before - sessions.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn create_and_validate() {
        let store = SessionStore::new();
        let id = store.create(60).await;
        assert_eq!(id.len(), 64);

        let session = store.validate(&id).await.unwrap();
        assert_eq!(session.session_id, id);
        assert!(session.expires_at > session.created_at);

        assert!(store.validate("no-such-session").await.is_none());
    }

    #[tokio::test]
    async fn session_ids_are_unique() {
        let store = SessionStore::new();
        let a = store.create(60).await;
        let b = store.create(60).await;
        assert_ne!(a, b);
    }

    #[tokio::test]
    async fn expired_sessions_are_rejected_and_removed() {
        let store = SessionStore::new();
        let id = store.create(0).await;

        assert!(store.validate(&id).await.is_none());
        // A second lookup misses entirely; the first removed it
        assert_eq!(store.cleanup_expired().await, 0);
    }

    #[tokio::test]
    async fn delete_logs_out() {
        let store = SessionStore::new();
        let id = store.create(60).await;
        store.delete(&id).await;
        assert!(store.validate(&id).await.is_none());
    }

    #[tokio::test]
    async fn cleanup_removes_only_expired() {
        let store = SessionStore::new();
        let _dead = store.create(0).await;
        let alive = store.create(600).await;

        assert_eq!(store.cleanup_expired().await, 1);
        assert!(store.validate(&alive).await.is_some());
    }
}
