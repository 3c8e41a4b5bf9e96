//! Session Registry — process-wide map from opaque session id to live session.
//!
//! Each session sits behind its own `tokio::sync::Mutex`, which serializes
//! operations on that session only. Sessions that are never ended are evicted
//! by `sweep_expired` once idle for longer than the configured TTL.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::{Mutex, RwLock};
use tracing::info;
use uuid::Uuid;

use crate::interview::session::InterviewSession;

pub type SharedSession = Arc<Mutex<InterviewSession>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(Uuid);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for SessionId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s.trim()).map(SessionId)
    }
}

/// Registry entry as seen by callers.
#[derive(Clone)]
pub struct SessionHandle {
    pub id: SessionId,
    pub session: SharedSession,
    /// Key that started the session; later requests must present the same key.
    pub api_key: String,
    pub persona_id: String,
}

struct Entry {
    handle: SessionHandle,
    last_active: DateTime<Utc>,
}

#[derive(Default)]
pub struct SessionRegistry {
    entries: RwLock<HashMap<SessionId, Entry>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a started session under a fresh id.
    pub async fn insert(
        &self,
        session: InterviewSession,
        api_key: &str,
        persona_id: &str,
    ) -> SessionHandle {
        let now = Utc::now();
        let handle = SessionHandle {
            id: SessionId::new(),
            session: Arc::new(Mutex::new(session)),
            api_key: api_key.to_string(),
            persona_id: persona_id.to_string(),
        };
        self.entries.write().await.insert(
            handle.id,
            Entry {
                handle: handle.clone(),
                last_active: now,
            },
        );
        handle
    }

    /// Looks a session up and marks it active.
    pub async fn get(&self, id: &SessionId) -> Option<SessionHandle> {
        let mut entries = self.entries.write().await;
        let entry = entries.get_mut(id)?;
        entry.last_active = Utc::now();
        Some(entry.handle.clone())
    }

    /// Looks a session up without touching its idle timer.
    pub async fn peek(&self, id: &SessionId) -> Option<SessionHandle> {
        self.entries
            .read()
            .await
            .get(id)
            .map(|entry| entry.handle.clone())
    }

    pub async fn remove(&self, id: &SessionId) -> Option<SessionHandle> {
        self.entries
            .write()
            .await
            .remove(id)
            .map(|entry| entry.handle)
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    /// Evicts sessions idle for longer than `ttl`. Returns how many were evicted.
    pub async fn sweep_expired(&self, ttl: Duration) -> usize {
        self.sweep_expired_at(Utc::now(), ttl).await
    }

    async fn sweep_expired_at(&self, now: DateTime<Utc>, ttl: Duration) -> usize {
        let ttl = chrono::Duration::from_std(ttl).unwrap_or(chrono::Duration::MAX);
        let mut entries = self.entries.write().await;
        let before = entries.len();
        entries.retain(|_, entry| now.signed_duration_since(entry.last_active) <= ttl);
        let evicted = before - entries.len();
        if evicted > 0 {
            info!(
                "Evicted {evicted} idle interview session(s); {} remain",
                entries.len()
            );
        }
        evicted
    }
}
