//! Session Management
//!
//! Server-side record of issued sessions so logout can revoke a token before
//! it expires.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};
use uuid::Uuid;

use crate::error::Result;

/// Unique session identifier
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(String);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn from_string(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// An authenticated session
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Session {
    /// Unique identifier
    pub id: SessionId,

    /// Who logged in
    pub username: String,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,

    /// Hard expiry
    pub expires_at: DateTime<Utc>,

    /// Cleared on logout
    pub active: bool,
}

impl Session {
    pub fn new(username: impl Into<String>, expires_at: DateTime<Utc>) -> Self {
        Self {
            id: SessionId::new(),
            username: username.into(),
            created_at: Utc::now(),
            expires_at,
            active: true,
        }
    }

    /// Active and not past expiry
    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        self.active && now < self.expires_at
    }

    /// End the session
    pub fn end(&mut self) {
        self.active = false;
    }
}

/// Session storage trait
pub trait SessionStore: Send + Sync {
    /// Save or update a session
    fn save(&self, session: &Session) -> Result<()>;

    /// Load a session by ID
    fn load(&self, id: &SessionId) -> Result<Option<Session>>;

    /// Mark a session inactive; returns whether it existed
    fn revoke(&self, id: &SessionId) -> Result<bool>;

    /// Drop sessions that expired before `now`; returns how many
    fn purge_expired(&self, now: DateTime<Utc>) -> Result<usize>;
}

/// In-memory session store
pub struct MemorySessionStore {
    sessions: RwLock<HashMap<SessionId, Session>>,
}

impl Default for MemorySessionStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
        }
    }
}

impl SessionStore for MemorySessionStore {
    fn save(&self, session: &Session) -> Result<()> {
        let mut sessions = self.sessions.write().unwrap_or_else(PoisonError::into_inner);
        sessions.insert(session.id.clone(), session.clone());
        Ok(())
    }

    fn load(&self, id: &SessionId) -> Result<Option<Session>> {
        let sessions = self.sessions.read().unwrap_or_else(PoisonError::into_inner);
        Ok(sessions.get(id).cloned())
    }

    fn revoke(&self, id: &SessionId) -> Result<bool> {
        let mut sessions = self.sessions.write().unwrap_or_else(PoisonError::into_inner);
        Ok(sessions.get_mut(id).map(Session::end).is_some())
    }

    fn purge_expired(&self, now: DateTime<Utc>) -> Result<usize> {
        let mut sessions = self.sessions.write().unwrap_or_else(PoisonError::into_inner);
        let before = sessions.len();
        sessions.retain(|_, s| now < s.expires_at);
        Ok(before - sessions.len())
    }
}
