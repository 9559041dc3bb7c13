use std::fmt;
use std::time::Instant;

use auth::Identity;
use uuid::Uuid;

use crate::session::errors::SessionKeyError;

/// Identifier of one logical session (a connection or rendering circuit).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionKey(pub Uuid);

impl SessionKey {
    /// Generate a new random session key.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Parse a session key from string.
    ///
    /// # Errors
    /// * `InvalidFormat` - String is not a valid UUID
    pub fn from_string(s: &str) -> Result<Self, SessionKeyError> {
        Uuid::parse_str(s.trim())
            .map(SessionKey)
            .map_err(|e| SessionKeyError::InvalidFormat(e.to_string()))
    }
}

impl Default for SessionKey {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SessionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Cached authentication state of a single session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionState {
    pub session_key: SessionKey,
    pub cached_token: Option<String>,
    /// Set once a value, including "no token", has been observed for the session.
    pub loaded_from_store: bool,
    /// False while the store may disagree with `cached_token` after a failed write.
    pub persisted: bool,
    pub(crate) revision: u64,
    pub(crate) last_seen: Instant,
}

impl SessionState {
    pub fn new(session_key: SessionKey) -> Self {
        Self {
            session_key,
            cached_token: None,
            loaded_from_store: false,
            persisted: true,
            revision: 0,
            last_seen: Instant::now(),
        }
    }
}

/// Authentication status of a session as seen from the cache alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStatus {
    Unloaded,
    Anonymous,
    Authenticated,
}

/// Notification published whenever a session's identity changes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthStateChanged {
    pub session: SessionKey,
    pub identity: Identity,
}
