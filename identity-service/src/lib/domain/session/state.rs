use std::future::Future;
use std::sync::atomic::AtomicU64;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;
use std::time::Instant;

use auth::Identity;
use auth::TokenValidator;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;

use crate::session::errors::SessionError;
use crate::session::errors::StoreError;
use crate::session::models::AuthStateChanged;
use crate::session::models::SessionKey;
use crate::session::models::SessionState;
use crate::session::models::SessionStatus;
use crate::session::ports::SessionTokenStore;

const CHANGE_CHANNEL_CAPACITY: usize = 64;

/// Tunables for [`SessionAuthState`].
#[derive(Debug, Clone)]
pub struct SessionSettings {
    /// Key the token is stored under in the session store
    pub storage_key: String,
    /// Upper bound for every session store call
    pub store_timeout: Duration,
    /// Entries untouched for this long are dropped by [`SessionAuthState::prune_idle`]
    pub idle_timeout: Duration,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            storage_key: "accessToken".to_string(),
            store_timeout: Duration::from_secs(2),
            idle_timeout: Duration::from_secs(30 * 60),
        }
    }
}

/// Session-scoped authentication state.
///
/// Keeps the current token of every session in an in-memory map backed by a
/// slower, unreliable [`SessionTokenStore`]. The in-memory entry is written
/// first and is authoritative; the store is only consulted until a value has
/// been observed for the session. Store failures and timeouts are logged and
/// degrade to the cached value or to an anonymous identity. A failed read
/// leaves no entry behind.
///
/// Each entry carries a revision that changes on every explicit `set` or
/// `logout`, so a store read that completes after one of those never
/// overwrites the newer value. Idle entries are dropped by
/// [`SessionAuthState::prune_idle`] once the store agrees with them.
pub struct SessionAuthState<S>
where
    S: SessionTokenStore,
{
    store: Arc<S>,
    validator: TokenValidator,
    sessions: DashMap<SessionKey, SessionState>,
    changes: broadcast::Sender<AuthStateChanged>,
    revisions: AtomicU64,
    settings: SessionSettings,
}

impl<S> SessionAuthState<S>
where
    S: SessionTokenStore,
{
    /// Create session state on top of a token store.
    ///
    /// # Arguments
    /// * `store` - External per-session storage
    /// * `validator` - Validator sharing the issuer's signing key
    /// * `settings` - Storage key, store timeout and idle timeout
    pub fn new(store: Arc<S>, validator: TokenValidator, settings: SessionSettings) -> Self {
        let (changes, _) = broadcast::channel(CHANGE_CHANNEL_CAPACITY);

        Self {
            store,
            validator,
            sessions: DashMap::new(),
            changes,
            revisions: AtomicU64::new(1),
            settings,
        }
    }

    /// Current identity of a session.
    ///
    /// Never fails: any store or token problem yields an anonymous identity.
    pub async fn get(&self, session: &SessionKey) -> Identity {
        match self.resolve(session).await {
            Ok(identity) => identity,
            Err(e) => {
                tracing::debug!(session = %session, error = %e, "Session resolved as anonymous");
                Identity::anonymous()
            }
        }
    }

    /// Current identity of a session, reporting why it is missing.
    ///
    /// # Returns
    /// Authenticated identity, or anonymous when the session holds no token
    ///
    /// # Errors
    /// * `StoreUnavailable` - Store failed or timed out and nothing was cached
    /// * `Token` - The held token was rejected; the cache entry has been cleared
    pub async fn resolve(&self, session: &SessionKey) -> Result<Identity, SessionError> {
        let Some(token) = self.current_token(session).await? else {
            return Ok(Identity::anonymous());
        };

        match self.validator.decode(&token) {
            Ok(claims) => Ok(Identity::from_claims(claims)),
            Err(e) => {
                tracing::info!(session = %session, error = %e, "Clearing rejected session token");
                self.clear_token_if_current(session, &token);
                Err(SessionError::Token(e))
            }
        }
    }

    /// Store a freshly issued token for a session.
    ///
    /// The in-memory entry is updated before the store write starts, so
    /// concurrent `get` calls see the new identity immediately. A failed or
    /// timed-out store write is logged and otherwise ignored. A token that
    /// fails validation leaves the session anonymous.
    ///
    /// # Returns
    /// Identity subscribers were notified with
    pub async fn set(&self, session: &SessionKey, token: &str) -> Identity {
        let claims = match self.validator.decode(token) {
            Ok(claims) => claims,
            Err(e) => {
                tracing::warn!(session = %session, error = %e, "Refusing to store rejected token");
                let revision = self.replace(session, None);
                match self.remove_from_store(session).await {
                    Ok(()) => self.mark_persisted(session, revision),
                    Err(e) => {
                        tracing::warn!(session = %session, error = %e, "Failed to clear session store")
                    }
                }
                self.notify(session, Identity::anonymous());
                return Identity::anonymous();
            }
        };

        let revision = self.replace(session, Some(token.to_string()));

        let key = self.settings.storage_key.as_str();
        match self.bounded(self.store.set(session, key, token)).await {
            Ok(()) => self.mark_persisted(session, revision),
            Err(e) => tracing::warn!(
                session = %session,
                error = %e,
                "Failed to persist session token, keeping in-memory value"
            ),
        }

        let identity = Identity::from_claims(claims);
        self.notify(session, identity.clone());
        identity
    }

    /// Clear a session's token from memory and, best-effort, from the store.
    pub async fn logout(&self, session: &SessionKey) {
        let revision = self.replace(session, None);

        match self.remove_from_store(session).await {
            Ok(()) => self.mark_persisted(session, revision),
            Err(e) => tracing::warn!(
                session = %session,
                error = %e,
                "Failed to clear session store, in-memory logout still applies"
            ),
        }

        self.notify(session, Identity::anonymous());
    }

    /// Status derived from the cache without touching the store.
    pub fn status(&self, session: &SessionKey) -> SessionStatus {
        let token = match self.sessions.get(session) {
            None => return SessionStatus::Unloaded,
            Some(state) if !state.loaded_from_store && state.cached_token.is_none() => {
                return SessionStatus::Unloaded
            }
            Some(state) => state.cached_token.clone(),
        };

        match token {
            Some(token) if self.validator.validate(&token).is_authenticated => {
                SessionStatus::Authenticated
            }
            _ => SessionStatus::Anonymous,
        }
    }

    /// Copy of the cached state of a session, if any.
    pub fn snapshot(&self, session: &SessionKey) -> Option<SessionState> {
        self.sessions.get(session).map(|state| state.clone())
    }

    /// Drop the cached entry of a finished session. The store is left untouched.
    pub fn end_session(&self, session: &SessionKey) {
        if self.sessions.remove(session).is_some() {
            tracing::debug!(session = %session, "Session cache entry dropped");
        }
    }

    /// Number of sessions with a cache entry.
    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }

    /// Subscribe to identity changes of all sessions.
    pub fn subscribe(&self) -> broadcast::Receiver<AuthStateChanged> {
        self.changes.subscribe()
    }

    /// Drop cache entries that have been idle for longer than the idle timeout.
    ///
    /// An idle entry whose last store write failed is written again first and
    /// kept if that fails too, so pruning never resurrects a logged-out token
    /// or forgets a login the store never saw.
    ///
    /// # Returns
    /// Number of entries dropped
    pub async fn prune_idle(&self) -> usize {
        let idle_timeout = self.settings.idle_timeout;
        let idle: Vec<(SessionKey, u64, bool, Option<String>)> = self
            .sessions
            .iter()
            .filter(|state| state.last_seen.elapsed() >= idle_timeout)
            .map(|state| {
                (
                    *state.key(),
                    state.revision,
                    state.persisted,
                    state.cached_token.clone(),
                )
            })
            .collect();

        let mut pruned = 0;
        for (session, revision, persisted, token) in idle {
            if !persisted {
                if let Err(e) = self.sync_to_store(&session, token.as_deref()).await {
                    tracing::debug!(session = %session, error = %e, "Keeping idle session until the store accepts it");
                    continue;
                }
            }

            let removed = self.sessions.remove_if(&session, |_, state| {
                state.revision == revision && state.last_seen.elapsed() >= idle_timeout
            });
            if removed.is_some() {
                pruned += 1;
            }
        }

        if pruned > 0 {
            tracing::debug!(pruned, remaining = self.sessions.len(), "Pruned idle sessions");
        }
        pruned
    }

    async fn current_token(&self, session: &SessionKey) -> Result<Option<String>, SessionError> {
        if let Some(mut state) = self.sessions.get_mut(session) {
            state.last_seen = Instant::now();
            if state.loaded_from_store {
                return Ok(state.cached_token.clone());
            }
        }

        let key = self.settings.storage_key.as_str();
        match self.bounded(self.store.get(session, key)).await {
            Ok(stored) => {
                let stored = stored.filter(|token| !token.trim().is_empty());
                match self.sessions.entry(*session) {
                    Entry::Vacant(vacant) => {
                        let mut state = SessionState::new(*session);
                        state.cached_token = stored.clone();
                        state.loaded_from_store = true;
                        vacant.insert(state);
                        Ok(stored)
                    }
                    Entry::Occupied(occupied) => {
                        tracing::debug!(session = %session, "Discarding store read superseded by a newer value");
                        Ok(occupied.get().cached_token.clone())
                    }
                }
            }
            Err(e) => {
                tracing::warn!(session = %session, error = %e, "Session store read failed");
                let cached = self
                    .sessions
                    .get(session)
                    .and_then(|state| state.cached_token.clone());
                match cached {
                    Some(token) => Ok(Some(token)),
                    None => Err(SessionError::StoreUnavailable(e)),
                }
            }
        }
    }

    fn replace(&self, session: &SessionKey, token: Option<String>) -> u64 {
        let revision = self.next_revision();
        let mut state = self
            .sessions
            .entry(*session)
            .or_insert_with(|| SessionState::new(*session));
        state.cached_token = token;
        state.loaded_from_store = true;
        state.persisted = false;
        state.revision = revision;
        state.last_seen = Instant::now();
        revision
    }

    fn mark_persisted(&self, session: &SessionKey, revision: u64) {
        if let Some(mut state) = self.sessions.get_mut(session) {
            if state.revision == revision {
                state.persisted = true;
            }
        }
    }

    fn clear_token_if_current(&self, session: &SessionKey, token: &str) {
        let revision = self.next_revision();
        if let Some(mut state) = self.sessions.get_mut(session) {
            if state.cached_token.as_deref() == Some(token) {
                state.cached_token = None;
                state.loaded_from_store = true;
                state.revision = revision;
            }
        }
    }

    async fn sync_to_store(&self, session: &SessionKey, token: Option<&str>) -> Result<(), StoreError> {
        match token {
            Some(token) if self.validator.validate(token).is_authenticated => {
                let key = self.settings.storage_key.as_str();
                self.bounded(self.store.set(session, key, token)).await
            }
            _ => self.remove_from_store(session).await,
        }
    }

    async fn remove_from_store(&self, session: &SessionKey) -> Result<(), StoreError> {
        let key = self.settings.storage_key.as_str();
        self.bounded(self.store.remove(session, key)).await
    }

    async fn bounded<T>(
        &self,
        call: impl Future<Output = Result<T, StoreError>>,
    ) -> Result<T, StoreError> {
        tokio::time::timeout(self.settings.store_timeout, call)
            .await
            .unwrap_or(Err(StoreError::Timeout(self.settings.store_timeout)))
    }

    fn notify(&self, session: &SessionKey, identity: Identity) {
        let change = AuthStateChanged {
            session: *session,
            identity,
        };
        if self.changes.send(change).is_err() {
            tracing::trace!(session = %session, "No subscribers for session change");
        }
    }

    fn next_revision(&self) -> u64 {
        self.revisions.fetch_add(1, Ordering::Relaxed)
    }
}

/// Run [`SessionAuthState::prune_idle`] every `every` until the state is dropped.
pub fn spawn_idle_pruner<S>(sessions: &Arc<SessionAuthState<S>>, every: Duration) -> JoinHandle<()>
where
    S: SessionTokenStore,
{
    let sessions = Arc::downgrade(sessions);
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        ticker.tick().await;

        loop {
            ticker.tick().await;
            let Some(sessions) = sessions.upgrade() else {
                tracing::debug!("Session state dropped, stopping idle pruner");
                return;
            };
            sessions.prune_idle().await;
        }
    })
}
