use async_trait::async_trait;

use crate::session::errors::StoreError;
use crate::session::models::SessionKey;

/// Per-session key/value storage holding the bearer token between renders.
///
/// Implementations may fail or hang at any time (for example while a client
/// is being prerendered and has no storage yet); callers bound every call
/// with a timeout and never let these errors escape.
#[async_trait]
pub trait SessionTokenStore: Send + Sync + 'static {
    /// Read a value.
    ///
    /// # Returns
    /// Stored value, or None if nothing is stored under `key`
    ///
    /// # Errors
    /// * `Unavailable` - Storage cannot be reached from this context
    /// * `Failed` - Storage reported an error
    async fn get(&self, session: &SessionKey, key: &str) -> Result<Option<String>, StoreError>;

    /// Write a value, replacing any previous one.
    ///
    /// # Errors
    /// * `Unavailable` - Storage cannot be reached from this context
    /// * `Failed` - Storage reported an error
    async fn set(&self, session: &SessionKey, key: &str, value: &str) -> Result<(), StoreError>;

    /// Remove a value. Removing a missing key succeeds.
    ///
    /// # Errors
    /// * `Unavailable` - Storage cannot be reached from this context
    /// * `Failed` - Storage reported an error
    async fn remove(&self, session: &SessionKey, key: &str) -> Result<(), StoreError>;
}
