use std::sync::atomic::AtomicBool;
use std::sync::atomic::Ordering;

use async_trait::async_trait;
use dashmap::DashMap;

use crate::session::errors::StoreError;
use crate::session::models::SessionKey;
use crate::session::ports::SessionTokenStore;

/// Process-local session token store.
///
/// Stands in for client-side storage. Can be switched off to reproduce a
/// render phase in which the storage is not reachable.
pub struct InMemorySessionTokenStore {
    values: DashMap<(SessionKey, String), String>,
    available: AtomicBool,
}

impl InMemorySessionTokenStore {
    pub fn new() -> Self {
        Self {
            values: DashMap::new(),
            available: AtomicBool::new(true),
        }
    }

    /// Make every subsequent call succeed (`true`) or fail with `Unavailable`.
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
        tracing::debug!(available, "Session token store availability changed");
    }

    fn ensure_available(&self) -> Result<(), StoreError> {
        if self.available.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(StoreError::Unavailable(
                "storage is not accessible in this context".to_string(),
            ))
        }
    }
}

impl Default for InMemorySessionTokenStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SessionTokenStore for InMemorySessionTokenStore {
    async fn get(&self, session: &SessionKey, key: &str) -> Result<Option<String>, StoreError> {
        self.ensure_available()?;
        Ok(self
            .values
            .get(&(*session, key.to_string()))
            .map(|value| value.clone()))
    }

    async fn set(&self, session: &SessionKey, key: &str, value: &str) -> Result<(), StoreError> {
        self.ensure_available()?;
        self.values
            .insert((*session, key.to_string()), value.to_string());
        Ok(())
    }

    async fn remove(&self, session: &SessionKey, key: &str) -> Result<(), StoreError> {
        self.ensure_available()?;
        self.values.remove(&(*session, key.to_string()));
        Ok(())
    }
}
