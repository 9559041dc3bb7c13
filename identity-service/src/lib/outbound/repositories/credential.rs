use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::credential::errors::CredentialError;
use crate::credential::models::CredentialRecord;
use crate::credential::models::EmailAddress;
use crate::credential::models::UserId;
use crate::credential::ports::CredentialRepository;

/// Credential records kept in process memory.
///
/// Enforces one record per normalized email the way a unique index would.
#[derive(Default)]
pub struct InMemoryCredentialRepository {
    records: RwLock<HashMap<UserId, CredentialRecord>>,
}

impl InMemoryCredentialRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CredentialRepository for InMemoryCredentialRepository {
    async fn find_by_email(
        &self,
        email: &EmailAddress,
    ) -> Result<Option<CredentialRecord>, CredentialError> {
        let records = self.records.read().await;
        Ok(records
            .values()
            .find(|record| record.email == *email)
            .cloned())
    }

    async fn find_by_id(&self, id: &UserId) -> Result<Option<CredentialRecord>, CredentialError> {
        Ok(self.records.read().await.get(id).cloned())
    }

    async fn create(&self, record: CredentialRecord) -> Result<CredentialRecord, CredentialError> {
        let mut records = self.records.write().await;

        if records.values().any(|existing| existing.email == record.email) {
            return Err(CredentialError::EmailAlreadyExists(
                record.email.as_str().to_string(),
            ));
        }

        records.insert(record.user_id, record.clone());
        Ok(record)
    }

    async fn update_password_hash(
        &self,
        id: &UserId,
        password_hash: &str,
    ) -> Result<(), CredentialError> {
        let mut records = self.records.write().await;
        let record = records
            .get_mut(id)
            .ok_or(CredentialError::NotFound(id.to_string()))?;
        record.password_hash = password_hash.to_string();
        Ok(())
    }
}
