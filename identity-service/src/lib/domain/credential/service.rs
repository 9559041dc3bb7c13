use std::sync::Arc;

use async_trait::async_trait;
use auth::Authenticator;
use auth::Identity;
use chrono::Utc;

use crate::credential::errors::CredentialError;
use crate::credential::models::ChangePasswordCommand;
use crate::credential::models::CredentialRecord;
use crate::credential::models::EmailAddress;
use crate::credential::models::LoginCommand;
use crate::credential::models::LoginOutcome;
use crate::credential::models::RegisterCommand;
use crate::credential::models::UserId;
use crate::credential::models::DEFAULT_ROLE;
use crate::credential::ports::AuthenticationServicePort;
use crate::credential::ports::CredentialRepository;
use crate::session::models::SessionKey;
use crate::session::ports::SessionTokenStore;
use crate::session::state::SessionAuthState;

/// Domain service implementation for authentication operations.
///
/// The only component that reads or writes credential records.
pub struct AuthenticationService<CR, ST>
where
    CR: CredentialRepository,
    ST: SessionTokenStore,
{
    repository: Arc<CR>,
    authenticator: Arc<Authenticator>,
    sessions: Arc<SessionAuthState<ST>>,
}

impl<CR, ST> AuthenticationService<CR, ST>
where
    CR: CredentialRepository,
    ST: SessionTokenStore,
{
    /// Create a new authentication service with injected dependencies.
    ///
    /// # Arguments
    /// * `repository` - Credential persistence implementation
    /// * `authenticator` - Hasher and token issuer sharing the signing key
    /// * `sessions` - Session-scoped token cache
    pub fn new(
        repository: Arc<CR>,
        authenticator: Arc<Authenticator>,
        sessions: Arc<SessionAuthState<ST>>,
    ) -> Self {
        Self {
            repository,
            authenticator,
            sessions,
        }
    }

    /// Re-hash with the configured work factor when the stored hash is weaker.
    ///
    /// Storing the new hash is best-effort; only a hashing failure is returned.
    async fn upgrade_hash_if_weak(
        &self,
        record: &CredentialRecord,
        password: &str,
    ) -> Result<(), CredentialError> {
        if !self.authenticator.needs_rehash(&record.password_hash) {
            return Ok(());
        }

        let password_hash = self.authenticator.hash_password(password)?;

        match self
            .repository
            .update_password_hash(&record.user_id, &password_hash)
            .await
        {
            Ok(()) => tracing::info!(user_id = %record.user_id, "Upgraded password hash work factor"),
            Err(e) => tracing::warn!(
                user_id = %record.user_id,
                error = %e,
                "Failed to store upgraded password hash"
            ),
        }

        Ok(())
    }
}

#[async_trait]
impl<CR, ST> AuthenticationServicePort for AuthenticationService<CR, ST>
where
    CR: CredentialRepository,
    ST: SessionTokenStore,
{
    async fn login(
        &self,
        session: &SessionKey,
        command: LoginCommand,
    ) -> Result<LoginOutcome, CredentialError> {
        // Malformed and unknown emails fail exactly like a wrong password
        let Ok(email) = EmailAddress::new(&command.email) else {
            tracing::debug!(session = %session, "Login rejected: malformed email");
            self.authenticator.verify_absent_password(&command.password);
            return Err(CredentialError::InvalidCredentials);
        };

        // Pay for a hash even without a record so response time does not reveal the account
        let Some(record) = self.repository.find_by_email(&email).await? else {
            tracing::debug!(session = %session, "Login rejected: unknown email");
            self.authenticator.verify_absent_password(&command.password);
            return Err(CredentialError::InvalidCredentials);
        };

        let result = self
            .authenticator
            .authenticate(
                &command.password,
                &record.password_hash,
                &record.user_id.to_string(),
                &record.claims(),
            )
            .map_err(|e| {
                tracing::debug!(session = %session, user_id = %record.user_id, "Login rejected: {}", e);
                CredentialError::from(e)
            })?;

        self.upgrade_hash_if_weak(&record, &command.password).await?;

        let identity = self.sessions.set(session, &result.access_token).await;

        tracing::info!(session = %session, user_id = %record.user_id, "User logged in");

        Ok(LoginOutcome {
            identity,
            token: result.access_token,
            expires_at: result.expires_at,
        })
    }

    async fn logout(&self, session: &SessionKey) {
        self.sessions.logout(session).await;
        tracing::info!(session = %session, "User logged out");
    }

    async fn current_user(&self, session: &SessionKey) -> Option<Identity> {
        let identity = self.sessions.get(session).await;
        identity.is_authenticated.then_some(identity)
    }

    async fn register(&self, command: RegisterCommand) -> Result<CredentialRecord, CredentialError> {
        if self.repository.find_by_email(&command.email).await?.is_some() {
            return Err(CredentialError::EmailAlreadyExists(
                command.email.as_str().to_string(),
            ));
        }

        let password_hash = self.authenticator.hash_password(command.password.as_str())?;

        let record = CredentialRecord {
            user_id: UserId::new(),
            email: command.email,
            password_hash,
            display_name: command
                .display_name
                .map(|name| name.trim().to_string())
                .filter(|name| !name.is_empty()),
            role: DEFAULT_ROLE.to_string(),
            created_at: Utc::now(),
        };

        let created = self.repository.create(record).await?;
        tracing::info!(user_id = %created.user_id, "Account registered");

        Ok(created)
    }

    async fn change_password(
        &self,
        user_id: &UserId,
        command: ChangePasswordCommand,
    ) -> Result<(), CredentialError> {
        let record = self
            .repository
            .find_by_id(user_id)
            .await?
            .ok_or(CredentialError::NotFound(user_id.to_string()))?;

        if !self
            .authenticator
            .verify_password(&command.current_password, &record.password_hash)
        {
            tracing::debug!(user_id = %user_id, "Password change rejected: wrong current password");
            return Err(CredentialError::InvalidCredentials);
        }

        let password_hash = self
            .authenticator
            .hash_password(command.new_password.as_str())?;
        self.repository
            .update_password_hash(user_id, &password_hash)
            .await?;

        tracing::info!(user_id = %user_id, "Password changed");
        Ok(())
    }
}
