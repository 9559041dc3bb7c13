use async_trait::async_trait;
use auth::Identity;

use crate::credential::errors::CredentialError;
use crate::credential::models::ChangePasswordCommand;
use crate::credential::models::CredentialRecord;
use crate::credential::models::EmailAddress;
use crate::credential::models::LoginCommand;
use crate::credential::models::LoginOutcome;
use crate::credential::models::RegisterCommand;
use crate::credential::models::UserId;
use crate::session::models::SessionKey;

/// Port for login, logout and current-user queries.
#[async_trait]
pub trait AuthenticationServicePort: Send + Sync + 'static {
    /// Verify credentials, issue a token and attach it to the session.
    ///
    /// # Arguments
    /// * `session` - Session the login applies to
    /// * `command` - Email and plaintext password
    ///
    /// # Returns
    /// Identity, token and expiry of the new login
    ///
    /// # Errors
    /// * `InvalidCredentials` - Unknown email or wrong password (indistinguishable)
    /// * `Crypto` - Secure random source failed while upgrading the stored hash
    /// * `RepositoryError` - Credential store failed
    async fn login(
        &self,
        session: &SessionKey,
        command: LoginCommand,
    ) -> Result<LoginOutcome, CredentialError>;

    /// Clear the session's token. Succeeds even if the session never existed.
    async fn logout(&self, session: &SessionKey);

    /// Authenticated identity of a session.
    ///
    /// # Returns
    /// Identity, or None when the session is anonymous
    async fn current_user(&self, session: &SessionKey) -> Option<Identity>;

    /// Create a new account.
    ///
    /// # Returns
    /// Created credential record
    ///
    /// # Errors
    /// * `EmailAlreadyExists` - Email is already registered
    /// * `Crypto` - Secure random source failed
    /// * `RepositoryError` - Credential store failed
    async fn register(&self, command: RegisterCommand) -> Result<CredentialRecord, CredentialError>;

    /// Replace the password of an account after checking the current one.
    ///
    /// # Errors
    /// * `NotFound` - Account does not exist
    /// * `InvalidCredentials` - Current password does not match
    /// * `Crypto` - Secure random source failed
    /// * `RepositoryError` - Credential store failed
    async fn change_password(
        &self,
        user_id: &UserId,
        command: ChangePasswordCommand,
    ) -> Result<(), CredentialError>;
}

/// Persistence operations for credential records.
#[async_trait]
pub trait CredentialRepository: Send + Sync + 'static {
    /// Retrieve a record by normalized email.
    ///
    /// # Returns
    /// Optional record (None if not found)
    ///
    /// # Errors
    /// * `RepositoryError` - Store operation failed
    async fn find_by_email(
        &self,
        email: &EmailAddress,
    ) -> Result<Option<CredentialRecord>, CredentialError>;

    /// Retrieve a record by identifier.
    ///
    /// # Errors
    /// * `RepositoryError` - Store operation failed
    async fn find_by_id(&self, id: &UserId) -> Result<Option<CredentialRecord>, CredentialError>;

    /// Persist a new record.
    ///
    /// # Errors
    /// * `EmailAlreadyExists` - Email is already registered
    /// * `RepositoryError` - Store operation failed
    async fn create(&self, record: CredentialRecord) -> Result<CredentialRecord, CredentialError>;

    /// Replace the stored password hash of a record.
    ///
    /// # Errors
    /// * `NotFound` - Record does not exist
    /// * `RepositoryError` - Store operation failed
    async fn update_password_hash(
        &self,
        id: &UserId,
        password_hash: &str,
    ) -> Result<(), CredentialError>;
}
