use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use auth::Identity;
use chrono::DateTime;
use chrono::Utc;
use uuid::Uuid;

use crate::credential::errors::CredentialError;
use crate::credential::errors::EmailError;
use crate::credential::errors::PasswordPolicyError;
use crate::credential::errors::UserIdError;

/// Role assigned to accounts that were not given one explicitly.
pub const DEFAULT_ROLE: &str = "User";

/// Stored login credentials of one account.
///
/// The password hash is never the raw password and is only replaced through
/// an explicit password change or a work-factor upgrade at login.
#[derive(Debug, Clone)]
pub struct CredentialRecord {
    pub user_id: UserId,
    pub email: EmailAddress,
    pub password_hash: String,
    pub display_name: Option<String>,
    pub role: String,
    pub created_at: DateTime<Utc>,
}

impl CredentialRecord {
    /// Name shown for the account; falls back to the email address.
    pub fn name(&self) -> &str {
        self.display_name
            .as_deref()
            .filter(|name| !name.trim().is_empty())
            .unwrap_or(self.email.as_str())
    }

    /// Claims embedded in tokens issued for this account.
    pub fn claims(&self) -> BTreeMap<String, String> {
        BTreeMap::from([
            ("name".to_string(), self.name().to_string()),
            ("email".to_string(), self.email.as_str().to_string()),
            ("role".to_string(), self.role.clone()),
        ])
    }
}

/// User unique identifier type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct UserId(pub Uuid);

impl UserId {
    /// Generate a new random user ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Parse a user ID from string.
    ///
    /// # Errors
    /// * `InvalidFormat` - String is not a valid UUID
    pub fn from_string(s: &str) -> Result<Self, UserIdError> {
        Uuid::parse_str(s)
            .map(UserId)
            .map_err(|e| UserIdError::InvalidFormat(e.to_string()))
    }
}

impl Default for UserId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Email address type
///
/// Validated with an RFC 5322 parser and normalized to trimmed lowercase so
/// lookups are case-insensitive.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EmailAddress(String);

impl EmailAddress {
    /// Create a new validated email address.
    ///
    /// # Errors
    /// * `InvalidFormat` - Email does not conform to RFC 5322
    pub fn new(email: &str) -> Result<Self, EmailError> {
        let normalized = email.trim().to_lowercase();
        email_address::EmailAddress::from_str(&normalized)
            .map(|_| EmailAddress(normalized))
            .map_err(|e| EmailError::InvalidFormat(e.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EmailAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// A new password that passed the input policy.
///
/// The inner value is the plaintext and is only handed to the hasher.
pub struct NewPassword(String);

impl NewPassword {
    pub const MIN_LENGTH: usize = 8;

    /// Validate a new password against its confirmation.
    ///
    /// # Errors
    /// * `Empty` - Password is blank
    /// * `TooShort` - Fewer than 8 characters
    /// * `Mismatch` - Confirmation differs from the password
    pub fn new(password: String, confirmation: &str) -> Result<Self, PasswordPolicyError> {
        if password.trim().is_empty() {
            return Err(PasswordPolicyError::Empty);
        }

        let length = password.chars().count();
        if length < Self::MIN_LENGTH {
            return Err(PasswordPolicyError::TooShort {
                min: Self::MIN_LENGTH,
                actual: length,
            });
        }

        if password != confirmation {
            return Err(PasswordPolicyError::Mismatch);
        }

        Ok(Self(password))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for NewPassword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("NewPassword(..)")
    }
}

/// Command to log in with an email and password
pub struct LoginCommand {
    pub email: String,
    pub password: String,
}

impl LoginCommand {
    /// # Errors
    /// * `MissingCredentials` - Email or password is blank
    pub fn new(email: String, password: String) -> Result<Self, CredentialError> {
        if email.trim().is_empty() || password.is_empty() {
            return Err(CredentialError::MissingCredentials);
        }
        Ok(Self { email, password })
    }
}

impl fmt::Debug for LoginCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoginCommand")
            .field("email", &self.email)
            .finish_non_exhaustive()
    }
}

/// Command to register a new account with domain types
#[derive(Debug)]
pub struct RegisterCommand {
    pub email: EmailAddress,
    pub password: NewPassword,
    pub display_name: Option<String>,
}

/// Command to replace the password of an authenticated account
pub struct ChangePasswordCommand {
    pub current_password: String,
    pub new_password: NewPassword,
}

impl fmt::Debug for ChangePasswordCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ChangePasswordCommand(..)")
    }
}

/// Result of a successful login
#[derive(Debug, Clone)]
pub struct LoginOutcome {
    pub identity: Identity,
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(display_name: Option<&str>) -> CredentialRecord {
        CredentialRecord {
            user_id: UserId::new(),
            email: EmailAddress::new("user@example.com").unwrap(),
            password_hash: "10000.c2FsdA==.a2V5".to_string(),
            display_name: display_name.map(str::to_string),
            role: DEFAULT_ROLE.to_string(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_email_is_normalized() {
        let email = EmailAddress::new("  User@Example.COM ").unwrap();
        assert_eq!(email.as_str(), "user@example.com");
    }

    #[test]
    fn test_email_rejects_garbage() {
        assert!(EmailAddress::new("not an email").is_err());
    }

    #[test]
    fn test_new_password_policy() {
        assert_eq!(
            NewPassword::new("".to_string(), "").unwrap_err(),
            PasswordPolicyError::Empty
        );
        assert_eq!(
            NewPassword::new("short".to_string(), "short").unwrap_err(),
            PasswordPolicyError::TooShort { min: 8, actual: 5 }
        );
        assert_eq!(
            NewPassword::new("password123".to_string(), "password124").unwrap_err(),
            PasswordPolicyError::Mismatch
        );
        assert!(NewPassword::new("password123".to_string(), "password123").is_ok());
    }

    #[test]
    fn test_login_command_requires_both_fields() {
        assert!(matches!(
            LoginCommand::new(" ".to_string(), "secret".to_string()),
            Err(CredentialError::MissingCredentials)
        ));
        assert!(matches!(
            LoginCommand::new("user@example.com".to_string(), String::new()),
            Err(CredentialError::MissingCredentials)
        ));
    }

    #[test]
    fn test_claims_fall_back_to_email_for_name() {
        let claims = record(None).claims();
        assert_eq!(claims["name"], "user@example.com");
        assert_eq!(claims["email"], "user@example.com");
        assert_eq!(claims["role"], "User");

        let claims = record(Some("Ada Lovelace")).claims();
        assert_eq!(claims["name"], "Ada Lovelace");
    }

    #[test]
    fn test_debug_output_hides_passwords() {
        let command = LoginCommand::new("user@example.com".to_string(), "hunter22".to_string())
            .unwrap();
        assert!(!format!("{command:?}").contains("hunter22"));

        let password = NewPassword::new("hunter2222".to_string(), "hunter2222").unwrap();
        assert!(!format!("{password:?}").contains("hunter2222"));
    }
}
