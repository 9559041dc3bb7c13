use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::DateTime;
use chrono::Duration;
use chrono::Utc;

use crate::identity::Identity;
use crate::jwt::issuer::DEFAULT_TOKEN_LIFETIME_HOURS;
use crate::jwt::JwtHandler;
use crate::jwt::TokenError;
use crate::jwt::TokenIssuer;
use crate::jwt::TokenValidator;
use crate::password::PasswordError;
use crate::password::PasswordHasher;

/// Authentication coordinator combining password verification and token issuance.
///
/// One instance is built at startup from the process-wide signing secret and
/// shared behind an `Arc`.
pub struct Authenticator {
    password_hasher: PasswordHasher,
    issuer: TokenIssuer,
    validator: TokenValidator,
}

/// Token settings shared by issuer and validator.
#[derive(Debug, Clone)]
pub struct TokenOptions {
    pub issuer: String,
    pub audience: String,
    pub lifetime: Duration,
}

impl Default for TokenOptions {
    fn default() -> Self {
        Self {
            issuer: "identity-service".to_string(),
            audience: "identity-client".to_string(),
            lifetime: Duration::hours(DEFAULT_TOKEN_LIFETIME_HOURS),
        }
    }
}

/// Result of successful authentication.
#[derive(Debug, Clone)]
pub struct AuthenticationResult {
    /// Signed bearer token
    pub access_token: String,
    pub expires_at: DateTime<Utc>,
}

/// Authentication operation errors.
#[derive(Debug, thiserror::Error)]
pub enum AuthenticationError {
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Password error: {0}")]
    PasswordError(#[from] PasswordError),

    #[error("Token error: {0}")]
    TokenError(#[from] TokenError),
}

impl Authenticator {
    /// Create a new authenticator.
    ///
    /// # Arguments
    /// * `secret` - Secret key for token signing
    /// * `options` - Issuer, audience and lifetime of issued tokens
    ///
    /// Passwords are hashed with the default work factor until
    /// [`Authenticator::with_password_iterations`] raises it.
    pub fn new(secret: &[u8], options: TokenOptions) -> Self {
        let handler = Arc::new(JwtHandler::new(secret, options.issuer, options.audience));

        Self {
            password_hasher: PasswordHasher::new(),
            issuer: TokenIssuer::new(Arc::clone(&handler), options.lifetime),
            validator: TokenValidator::new(handler),
        }
    }

    /// Use `iterations` PBKDF2 rounds for new hashes (clamped to the minimum).
    pub fn with_password_iterations(mut self, iterations: u32) -> Self {
        self.password_hasher = PasswordHasher::with_iterations(iterations);
        self
    }

    /// Hash a password for storage.
    ///
    /// # Errors
    /// * `RandomnessUnavailable` - Salt generation failed
    pub fn hash_password(&self, password: &str) -> Result<String, PasswordError> {
        self.password_hasher.hash(password)
    }

    pub fn verify_password(&self, password: &str, stored_hash: &str) -> bool {
        self.password_hasher.verify(password, stored_hash)
    }

    /// Burn one verification for an account that does not exist. Always false.
    pub fn verify_absent_password(&self, password: &str) -> bool {
        self.password_hasher.verify_absent(password)
    }

    /// Whether a stored hash was produced with a weaker work factor.
    pub fn needs_rehash(&self, stored_hash: &str) -> bool {
        self.password_hasher.needs_rehash(stored_hash)
    }

    /// Verify credentials and issue a token.
    ///
    /// # Arguments
    /// * `password` - Plaintext password to verify
    /// * `stored_hash` - Stored password hash
    /// * `subject` - Subject identifier for the token
    /// * `claims` - Claims to embed in the token
    ///
    /// # Errors
    /// * `InvalidCredentials` - Password does not match
    /// * `TokenError` - Token generation failed
    pub fn authenticate(
        &self,
        password: &str,
        stored_hash: &str,
        subject: &str,
        claims: &BTreeMap<String, String>,
    ) -> Result<AuthenticationResult, AuthenticationError> {
        if !self.password_hasher.verify(password, stored_hash) {
            return Err(AuthenticationError::InvalidCredentials);
        }

        Ok(self.issue_token(subject, claims)?)
    }

    /// Issue a token with the configured lifetime without checking a password.
    ///
    /// # Errors
    /// * `TokenError` - Claims rejected or signing failed
    pub fn issue_token(
        &self,
        subject: &str,
        claims: &BTreeMap<String, String>,
    ) -> Result<AuthenticationResult, TokenError> {
        let now = Utc::now();
        let lifetime = self.issuer.default_lifetime();
        let access_token = self.issuer.issue_at(subject, claims, lifetime, now)?;
        let expires_at = now
            .checked_add_signed(lifetime)
            .ok_or(TokenError::InvalidLifetime)?;

        Ok(AuthenticationResult {
            access_token,
            expires_at,
        })
    }

    /// Resolve a token to an identity; invalid tokens yield an anonymous identity.
    pub fn validate_token(&self, token: &str) -> Identity {
        self.validator.validate(token)
    }

    /// Validator sharing this authenticator's signing key.
    pub fn validator(&self) -> TokenValidator {
        self.validator.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn authenticator() -> Authenticator {
        Authenticator::new(b"test_secret_key_at_least_32_bytes!", TokenOptions::default())
    }

    fn claims() -> BTreeMap<String, String> {
        BTreeMap::from([
            ("name".to_string(), "user@example.com".to_string()),
            ("email".to_string(), "user@example.com".to_string()),
            ("role".to_string(), "User".to_string()),
        ])
    }

    #[test]
    fn test_authenticate_success() {
        let authenticator = authenticator();

        let password = "my_password";
        let hash = authenticator
            .hash_password(password)
            .expect("Failed to hash password");

        let result = authenticator
            .authenticate(password, &hash, "user123", &claims())
            .expect("Authentication failed");

        assert!(!result.access_token.is_empty());
        assert!(result.expires_at > Utc::now() + Duration::hours(7));

        let identity = authenticator.validate_token(&result.access_token);
        assert!(identity.is_authenticated);
        assert_eq!(identity.subject(), Some("user123"));
    }

    #[test]
    fn test_authenticate_invalid_password() {
        let authenticator = authenticator();

        let hash = authenticator
            .hash_password("my_password")
            .expect("Failed to hash password");

        let result = authenticator.authenticate("wrong_password", &hash, "user123", &claims());
        assert!(matches!(
            result,
            Err(AuthenticationError::InvalidCredentials)
        ));
    }

    #[test]
    fn test_authenticate_malformed_hash() {
        let authenticator = authenticator();

        let result = authenticator.authenticate("password", "not-a-hash", "user123", &claims());
        assert!(matches!(
            result,
            Err(AuthenticationError::InvalidCredentials)
        ));
    }

    #[test]
    fn test_validate_invalid_token() {
        let authenticator = authenticator();

        assert!(!authenticator.validate_token("invalid.token.here").is_authenticated);
    }

    #[test]
    fn test_password_iterations_are_separate_from_token_options() {
        let authenticator = authenticator().with_password_iterations(20_000);

        let hash = authenticator.hash_password("password").unwrap();
        assert!(hash.starts_with("20000."));
        assert!(!authenticator.needs_rehash(&hash));
        assert!(authenticator.needs_rehash(&PasswordHasher::new().hash("password").unwrap()));
    }

    #[test]
    fn test_unrepresentable_lifetime_is_an_error() {
        let options = TokenOptions {
            lifetime: Duration::days(100_000_000),
            ..TokenOptions::default()
        };
        let authenticator = Authenticator::new(b"test_secret_key_at_least_32_bytes!", options);

        assert!(matches!(
            authenticator.issue_token("7", &claims()),
            Err(TokenError::InvalidLifetime)
        ));
    }

    #[test]
    fn test_validator_shares_signing_key() {
        let authenticator = authenticator();
        let result = authenticator.issue_token("7", &claims()).unwrap();

        let validator = authenticator.validator();
        assert!(validator.validate(&result.access_token).is_authenticated);
    }
}
