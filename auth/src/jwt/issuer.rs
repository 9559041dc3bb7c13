use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::DateTime;
use chrono::Duration;
use chrono::Utc;

use super::claims::TokenClaims;
use super::claims::NAME_CLAIM;
use super::claims::RESERVED_CLAIMS;
use super::claims::ROLE_CLAIM;
use super::errors::TokenError;
use super::handler::JwtHandler;

/// Default token lifetime.
pub const DEFAULT_TOKEN_LIFETIME_HOURS: i64 = 8;

/// Builds and signs bearer tokens.
#[derive(Clone)]
pub struct TokenIssuer {
    handler: Arc<JwtHandler>,
    default_lifetime: Duration,
}

impl TokenIssuer {
    /// Create a new issuer.
    ///
    /// # Arguments
    /// * `handler` - Signing handler shared with the validator
    /// * `default_lifetime` - Lifetime used by [`TokenIssuer::issue_default`]
    pub fn new(handler: Arc<JwtHandler>, default_lifetime: Duration) -> Self {
        Self {
            handler,
            default_lifetime,
        }
    }

    pub fn default_lifetime(&self) -> Duration {
        self.default_lifetime
    }

    /// Issue a token valid from now for `ttl`.
    ///
    /// # Arguments
    /// * `subject` - Subject identifier
    /// * `claims` - Claims to embed; must contain non-empty `name` and `role`
    /// * `ttl` - Token lifetime
    ///
    /// # Returns
    /// Compact signed token
    ///
    /// # Errors
    /// * `MissingClaim` - Subject, name or role missing
    /// * `ReservedClaim` - Caller supplied a claim managed by the issuer
    /// * `InvalidLifetime` - `ttl` shorter than one second
    /// * `EncodingFailed` - Signing failed
    pub fn issue(
        &self,
        subject: &str,
        claims: &BTreeMap<String, String>,
        ttl: Duration,
    ) -> Result<String, TokenError> {
        self.issue_at(subject, claims, ttl, Utc::now())
    }

    /// Issue a token with the default lifetime.
    pub fn issue_default(
        &self,
        subject: &str,
        claims: &BTreeMap<String, String>,
    ) -> Result<String, TokenError> {
        self.issue(subject, claims, self.default_lifetime)
    }

    /// Issue a token as of `now`.
    ///
    /// Identical inputs produce identical tokens.
    pub fn issue_at(
        &self,
        subject: &str,
        claims: &BTreeMap<String, String>,
        ttl: Duration,
        now: DateTime<Utc>,
    ) -> Result<String, TokenError> {
        if ttl < Duration::seconds(1) {
            return Err(TokenError::InvalidLifetime);
        }

        if subject.trim().is_empty() {
            return Err(TokenError::MissingClaim("sub".to_string()));
        }

        if let Some(reserved) = RESERVED_CLAIMS.iter().find(|key| claims.contains_key(**key)) {
            return Err(TokenError::ReservedClaim(reserved.to_string()));
        }

        for required in [NAME_CLAIM, ROLE_CLAIM] {
            if claims.get(required).map_or(true, |v| v.trim().is_empty()) {
                return Err(TokenError::MissingClaim(required.to_string()));
            }
        }

        let mut token_claims = TokenClaims::from_map(subject, claims);
        token_claims.iat = now.timestamp();
        token_claims.exp = now
            .checked_add_signed(ttl)
            .ok_or(TokenError::InvalidLifetime)?
            .timestamp();
        token_claims.iss = Some(self.handler.issuer().to_string());
        token_claims.aud = Some(self.handler.audience().to_string());

        self.handler.encode(&token_claims)
    }
}
