use std::sync::Arc;

use chrono::DateTime;
use chrono::Utc;

use super::claims::TokenClaims;
use super::errors::TokenError;
use super::handler::JwtHandler;
use crate::identity::Identity;

/// Decodes bearer tokens into identities.
///
/// Expiry is compared strictly against the current clock with no leeway, so
/// clock skew between issuer and validator is not compensated. There is no
/// revocation list: a leaked token stays valid until it expires.
#[derive(Clone)]
pub struct TokenValidator {
    handler: Arc<JwtHandler>,
}

impl TokenValidator {
    pub fn new(handler: Arc<JwtHandler>) -> Self {
        Self { handler }
    }

    /// Decode and check a token against the current time.
    ///
    /// # Errors
    /// * `MalformedToken` - Not decodable or signature mismatch
    /// * `ExpiredToken` - Expiry reached
    /// * `MissingSubject` - No usable subject claim
    pub fn decode(&self, token: &str) -> Result<TokenClaims, TokenError> {
        self.decode_at(token, Utc::now())
    }

    /// Decode and check a token as of `now`.
    pub fn decode_at(&self, token: &str, now: DateTime<Utc>) -> Result<TokenClaims, TokenError> {
        let claims: TokenClaims = self.handler.decode(token.trim())?;

        if claims.is_expired(now.timestamp()) {
            return Err(TokenError::ExpiredToken);
        }

        if claims.sub.trim().is_empty() {
            return Err(TokenError::MissingSubject);
        }

        Ok(claims)
    }

    /// Resolve a token to an identity; failures yield an anonymous identity.
    pub fn validate(&self, token: &str) -> Identity {
        self.validate_at(token, Utc::now())
    }

    pub fn validate_at(&self, token: &str, now: DateTime<Utc>) -> Identity {
        match self.decode_at(token, now) {
            Ok(claims) => Identity::from_claims(claims),
            Err(e) => {
                tracing::debug!(error = %e, "Token rejected");
                Identity::anonymous()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use base64::engine::general_purpose::URL_SAFE_NO_PAD;
    use base64::Engine;
    use chrono::Duration;

    use super::*;
    use crate::jwt::TokenIssuer;

    const SECRET: &[u8] = b"test_secret_key_at_least_32_bytes!";

    fn handler() -> Arc<JwtHandler> {
        Arc::new(JwtHandler::new(SECRET, "identity-service", "identity-client"))
    }

    fn claims() -> BTreeMap<String, String> {
        BTreeMap::from([
            ("name".to_string(), "Alice".to_string()),
            ("email".to_string(), "user@example.com".to_string()),
            ("role".to_string(), "User".to_string()),
            ("FullName".to_string(), "Alice Dancer".to_string()),
        ])
    }

    fn pair() -> (TokenIssuer, TokenValidator) {
        let handler = handler();
        (
            TokenIssuer::new(Arc::clone(&handler), Duration::hours(8)),
            TokenValidator::new(handler),
        )
    }

    #[test]
    fn test_validate_issued_token() {
        let (issuer, validator) = pair();
        let token = issuer
            .issue("42", &claims(), Duration::hours(1))
            .expect("Failed to issue token");

        let identity = validator.validate(&token);

        assert!(identity.is_authenticated);
        assert_eq!(identity.subject(), Some("42"));
        assert_eq!(identity.name, "Alice");
        assert_eq!(identity.email.as_deref(), Some("user@example.com"));
        assert_eq!(identity.role, "User");
    }

    #[test]
    fn test_claims_round_trip() {
        let (issuer, validator) = pair();
        let input = claims();
        let token = issuer.issue("42", &input, Duration::hours(1)).unwrap();

        let decoded = validator.decode(&token).expect("Failed to decode token");

        assert_eq!(decoded.to_map(), input);
        assert_eq!(validator.validate(&token).claims(), input);
    }

    #[test]
    fn test_expired_token_is_rejected() {
        let (issuer, validator) = pair();
        let issued_at = Utc::now() - Duration::hours(2);
        let token = issuer
            .issue_at("42", &claims(), Duration::hours(1), issued_at)
            .unwrap();

        assert_eq!(validator.decode(&token), Err(TokenError::ExpiredToken));
        assert!(!validator.validate(&token).is_authenticated);
    }

    #[test]
    fn test_token_expires_exactly_at_exp() {
        let (issuer, validator) = pair();
        let now = Utc::now();
        let token = issuer
            .issue_at("42", &claims(), Duration::hours(1), now)
            .unwrap();

        let just_before = now + Duration::hours(1) - Duration::seconds(1);
        let at_expiry = now + Duration::hours(1);

        assert!(validator.validate_at(&token, just_before).is_authenticated);
        assert!(!validator.validate_at(&token, at_expiry).is_authenticated);
    }

    #[test]
    fn test_garbage_is_anonymous() {
        let (_, validator) = pair();

        for token in ["not-a-token", "", "a.b.c", "....", "invalid.token.here"] {
            assert!(!validator.validate(token).is_authenticated);
            assert!(matches!(
                validator.decode(token),
                Err(TokenError::MalformedToken(_))
            ));
        }
    }

    #[test]
    fn test_tampered_payload_is_rejected() {
        let (issuer, validator) = pair();
        let token = issuer.issue("42", &claims(), Duration::hours(1)).unwrap();
        let segments: Vec<&str> = token.split('.').collect();

        let payload = URL_SAFE_NO_PAD.decode(segments[1]).unwrap();
        let mut json: serde_json::Value = serde_json::from_slice(&payload).unwrap();
        json["role"] = serde_json::json!("Admin");
        let forged_payload = URL_SAFE_NO_PAD.encode(serde_json::to_vec(&json).unwrap());
        let forged = format!("{}.{}.{}", segments[0], forged_payload, segments[2]);

        assert!(matches!(
            validator.decode(&forged),
            Err(TokenError::MalformedToken(_))
        ));
    }

    #[test]
    fn test_token_without_subject_is_not_authenticated() {
        let handler = handler();
        let validator = TokenValidator::new(Arc::clone(&handler));
        let mut token_claims = TokenClaims::from_map("", &claims());
        token_claims.exp = (Utc::now() + Duration::hours(1)).timestamp();
        token_claims.iss = Some("identity-service".to_string());
        token_claims.aud = Some("identity-client".to_string());
        let token = handler.encode(&token_claims).unwrap();

        assert_eq!(validator.decode(&token), Err(TokenError::MissingSubject));
        assert!(!validator.validate(&token).is_authenticated);
    }

    #[test]
    fn test_token_from_other_key_is_rejected() {
        let (issuer, _) = pair();
        let other = TokenValidator::new(Arc::new(JwtHandler::new(
            b"another_secret_key_of_32_bytes_xx!",
            "identity-service",
            "identity-client",
        )));
        let token = issuer.issue("42", &claims(), Duration::hours(1)).unwrap();

        assert!(!other.validate(&token).is_authenticated);
    }
}
