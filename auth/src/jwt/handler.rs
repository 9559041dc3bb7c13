use jsonwebtoken::decode;
use jsonwebtoken::encode;
use jsonwebtoken::Algorithm;
use jsonwebtoken::DecodingKey;
use jsonwebtoken::EncodingKey;
use jsonwebtoken::Header;
use jsonwebtoken::Validation;
use serde::de::DeserializeOwned;
use serde::Serialize;

use super::errors::TokenError;

/// JWT token handler for encoding and decoding tokens.
///
/// Produces compact `header.payload.signature` tokens signed with HS256.
/// Issuer and audience are fixed per handler and checked on decode. Expiry is
/// deliberately not checked here; see [`crate::jwt::TokenValidator`].
pub struct JwtHandler {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    algorithm: Algorithm,
    issuer: String,
    audience: String,
}

impl JwtHandler {
    /// Create a new JWT handler with a secret key.
    ///
    /// # Arguments
    /// * `secret` - Secret key for signing tokens (should be stored securely)
    /// * `issuer` - Value written to and required in the `iss` claim
    /// * `audience` - Value written to and required in the `aud` claim
    ///
    /// # Security Notes
    /// - The secret should be at least 256 bits (32 bytes) for HS256
    /// - Store secrets in environment variables or secure vaults, never in code
    pub fn new(secret: &[u8], issuer: impl Into<String>, audience: impl Into<String>) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            algorithm: Algorithm::HS256,
            issuer: issuer.into(),
            audience: audience.into(),
        }
    }

    pub fn issuer(&self) -> &str {
        &self.issuer
    }

    pub fn audience(&self) -> &str {
        &self.audience
    }

    /// Encode claims into a JWT token.
    ///
    /// # Errors
    /// * `EncodingFailed` - Token encoding failed
    pub fn encode<T: Serialize>(&self, claims: &T) -> Result<String, TokenError> {
        let header = Header::new(self.algorithm);

        encode(&header, claims, &self.encoding_key)
            .map_err(|e| TokenError::EncodingFailed(e.to_string()))
    }

    /// Decode a JWT token and verify its signature, issuer and audience.
    ///
    /// # Errors
    /// * `MalformedToken` - Token is not well formed, has a bad signature, or
    ///   names another issuer or audience
    pub fn decode<T: DeserializeOwned>(&self, token: &str) -> Result<T, TokenError> {
        let mut validation = Validation::new(self.algorithm);
        validation.required_spec_claims.clear();
        validation.validate_exp = false;
        validation.leeway = 0;
        validation.set_issuer(&[self.issuer.as_str()]);
        validation.set_audience(&[self.audience.as_str()]);

        let token_data = decode::<T>(token, &self.decoding_key, &validation)
            .map_err(|e| TokenError::MalformedToken(e.to_string()))?;

        Ok(token_data.claims)
    }
}

#[cfg(test)]
mod tests {
    use serde::Deserialize;

    use super::*;

    #[derive(Debug, Serialize, Deserialize, PartialEq)]
    struct TestClaims {
        sub: String,
        role: String,
        iss: String,
        aud: String,
    }

    fn test_claims() -> TestClaims {
        TestClaims {
            sub: "user123".to_string(),
            role: "admin".to_string(),
            iss: "identity-service".to_string(),
            aud: "identity-client".to_string(),
        }
    }

    fn handler(secret: &[u8]) -> JwtHandler {
        JwtHandler::new(secret, "identity-service", "identity-client")
    }

    #[test]
    fn test_encode_and_decode() {
        let handler = handler(b"my_secret_key_at_least_32_bytes_long!");
        let claims = test_claims();

        let token = handler.encode(&claims).expect("Failed to encode token");
        assert_eq!(token.split('.').count(), 3);

        let decoded: TestClaims = handler.decode(&token).expect("Failed to decode token");
        assert_eq!(decoded, claims);
    }

    #[test]
    fn test_encoding_is_deterministic() {
        let handler = handler(b"my_secret_key_at_least_32_bytes_long!");

        let first = handler.encode(&test_claims()).unwrap();
        let second = handler.encode(&test_claims()).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_decode_invalid_token() {
        let handler = handler(b"my_secret_key_at_least_32_bytes_long!");

        let result = handler.decode::<TestClaims>("invalid.token.here");
        assert!(matches!(result, Err(TokenError::MalformedToken(_))));
    }

    #[test]
    fn test_decode_with_wrong_secret() {
        let handler1 = handler(b"secret1_at_least_32_bytes_long_key!");
        let handler2 = handler(b"secret2_at_least_32_bytes_long_key!");

        let token = handler1.encode(&test_claims()).expect("Failed to encode token");

        let result = handler2.decode::<TestClaims>(&token);
        assert!(matches!(result, Err(TokenError::MalformedToken(_))));
    }

    #[test]
    fn test_decode_rejects_foreign_audience() {
        let handler = handler(b"my_secret_key_at_least_32_bytes_long!");
        let mut claims = test_claims();
        claims.aud = "someone-else".to_string();

        let token = handler.encode(&claims).expect("Failed to encode token");
        assert!(handler.decode::<TestClaims>(&token).is_err());
    }

    #[test]
    fn test_decode_rejects_foreign_issuer() {
        let handler = handler(b"my_secret_key_at_least_32_bytes_long!");
        let mut claims = test_claims();
        claims.iss = "mallory".to_string();

        let token = handler.encode(&claims).expect("Failed to encode token");
        assert!(handler.decode::<TestClaims>(&token).is_err());
    }
}
