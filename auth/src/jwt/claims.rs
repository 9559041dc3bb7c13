use std::collections::BTreeMap;

use serde::Deserialize;
use serde::Serialize;

/// Claim names carried in fixed fields rather than the extension map.
pub const NAME_CLAIM: &str = "name";
pub const EMAIL_CLAIM: &str = "email";
pub const ROLE_CLAIM: &str = "role";

/// Claim names managed by the issuer.
pub const RESERVED_CLAIMS: [&str; 5] = ["sub", "iat", "exp", "iss", "aud"];

/// Identity claims carried in a signed token.
///
/// Known claims are fixed fields; anything else travels in `extra`, which is
/// flattened into the payload. `extra` is ordered so that encoding the same
/// claims always produces the same payload bytes.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TokenClaims {
    /// Subject (user identifier)
    #[serde(default)]
    pub sub: String,

    /// Display name
    #[serde(default)]
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,

    #[serde(default)]
    pub role: String,

    /// Issued at (Unix timestamp)
    #[serde(default)]
    pub iat: i64,

    /// Expiration time (Unix timestamp)
    pub exp: i64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iss: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aud: Option<String>,

    /// Additional custom claims
    #[serde(flatten)]
    pub extra: BTreeMap<String, String>,
}

impl TokenClaims {
    /// Build claims from a subject and a free-form claim map.
    ///
    /// `name`, `email` and `role` entries are moved into their fixed fields;
    /// everything else lands in `extra`. Timing and issuer fields are left
    /// zeroed for the issuer to fill in.
    ///
    /// # Arguments
    /// * `subject` - Subject identifier
    /// * `claims` - Claim map supplied by the caller
    pub fn from_map(subject: impl ToString, claims: &BTreeMap<String, String>) -> Self {
        let mut extra = claims.clone();
        let name = extra.remove(NAME_CLAIM).unwrap_or_default();
        let email = extra.remove(EMAIL_CLAIM);
        let role = extra.remove(ROLE_CLAIM).unwrap_or_default();

        Self {
            sub: subject.to_string(),
            name,
            email,
            role,
            iat: 0,
            exp: 0,
            iss: None,
            aud: None,
            extra,
        }
    }

    /// Claim set without subject, timing, issuer or audience fields.
    pub fn to_map(&self) -> BTreeMap<String, String> {
        let mut claims = self.extra.clone();
        if !self.name.is_empty() {
            claims.insert(NAME_CLAIM.to_string(), self.name.clone());
        }
        if let Some(email) = &self.email {
            claims.insert(EMAIL_CLAIM.to_string(), email.clone());
        }
        if !self.role.is_empty() {
            claims.insert(ROLE_CLAIM.to_string(), self.role.clone());
        }
        claims
    }

    /// Check if token is expired.
    ///
    /// A token stops being valid at the instant `exp` is reached.
    pub fn is_expired(&self, current_timestamp: i64) -> bool {
        current_timestamp >= self.exp
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_map() -> BTreeMap<String, String> {
        BTreeMap::from([
            ("name".to_string(), "Alice Dancer".to_string()),
            ("email".to_string(), "alice@example.com".to_string()),
            ("role".to_string(), "Judge".to_string()),
            ("school".to_string(), "Studio 54".to_string()),
        ])
    }

    #[test]
    fn test_from_map_lifts_known_claims() {
        let claims = TokenClaims::from_map("42", &sample_map());

        assert_eq!(claims.sub, "42");
        assert_eq!(claims.name, "Alice Dancer");
        assert_eq!(claims.email.as_deref(), Some("alice@example.com"));
        assert_eq!(claims.role, "Judge");
        assert_eq!(claims.extra.len(), 1);
        assert_eq!(claims.extra.get("school").map(String::as_str), Some("Studio 54"));
    }

    #[test]
    fn test_to_map_restores_input() {
        let input = sample_map();
        let claims = TokenClaims::from_map("42", &input);

        assert_eq!(claims.to_map(), input);
    }

    #[test]
    fn test_extra_claims_are_flattened() {
        let mut claims = TokenClaims::from_map("42", &sample_map());
        claims.exp = 100;

        let json = serde_json::to_value(&claims).unwrap();
        assert_eq!(json["school"], "Studio 54");
        assert_eq!(json["sub"], "42");
        assert!(json.get("extra").is_none());
        assert!(json.get("iss").is_none());
    }

    #[test]
    fn test_serialization_is_deterministic() {
        let mut map = BTreeMap::new();
        for key in ["zeta", "alpha", "mid", "beta"] {
            map.insert(key.to_string(), key.to_uppercase());
        }
        map.insert("name".to_string(), "n".to_string());
        map.insert("role".to_string(), "r".to_string());

        let first = serde_json::to_string(&TokenClaims::from_map("1", &map)).unwrap();
        let second = serde_json::to_string(&TokenClaims::from_map("1", &map.clone())).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_is_expired() {
        let claims = TokenClaims {
            exp: 1000,
            ..TokenClaims::from_map("1", &BTreeMap::new())
        };

        assert!(!claims.is_expired(999));
        assert!(claims.is_expired(1000));
        assert!(claims.is_expired(1001));
    }

    #[test]
    fn test_missing_subject_deserializes_empty() {
        let claims: TokenClaims = serde_json::from_str(r#"{"exp": 10, "name": "x"}"#).unwrap();
        assert!(claims.sub.is_empty());
    }
}
