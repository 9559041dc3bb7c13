use std::collections::BTreeMap;

use chrono::DateTime;
use chrono::Utc;
use serde::Serialize;

use crate::jwt::TokenClaims;

/// Identity reconstructed from a bearer token.
///
/// `is_authenticated` holds only for tokens that decoded, carried a subject
/// and had not expired. Anonymous identities have every other field empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Identity {
    pub subject: String,
    pub name: String,
    pub email: Option<String>,
    pub role: String,
    pub issued_at: Option<DateTime<Utc>>,
    pub expires_at: Option<DateTime<Utc>>,
    pub extra: BTreeMap<String, String>,
    pub is_authenticated: bool,
}

impl Identity {
    pub fn anonymous() -> Self {
        Self {
            subject: String::new(),
            name: String::new(),
            email: None,
            role: String::new(),
            issued_at: None,
            expires_at: None,
            extra: BTreeMap::new(),
            is_authenticated: false,
        }
    }

    /// Build an authenticated identity from claims that already passed validation.
    pub fn from_claims(claims: TokenClaims) -> Self {
        Self {
            issued_at: DateTime::from_timestamp(claims.iat, 0),
            expires_at: DateTime::from_timestamp(claims.exp, 0),
            subject: claims.sub,
            name: claims.name,
            email: claims.email,
            role: claims.role,
            extra: claims.extra,
            is_authenticated: true,
        }
    }

    /// Subject when authenticated.
    pub fn subject(&self) -> Option<&str> {
        self.is_authenticated.then_some(self.subject.as_str())
    }

    /// Non-timing claim set: display name, email, role and extension claims.
    pub fn claims(&self) -> BTreeMap<String, String> {
        let mut claims = TokenClaims::from_map(&self.subject, &self.extra);
        claims.name = self.name.clone();
        claims.email = self.email.clone();
        claims.role = self.role.clone();
        claims.to_map()
    }
}

impl Default for Identity {
    fn default() -> Self {
        Self::anonymous()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_anonymous_identity() {
        let identity = Identity::anonymous();

        assert!(!identity.is_authenticated);
        assert!(identity.subject().is_none());
        assert!(identity.claims().is_empty());
    }

    #[test]
    fn test_from_claims() {
        let map = BTreeMap::from([
            ("name".to_string(), "Bob".to_string()),
            ("role".to_string(), "Admin".to_string()),
            ("school".to_string(), "North".to_string()),
        ]);
        let mut claims = TokenClaims::from_map("7", &map);
        claims.iat = 1_700_000_000;
        claims.exp = 1_700_028_800;

        let identity = Identity::from_claims(claims);

        assert!(identity.is_authenticated);
        assert_eq!(identity.subject(), Some("7"));
        assert_eq!(identity.role, "Admin");
        assert_eq!(identity.expires_at.unwrap().timestamp(), 1_700_028_800);
        assert_eq!(identity.claims(), map);
    }
}
