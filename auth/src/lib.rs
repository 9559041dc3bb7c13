//! Authentication primitives
//!
//! Provides the security building blocks used by the identity service:
//! - Password hashing (PBKDF2-HMAC-SHA256, iteration count embedded in the hash)
//! - Bearer token issuance and validation (HS256 JWT)
//! - Identity reconstruction from tokens
//! - Authentication coordination
//!
//! # Examples
//!
//! ## Password Hashing
//! ```
//! use auth::PasswordHasher;
//!
//! let hasher = PasswordHasher::new();
//! let hash = hasher.hash("my_password").unwrap();
//! assert!(hasher.verify("my_password", &hash));
//! assert!(!hasher.verify("not_my_password", &hash));
//! ```
//!
//! ## Tokens
//! ```
//! use std::collections::BTreeMap;
//! use std::sync::Arc;
//!
//! use auth::{JwtHandler, TokenIssuer, TokenValidator};
//! use chrono::Duration;
//!
//! let handler = Arc::new(JwtHandler::new(b"secret_key_at_least_32_bytes_long!", "issuer", "audience"));
//! let issuer = TokenIssuer::new(Arc::clone(&handler), Duration::hours(8));
//! let validator = TokenValidator::new(handler);
//!
//! let claims = BTreeMap::from([
//!     ("name".to_string(), "Alice".to_string()),
//!     ("role".to_string(), "User".to_string()),
//! ]);
//! let token = issuer.issue("user123", &claims, Duration::hours(1)).unwrap();
//! let identity = validator.validate(&token);
//! assert_eq!(identity.subject(), Some("user123"));
//! ```

pub mod authenticator;
pub mod identity;
pub mod jwt;
pub mod password;

// Re-export commonly used items
pub use authenticator::AuthenticationError;
pub use authenticator::AuthenticationResult;
pub use authenticator::Authenticator;
pub use authenticator::TokenOptions;
pub use identity::Identity;
pub use jwt::JwtHandler;
pub use jwt::TokenClaims;
pub use jwt::TokenError;
pub use jwt::TokenIssuer;
pub use jwt::TokenValidator;
pub use password::PasswordError;
pub use password::PasswordHasher;
