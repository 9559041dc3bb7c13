use std::time::Duration;

use auth::TokenError;
use thiserror::Error;

/// Error for SessionKey parsing failures
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SessionKeyError {
    #[error("Invalid session id: {0}")]
    InvalidFormat(String),
}

/// Error raised by a session token store.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("Session store is unavailable: {0}")]
    Unavailable(String),

    #[error("Session store call timed out after {0:?}")]
    Timeout(Duration),

    #[error("Session store operation failed: {0}")]
    Failed(String),
}

/// Reason a session resolved to no identity.
///
/// Callers that only need an identity use `SessionAuthState::get`, which maps
/// every variant to an anonymous identity.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SessionError {
    #[error("Session store unavailable and nothing cached: {0}")]
    StoreUnavailable(#[from] StoreError),

    #[error("Session token rejected: {0}")]
    Token(#[from] TokenError),
}
