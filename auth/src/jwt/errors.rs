use thiserror::Error;

/// Error type for token operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TokenError {
    #[error("Failed to encode token: {0}")]
    EncodingFailed(String),

    #[error("Token is malformed: {0}")]
    MalformedToken(String),

    #[error("Token is expired")]
    ExpiredToken,

    #[error("Token has no subject")]
    MissingSubject,

    #[error("Missing required claim: {0}")]
    MissingClaim(String),

    #[error("Claim is reserved and cannot be supplied: {0}")]
    ReservedClaim(String),

    #[error("Token lifetime must be positive")]
    InvalidLifetime,
}
