use thiserror::Error;

/// Error type for password operations.
///
/// Verification never produces an error: a stored hash that cannot be parsed
/// simply does not match.
#[derive(Debug, Clone, Error)]
pub enum PasswordError {
    #[error("Secure random source unavailable: {0}")]
    RandomnessUnavailable(String),
}
