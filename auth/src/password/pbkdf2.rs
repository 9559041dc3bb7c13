use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use rand::rngs::OsRng;
use rand::TryRngCore;
use sha2::Sha256;

use super::errors::PasswordError;

const SALT_LENGTH: usize = 16;
const KEY_LENGTH: usize = 32;

/// Lowest accepted work factor.
pub const MIN_ITERATIONS: u32 = 10_000;

/// Stored hashes claiming more rounds than this are rejected outright.
const MAX_ITERATIONS: u32 = 10_000_000;

const ABSENT_SALT: [u8; SALT_LENGTH] = [0x5a; SALT_LENGTH];

/// Password hashing implementation.
///
/// Derives a 32-byte key with PBKDF2-HMAC-SHA256 over a random 16-byte salt.
/// Stored hashes have the form `{iterations}.{salt}.{key}` with salt and key
/// in standard base64, so the work factor travels with each hash and old
/// hashes keep verifying after it is raised.
#[derive(Debug, Clone)]
pub struct PasswordHasher {
    iterations: u32,
}

struct StoredHash {
    iterations: u32,
    salt: Vec<u8>,
    key: Vec<u8>,
}

impl PasswordHasher {
    /// Create a new password hasher with the default work factor.
    ///
    /// # Returns
    /// PasswordHasher performing 10,000 iterations per hash
    pub fn new() -> Self {
        Self {
            iterations: MIN_ITERATIONS,
        }
    }

    /// Create a password hasher with a custom work factor.
    ///
    /// Values below the minimum are raised to the minimum.
    ///
    /// # Arguments
    /// * `iterations` - PBKDF2 iteration count for newly created hashes
    pub fn with_iterations(iterations: u32) -> Self {
        Self {
            iterations: iterations.clamp(MIN_ITERATIONS, MAX_ITERATIONS),
        }
    }

    /// Iteration count used for new hashes.
    pub fn iterations(&self) -> u32 {
        self.iterations
    }

    /// Hash a plaintext password with a fresh random salt.
    ///
    /// # Arguments
    /// * `password` - Plaintext password to hash
    ///
    /// # Returns
    /// Encoded `{iterations}.{salt}.{key}` string
    ///
    /// # Errors
    /// * `RandomnessUnavailable` - The OS random source failed; not retriable
    pub fn hash(&self, password: &str) -> Result<String, PasswordError> {
        let mut salt = [0u8; SALT_LENGTH];
        OsRng
            .try_fill_bytes(&mut salt)
            .map_err(|e| PasswordError::RandomnessUnavailable(e.to_string()))?;

        let key = derive_key(password, &salt, self.iterations);

        Ok(format!(
            "{}.{}.{}",
            self.iterations,
            STANDARD.encode(salt),
            STANDARD.encode(key)
        ))
    }

    /// Verify a password against a stored hash.
    ///
    /// Any malformed stored value yields `false`.
    ///
    /// # Arguments
    /// * `password` - Plaintext password to verify
    /// * `stored` - Hash previously produced by [`PasswordHasher::hash`]
    ///
    /// # Returns
    /// True if password matches, false otherwise
    pub fn verify(&self, password: &str, stored: &str) -> bool {
        let Some(parsed) = StoredHash::parse(stored) else {
            tracing::debug!("Stored password hash is malformed");
            return false;
        };

        let candidate = derive_key(password, &parsed.salt, parsed.iterations);
        constant_time_eq(&candidate, &parsed.key)
    }

    /// Spend the work of a verification for an account that has no hash.
    ///
    /// Always returns `false`. Keeps lookups of unknown accounts from
    /// answering faster than a wrong password would.
    pub fn verify_absent(&self, password: &str) -> bool {
        let candidate = derive_key(password, &ABSENT_SALT, self.iterations);
        std::hint::black_box(candidate);
        false
    }

    /// Check whether a stored hash should be recomputed.
    ///
    /// # Returns
    /// True if the hash is unparseable or was produced with fewer iterations
    /// than this hasher uses
    pub fn needs_rehash(&self, stored: &str) -> bool {
        StoredHash::parse(stored).map_or(true, |parsed| parsed.iterations < self.iterations)
    }
}

impl Default for PasswordHasher {
    fn default() -> Self {
        Self::new()
    }
}

impl StoredHash {
    fn parse(stored: &str) -> Option<Self> {
        let mut parts = stored.split('.');
        let (Some(iterations), Some(salt), Some(key), None) =
            (parts.next(), parts.next(), parts.next(), parts.next())
        else {
            return None;
        };

        let iterations: u32 = iterations.parse().ok()?;
        if iterations == 0 || iterations > MAX_ITERATIONS {
            return None;
        }

        let salt = STANDARD.decode(salt).ok()?;
        let key = STANDARD.decode(key).ok()?;
        if salt.is_empty() || key.len() != KEY_LENGTH {
            return None;
        }

        Some(Self {
            iterations,
            salt,
            key,
        })
    }
}

fn derive_key(password: &str, salt: &[u8], iterations: u32) -> [u8; KEY_LENGTH] {
    let mut key = [0u8; KEY_LENGTH];
    ::pbkdf2::pbkdf2_hmac::<Sha256>(password.as_bytes(), salt, iterations, &mut key);
    key
}

/// Constant-time byte comparison.
fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut diff = 0u8;
    for (x, y) in a.iter().zip(b.iter()) {
        diff |= x ^ y;
    }
    diff == 0
}
