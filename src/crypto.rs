use rand::Rng;
use serde::{Deserialize, Deserializer};
use sha2::{Digest, Sha256};
use std::fmt;

/// Length of a reset token in characters.
pub const RESET_TOKEN_LENGTH: usize = 22;

/// Number of random bytes behind a password salt (hex encoded to twice that).
pub const SALT_BYTES: usize = 16;

/// A string that never shows up in logs.
///
/// `Debug` and `Display` both print `[REDACTED]`. Use [`SecretString::expose_secret`]
/// at the single place the raw value is needed.
///
/// ```rust
/// use rdx_dash::crypto::SecretString;
///
/// let password = SecretString::new("Abcdef1!");
/// assert_eq!(format!("{password:?}"), "SecretString([REDACTED])");
/// assert_eq!(password.expose_secret(), "Abcdef1!");
/// ```
#[derive(Clone, Default, PartialEq, Eq)]
pub struct SecretString(String);

impl SecretString {
    #[must_use]
    pub fn new(secret: impl Into<String>) -> Self {
        Self(secret.into())
    }

    #[must_use]
    pub fn expose_secret(&self) -> &str {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for SecretString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SecretString([REDACTED])")
    }
}

impl fmt::Display for SecretString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[REDACTED]")
    }
}

impl From<String> for SecretString {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for SecretString {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

impl<'de> Deserialize<'de> for SecretString {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Ok(SecretString(s))
    }
}

/// Salted password digest.
///
/// Implementations must be deterministic: the same plaintext and salt always
/// produce the same digest, so a stored hash can be recomputed at login.
pub trait PasswordHasher: Send + Sync {
    fn hash(&self, password: &str, salt: &str) -> String;

    /// Recomputes the digest and compares it in constant time.
    fn verify(&self, password: &str, salt: &str, expected: &str) -> bool {
        constant_time_eq(self.hash(password, salt).as_bytes(), expected.as_bytes())
    }
}

/// `hex(sha256(salt || password))`, the digest format stored in the `users` table.
///
/// ```rust
/// use rdx_dash::crypto::{PasswordHasher, Sha256SaltedHasher, generate_salt};
///
/// let hasher = Sha256SaltedHasher;
/// let salt = generate_salt();
/// let hash = hasher.hash("Abcdef1!", &salt);
/// assert!(hasher.verify("Abcdef1!", &salt, &hash));
/// assert!(!hasher.verify("abcdef1!", &salt, &hash));
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct Sha256SaltedHasher;

impl PasswordHasher for Sha256SaltedHasher {
    fn hash(&self, password: &str, salt: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(salt.as_bytes());
        hasher.update(password.as_bytes());
        hex::encode(hasher.finalize())
    }
}

/// Fresh per-user salt: 16 random bytes, hex encoded.
pub fn generate_salt() -> String {
    let bytes: [u8; SALT_BYTES] = rand::thread_rng().r#gen();
    hex::encode(bytes)
}

/// Generates a random alphanumeric token of `length` characters.
pub fn generate_token(length: usize) -> String {
    let mut rng = rand::thread_rng();
    (0..length)
        .map(|_| char::from(rng.sample(rand::distributions::Alphanumeric)))
        .collect()
}

/// Hashes a token using SHA-256 for storage.
/// Tokens are high-entropy random strings, so a fast unsalted hash is enough.
pub fn hash_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    hex::encode(hasher.finalize())
}

/// Constant-time comparison to prevent timing attacks.
pub fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }

    let mut result = 0u8;
    for (x, y) in a.iter().zip(b.iter()) {
        result |= x ^ y;
    }
    result == 0
}
