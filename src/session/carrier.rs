//! Durable client-side key/value storage for session entries.

use crate::AuthError;

/// The five entries a session is persisted as.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CarrierKey {
    LoggedIn,
    UserEmail,
    UserId,
    Expiration,
    AccessLevel,
}

impl CarrierKey {
    pub const ALL: [CarrierKey; 5] = [
        CarrierKey::LoggedIn,
        CarrierKey::UserEmail,
        CarrierKey::UserId,
        CarrierKey::Expiration,
        CarrierKey::AccessLevel,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CarrierKey::LoggedIn => "logged_in",
            CarrierKey::UserEmail => "user_email",
            CarrierKey::UserId => "user_id",
            CarrierKey::Expiration => "expiration",
            CarrierKey::AccessLevel => "access_lvl",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|key| key.as_str() == name)
    }
}

/// Storage for session entries that outlives a single request.
///
/// Implementations:
/// - [`InMemoryCarrier`](super::InMemoryCarrier): for tests and single-process tools
/// - [`FileCarrier`](super::FileCarrier): JSON file, survives restarts
/// - [`SignedCarrier`](super::SignedCarrier): HMAC wrapper around any other carrier
pub trait Carrier: Send + Sync {
    fn get(&self, key: CarrierKey) -> Option<String>;

    fn set(&self, key: CarrierKey, value: &str) -> Result<(), AuthError>;

    fn remove(&self, key: CarrierKey) -> Result<(), AuthError>;
}
