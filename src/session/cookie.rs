//! Signed carrier values.
//!
//! Every entry is stored as `{value}.{hmac}`. The HMAC-SHA256 covers the entry
//! name, the value and the session's `user_id` and `expiration`, so a value
//! can not be edited, moved to another entry, or combined with entries from
//! a different session.

use hmac::{Hmac, Mac};
use sha2::Sha256;

use crate::crypto::constant_time_eq;
use crate::{AuthError, SecretString};

use super::carrier::{Carrier, CarrierKey};

type HmacSha256 = Hmac<Sha256>;

/// The entries every signature is bound to.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionBinding {
    pub user_id: String,
    pub expiration: String,
}

impl SessionBinding {
    pub fn new(user_id: impl Into<String>, expiration: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            expiration: expiration.into(),
        }
    }

    fn is_bound(key: CarrierKey) -> bool {
        matches!(key, CarrierKey::UserId | CarrierKey::Expiration)
    }

    fn assign(&mut self, key: CarrierKey, value: &str) {
        match key {
            CarrierKey::UserId => value.clone_into(&mut self.user_id),
            CarrierKey::Expiration => value.clone_into(&mut self.expiration),
            _ => {}
        }
    }
}

/// Returns `{value}.{signature}` for the given entry.
pub fn sign_value(
    key: CarrierKey,
    value: &str,
    binding: &SessionBinding,
    secret: &SecretString,
) -> String {
    let signature = compute_hmac(key, value, binding, secret);
    format!("{value}.{}", hex::encode(signature))
}

/// Verifies a signed entry and extracts the value.
///
/// Returns `None` if the signature is missing or does not match.
pub fn verify_signed_value(
    key: CarrierKey,
    signed: &str,
    binding: &SessionBinding,
    secret: &SecretString,
) -> Option<String> {
    let (value, signature_hex) = signed.rsplit_once('.')?;

    let actual_sig = hex::decode(signature_hex).ok()?;
    let expected_sig = compute_hmac(key, value, binding, secret);

    if constant_time_eq(&expected_sig, &actual_sig) {
        Some(value.to_owned())
    } else {
        log::warn!(target: "rdx_dash::session", "msg=\"carrier entry tampered\" key={}", key.as_str());
        None
    }
}

fn compute_hmac(
    key: CarrierKey,
    value: &str,
    binding: &SessionBinding,
    secret: &SecretString,
) -> Vec<u8> {
    // HMAC-SHA256 accepts keys of any length, so this cannot fail.
    #[allow(clippy::expect_used)]
    let mut mac = HmacSha256::new_from_slice(secret.expose_secret().as_bytes())
        .expect("HMAC accepts keys of any size");
    // length-prefixed so no two inputs share an encoding
    for part in [
        key.as_str(),
        value,
        binding.user_id.as_str(),
        binding.expiration.as_str(),
    ] {
        mac.update(&(part.len() as u64).to_be_bytes());
        mac.update(part.as_bytes());
    }
    mac.finalize().into_bytes().to_vec()
}

fn unsigned_part(signed: &str) -> &str {
    signed.rsplit_once('.').map_or(signed, |(value, _)| value)
}

/// Wraps a carrier so that entries it did not sign read as absent.
///
/// A forged `access_lvl=Admin` therefore rehydrates as a plain user, and a
/// forged `expiration` as zero. Without a secret nothing verifies and every
/// write fails.
pub struct SignedCarrier<C> {
    inner: C,
    secret: SecretString,
}

impl<C: Carrier> SignedCarrier<C> {
    pub fn new(inner: C, secret: SecretString) -> Self {
        Self { inner, secret }
    }

    pub fn inner(&self) -> &C {
        &self.inner
    }

    pub fn into_inner(self) -> C {
        self.inner
    }

    fn ensure_secret(&self) -> Result<(), AuthError> {
        if self.secret.is_empty() {
            log::error!(target: "rdx_dash::session", "msg=\"refusing to sign with an empty secret\"");
            return Err(AuthError::ConfigurationError(
                "session secret is empty".to_owned(),
            ));
        }
        Ok(())
    }

    fn binding(&self) -> SessionBinding {
        let raw = |key| {
            self.inner
                .get(key)
                .map(|signed| unsigned_part(&signed).to_owned())
                .unwrap_or_default()
        };
        SessionBinding::new(raw(CarrierKey::UserId), raw(CarrierKey::Expiration))
    }

    /// Writes or removes a bound entry and re-signs every other entry under
    /// the new binding. Entries that no longer verify are dropped.
    fn rebind(&self, key: CarrierKey, value: Option<&str>) -> Result<(), AuthError> {
        let kept: Vec<(CarrierKey, Option<String>)> = CarrierKey::ALL
            .into_iter()
            .filter(|other| *other != key && self.inner.get(*other).is_some())
            .map(|other| (other, self.get(other)))
            .collect();

        let mut binding = self.binding();
        binding.assign(key, value.unwrap_or_default());

        match value {
            Some(value) => self
                .inner
                .set(key, &sign_value(key, value, &binding, &self.secret))?,
            None => self.inner.remove(key)?,
        }

        for (other, value) in kept {
            match value {
                Some(value) => self
                    .inner
                    .set(other, &sign_value(other, &value, &binding, &self.secret))?,
                None => self.inner.remove(other)?,
            }
        }
        Ok(())
    }
}

impl<C: Carrier> Carrier for SignedCarrier<C> {
    fn get(&self, key: CarrierKey) -> Option<String> {
        if self.secret.is_empty() {
            return None;
        }
        let signed = self.inner.get(key)?;
        verify_signed_value(key, &signed, &self.binding(), &self.secret)
    }

    fn set(&self, key: CarrierKey, value: &str) -> Result<(), AuthError> {
        self.ensure_secret()?;
        if SessionBinding::is_bound(key) {
            return self.rebind(key, Some(value));
        }
        self.inner
            .set(key, &sign_value(key, value, &self.binding(), &self.secret))
    }

    fn remove(&self, key: CarrierKey) -> Result<(), AuthError> {
        self.ensure_secret()?;
        if SessionBinding::is_bound(key) {
            return self.rebind(key, None);
        }
        self.inner.remove(key)
    }
}
