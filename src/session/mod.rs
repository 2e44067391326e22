//! Session model and the client-side carrier it is persisted in.
//!
//! A [`Session`] is never stored server-side. Login writes it into a
//! [`Carrier`] (cookies in the HTTP layer) and every request rebuilds it with
//! [`Session::rehydrate`]. Validity is decided by [`Session::is_valid`] alone.

mod carrier;
mod config;
mod cookie;
mod file_store;
mod memory_store;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::AuthError;
use crate::validators::ValidationError;

pub use carrier::{Carrier, CarrierKey};
pub use config::{SameSite, SessionConfig};
pub use cookie::{SessionBinding, SignedCarrier, sign_value, verify_signed_value};
pub use file_store::FileCarrier;
pub use memory_store::InMemoryCarrier;

/// Access level stored in the `access_lvl` column and carrier entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Role {
    Admin,
    #[default]
    User,
}

impl Role {
    /// Only the exact string `Admin` grants the admin role.
    pub fn from_access_level(value: &str) -> Self {
        if value == "Admin" { Role::Admin } else { Role::User }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "Admin",
            Role::User => "User",
        }
    }

    pub fn is_admin(&self) -> bool {
        matches!(self, Role::Admin)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Account entitlement. Informational at login unless
/// [`SessionConfig::deny_revoked_login`] is set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContractStatus {
    Active,
    Revoked,
}

impl ContractStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContractStatus::Active => "active",
            ContractStatus::Revoked => "revoked",
        }
    }

    /// Reads a value from the store. Anything unrecognised is treated as revoked.
    pub fn from_store(value: &str) -> Self {
        value.parse().unwrap_or_else(|_| {
            log::warn!(target: "rdx_dash", "msg=\"unknown contract status\" value=\"{value}\"");
            ContractStatus::Revoked
        })
    }
}

impl FromStr for ContractStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "active" => Ok(ContractStatus::Active),
            "revoked" => Ok(ContractStatus::Revoked),
            other => Err(ValidationError::InvalidContractStatus(other.to_owned())),
        }
    }
}

impl fmt::Display for ContractStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Who is logged in for this client, with what role, until when.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Session {
    pub logged_in: bool,
    pub email: Option<String>,
    pub user_id: i64,
    pub role: Role,
    /// Known only for a session produced by login; the carrier does not hold it.
    pub contract_status: Option<ContractStatus>,
    /// Absolute expiry in epoch seconds. Zero means no session.
    pub expiration: i64,
}

impl Session {
    pub fn logged_out() -> Self {
        Self {
            logged_in: false,
            email: None,
            user_id: 0,
            role: Role::User,
            contract_status: None,
            expiration: 0,
        }
    }

    /// The single authorization predicate.
    pub fn is_valid(&self, now: i64) -> bool {
        self.logged_in && self.expiration != 0 && self.expiration > now
    }

    /// Rebuilds a session from the carrier.
    ///
    /// Never fails: missing or unparsable entries fall back to empty/zero, which
    /// yields a session that is not valid.
    pub fn rehydrate(carrier: &dyn Carrier) -> Self {
        let logged_in = carrier
            .get(CarrierKey::LoggedIn)
            .is_some_and(|v| v == "true");
        let email = carrier
            .get(CarrierKey::UserEmail)
            .filter(|v| !v.is_empty());
        let user_id = carrier
            .get(CarrierKey::UserId)
            .and_then(|v| v.parse().ok())
            .unwrap_or(0);
        let expiration = carrier
            .get(CarrierKey::Expiration)
            .and_then(|v| v.parse().ok())
            .unwrap_or(0);
        let role = carrier
            .get(CarrierKey::AccessLevel)
            .map_or(Role::User, |v| Role::from_access_level(&v));

        Self {
            logged_in,
            email,
            user_id,
            role,
            contract_status: None,
            expiration,
        }
    }

    /// Writes all five carrier entries.
    pub fn commit(&self, carrier: &dyn Carrier) -> Result<(), AuthError> {
        carrier.set(
            CarrierKey::LoggedIn,
            if self.logged_in { "true" } else { "false" },
        )?;
        match &self.email {
            Some(email) => carrier.set(CarrierKey::UserEmail, email)?,
            None => carrier.remove(CarrierKey::UserEmail)?,
        }
        carrier.set(CarrierKey::UserId, &self.user_id.to_string())?;
        carrier.set(CarrierKey::Expiration, &self.expiration.to_string())?;
        carrier.set(CarrierKey::AccessLevel, self.role.as_str())?;
        Ok(())
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::logged_out()
    }
}

/// Resets the carrier to the logged-out state.
pub fn clear(carrier: &dyn Carrier) -> Result<(), AuthError> {
    carrier.set(CarrierKey::LoggedIn, "false")?;
    carrier.remove(CarrierKey::UserEmail)?;
    carrier.set(CarrierKey::Expiration, "0")?;
    carrier.set(CarrierKey::UserId, "0")?;
    carrier.remove(CarrierKey::AccessLevel)?;
    Ok(())
}
