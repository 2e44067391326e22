use chrono::Duration;

use crate::SecretString;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SameSite {
    None,
    #[default]
    Lax,
    Strict,
}

#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Prepended to each carrier entry name to form the cookie name.
    pub cookie_prefix: String,
    pub cookie_path: String,
    pub cookie_domain: Option<String>,
    pub cookie_secure: bool,
    pub cookie_http_only: bool,
    pub cookie_same_site: SameSite,
    pub session_lifetime: Duration,
    /// HMAC key for carrier entries.
    pub secret_key: SecretString,
    /// Refuse login for accounts whose contract status is `revoked`.
    pub deny_revoked_login: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            cookie_prefix: "rdx_".to_owned(),
            cookie_path: "/".to_owned(),
            cookie_domain: None,
            cookie_secure: true,
            cookie_http_only: true,
            cookie_same_site: SameSite::Lax,
            session_lifetime: Duration::hours(12),
            secret_key: SecretString::new(""),
            deny_revoked_login: false,
        }
    }
}

impl SessionConfig {
    pub fn validate(&self) -> Result<(), &'static str> {
        if self.secret_key.is_empty() {
            return Err("secret_key must not be empty");
        }
        if self.secret_key.len() < 32 {
            return Err("secret_key should be at least 32 bytes");
        }
        if self.session_lifetime <= Duration::zero() {
            return Err("session_lifetime must be positive");
        }
        Ok(())
    }

    pub fn cookie_name(&self, key: super::CarrierKey) -> String {
        format!("{}{}", self.cookie_prefix, key.as_str())
    }
}
