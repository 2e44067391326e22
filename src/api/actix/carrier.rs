use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

use actix_web::cookie::time::Duration as CookieDuration;
use actix_web::cookie::{Cookie, SameSite as ActixSameSite};
use actix_web::{HttpRequest, HttpResponseBuilder};

use crate::AuthError;
use crate::session::{Carrier, CarrierKey, SameSite, SessionConfig, SignedCarrier};

/// Carrier backed by the request's cookies.
///
/// Reads see the cookies sent with the request, overlaid with whatever the
/// handler has written since. Writes are collected and turned into
/// `Set-Cookie` headers by [`CookieCarrier::apply`].
pub struct CookieCarrier {
    incoming: HashMap<CarrierKey, String>,
    // None marks a removal
    pending: Mutex<HashMap<CarrierKey, Option<String>>>,
}

impl CookieCarrier {
    pub fn from_request(req: &HttpRequest, config: &SessionConfig) -> Self {
        let incoming = CarrierKey::ALL
            .into_iter()
            .filter_map(|key| {
                req.cookie(&config.cookie_name(key))
                    .map(|cookie| (key, cookie.value().to_owned()))
            })
            .collect();

        Self {
            incoming,
            pending: Mutex::new(HashMap::new()),
        }
    }

    /// The cookies that must be sent back for the writes made so far.
    pub fn outgoing_cookies(&self, config: &SessionConfig) -> Vec<Cookie<'static>> {
        let pending = self.pending.lock().unwrap_or_else(PoisonError::into_inner);
        let mut cookies: Vec<Cookie<'static>> = pending
            .iter()
            .map(|(key, value)| match value {
                Some(value) => build_carrier_cookie(*key, value.clone(), config),
                None => build_removal_cookie(*key, config),
            })
            .collect();
        cookies.sort_by(|a, b| a.name().cmp(b.name()));
        cookies
    }

    pub fn apply(&self, builder: &mut HttpResponseBuilder, config: &SessionConfig) {
        for cookie in self.outgoing_cookies(config) {
            builder.cookie(cookie);
        }
    }
}

impl Carrier for CookieCarrier {
    fn get(&self, key: CarrierKey) -> Option<String> {
        let pending = self.pending.lock().unwrap_or_else(PoisonError::into_inner);
        match pending.get(&key) {
            Some(value) => value.clone(),
            None => self.incoming.get(&key).cloned(),
        }
    }

    fn set(&self, key: CarrierKey, value: &str) -> Result<(), AuthError> {
        self.pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key, Some(value.to_owned()));
        Ok(())
    }

    fn remove(&self, key: CarrierKey) -> Result<(), AuthError> {
        self.pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key, None);
        Ok(())
    }
}

/// The carrier every handler works with: request cookies, HMAC-checked.
///
/// # Errors
///
/// Returns [`AuthError::ConfigurationError`] when the session config is not
/// usable for signing, so no request is ever served under a guessable key.
pub fn request_carrier(
    req: &HttpRequest,
    config: &SessionConfig,
) -> Result<SignedCarrier<CookieCarrier>, AuthError> {
    config.validate().map_err(|reason| {
        log::error!(target: "rdx_dash", "msg=\"session config rejected\" reason=\"{reason}\"");
        AuthError::ConfigurationError(reason.to_owned())
    })?;

    Ok(SignedCarrier::new(
        CookieCarrier::from_request(req, config),
        config.secret_key.clone(),
    ))
}

fn same_site(config: &SessionConfig) -> ActixSameSite {
    match config.cookie_same_site {
        SameSite::None => ActixSameSite::None,
        SameSite::Lax => ActixSameSite::Lax,
        SameSite::Strict => ActixSameSite::Strict,
    }
}

fn build_carrier_cookie(key: CarrierKey, value: String, config: &SessionConfig) -> Cookie<'static> {
    let max_age_secs = config.session_lifetime.num_seconds();

    let mut cookie = Cookie::build(config.cookie_name(key), value)
        .path(config.cookie_path.clone())
        .secure(config.cookie_secure)
        .http_only(config.cookie_http_only)
        .same_site(same_site(config))
        .max_age(CookieDuration::seconds(max_age_secs))
        .finish();

    if let Some(ref domain) = config.cookie_domain {
        cookie.set_domain(domain.clone());
    }

    cookie
}

fn build_removal_cookie(key: CarrierKey, config: &SessionConfig) -> Cookie<'static> {
    let mut cookie = Cookie::build(config.cookie_name(key), String::new())
        .path(config.cookie_path.clone())
        .max_age(CookieDuration::ZERO)
        .finish();

    if let Some(ref domain) = config.cookie_domain {
        cookie.set_domain(domain.clone());
    }

    cookie
}
