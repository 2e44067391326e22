//! Per-page authorization.
//!
//! Every protected page starts with [`authorize`] (or [`authorize_admin`]) and
//! returns immediately on `Err`. Nothing past the gate may run for a rejected
//! request.

use crate::AuthError;
use crate::session::{self, Carrier, Session};

/// The pages a gate decision can send the client to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Login,
    Dashboard,
    Admin,
}

impl Route {
    pub fn path(&self) -> &'static str {
        match self {
            Route::Login => "/login",
            Route::Dashboard => "/dashboard",
            Route::Admin => "/admin",
        }
    }
}

/// Why a request may not continue.
#[derive(Debug, Clone, PartialEq)]
pub enum GateRejection {
    /// Normal flow: send the client elsewhere without an error message.
    Redirect(Route),
    /// Render the error and stop.
    Denied(AuthError),
}

/// Rehydrates the session and checks that it is still valid at `now` (epoch seconds).
///
/// An invalid session also resets the carrier to logged-out, so stale entries
/// do not linger after expiry.
pub fn authorize(carrier: &dyn Carrier, now: i64) -> Result<Session, GateRejection> {
    let session = Session::rehydrate(carrier);
    if session.is_valid(now) {
        return Ok(session);
    }

    if session.logged_in || session.expiration != 0 {
        log::info!(target: "rdx_dash", "msg=\"session expired\" user_id={}", session.user_id);
    }
    if let Err(e) = session::clear(carrier) {
        log::warn!(target: "rdx_dash", "msg=\"failed to clear carrier\" error=\"{e}\"");
    }

    Err(GateRejection::Redirect(Route::Login))
}

/// Only the `Admin` role passes.
pub fn require_admin(session: &Session) -> Result<(), AuthError> {
    if session.role.is_admin() {
        Ok(())
    } else {
        log::warn!(target: "rdx_dash", "msg=\"permission denied\" user_id={} role={}", session.user_id, session.role);
        Err(AuthError::PermissionDenied)
    }
}

/// [`authorize`] followed by [`require_admin`]. The role is never looked at for
/// an unauthenticated carrier.
pub fn authorize_admin(carrier: &dyn Carrier, now: i64) -> Result<Session, GateRejection> {
    let session = authorize(carrier, now)?;
    require_admin(&session).map_err(GateRejection::Denied)?;
    Ok(session)
}

/// Used by the login page: a client that is already signed in goes straight
/// to the dashboard.
pub fn redirect_if_authenticated(carrier: &dyn Carrier, now: i64) -> Option<Route> {
    Session::rehydrate(carrier)
        .is_valid(now)
        .then_some(Route::Dashboard)
}
