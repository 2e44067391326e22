use std::future::{Ready, ready};

use actix_web::cookie::Cookie;
use actix_web::dev::Payload;
use actix_web::http::{StatusCode, header};
use actix_web::{FromRequest, HttpRequest, HttpResponse, web};
use chrono::Utc;

use super::carrier::request_carrier;
use crate::api::ErrorResponse;
use crate::gate::{self, GateRejection};
use crate::session::SessionConfig;
use crate::{AuthError, Session};

/// HTTP status for an error surfaced by an action.
pub fn error_status(err: &AuthError) -> StatusCode {
    match err {
        AuthError::Validation(_) | AuthError::Token(_) => StatusCode::BAD_REQUEST,
        AuthError::InvalidCredentials => StatusCode::UNAUTHORIZED,
        AuthError::AccessRevoked | AuthError::PermissionDenied => StatusCode::FORBIDDEN,
        AuthError::UserNotFound => StatusCode::NOT_FOUND,
        AuthError::UserAlreadyExists => StatusCode::CONFLICT,
        AuthError::DatabaseError(_) => StatusCode::SERVICE_UNAVAILABLE,
        AuthError::DeliveryFailed(_) => StatusCode::BAD_GATEWAY,
        AuthError::ConfigurationError(_) | AuthError::Internal(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

/// A request that passed [`gate::authorize`].
#[derive(Debug, Clone)]
pub struct Authenticated(pub Session);

impl Authenticated {
    pub fn session(&self) -> &Session {
        &self.0
    }

    pub fn into_inner(self) -> Session {
        self.0
    }
}

/// A request that passed [`gate::authorize_admin`].
#[derive(Debug, Clone)]
pub struct AdminAuthenticated(pub Session);

impl AdminAuthenticated {
    pub fn session(&self) -> &Session {
        &self.0
    }
}

/// A rejected gate, rendered as a redirect or an error page.
///
/// Carries the cookies that reset the client to logged-out when the gate
/// cleared the carrier.
#[derive(Debug)]
pub struct GateError {
    pub rejection: GateRejection,
    cookies: Vec<Cookie<'static>>,
}

impl GateError {
    fn misconfigured() -> Self {
        log::error!(target: "rdx_dash", "msg=\"SessionConfig missing from app data\"");
        GateError {
            rejection: GateRejection::Denied(AuthError::ConfigurationError(
                "session config missing".to_owned(),
            )),
            cookies: vec![],
        }
    }
}

impl std::fmt::Display for GateError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.rejection {
            GateRejection::Redirect(route) => write!(f, "redirect to {}", route.path()),
            GateRejection::Denied(err) => write!(f, "{err}"),
        }
    }
}

impl actix_web::ResponseError for GateError {
    fn status_code(&self) -> StatusCode {
        match &self.rejection {
            GateRejection::Redirect(_) => StatusCode::SEE_OTHER,
            GateRejection::Denied(err) => error_status(err),
        }
    }

    fn error_response(&self) -> HttpResponse {
        let mut builder = HttpResponse::build(self.status_code());
        for cookie in &self.cookies {
            builder.cookie(cookie.clone());
        }

        match &self.rejection {
            GateRejection::Redirect(route) => builder
                .insert_header((header::LOCATION, route.path()))
                .finish(),
            GateRejection::Denied(err) => builder.json(ErrorResponse::from(err.clone())),
        }
    }
}

fn run_gate(
    req: &HttpRequest,
    gate: fn(&dyn crate::Carrier, i64) -> Result<Session, GateRejection>,
) -> Result<Session, GateError> {
    let Some(config) = req.app_data::<web::Data<SessionConfig>>() else {
        return Err(GateError::misconfigured());
    };

    let carrier = request_carrier(req, config).map_err(|err| GateError {
        rejection: GateRejection::Denied(err),
        cookies: vec![],
    })?;
    gate(&carrier, Utc::now().timestamp()).map_err(|rejection| GateError {
        rejection,
        cookies: carrier.inner().outgoing_cookies(config),
    })
}

impl FromRequest for Authenticated {
    type Error = GateError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(run_gate(req, gate::authorize).map(Authenticated))
    }
}

impl FromRequest for AdminAuthenticated {
    type Error = GateError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(run_gate(req, gate::authorize_admin).map(AdminAuthenticated))
    }
}
