use serde::{Deserialize, Serialize};

use crate::actions::PresetError;
use crate::collector::{CollectorError, CollectorPreset, SUPPORTED_MODELS};
use crate::{AuthError, ContractStatus, Preset, Session};

// Request DTOs

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct ForgotPasswordRequest {
    pub email: String,
}

/// Query string of the link in the reset email. `exptime` is informational;
/// expiry is always checked against the stored value.
#[derive(Debug, Deserialize)]
pub struct ResetLinkQuery {
    pub token: String,
    pub email: String,
    pub exptime: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct ResetPasswordRequest {
    pub token: String,
    pub email: String,
    pub password: String,
    pub password_confirmation: String,
}

#[derive(Debug, Deserialize)]
pub struct CreateUserRequest {
    pub name: String,
    pub email: String,
    pub password: String,
    #[serde(default = "default_contract_status")]
    pub contract_status: ContractStatus,
}

fn default_contract_status() -> ContractStatus {
    ContractStatus::Active
}

#[derive(Debug, Deserialize)]
pub struct UpdateStatusRequest {
    pub status: ContractStatus,
}

#[derive(Debug, Deserialize)]
pub struct SavePresetRequest {
    pub name: String,
    #[serde(default)]
    pub config: CollectorPreset,
}

/// Either a saved preset by name or an inline configuration. With neither,
/// the defaults are used.
#[derive(Debug, Default, Deserialize)]
pub struct AnalysisRequest {
    pub preset: Option<String>,
    pub config: Option<CollectorPreset>,
}

// Response DTOs

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub user_id: i64,
    pub email: Option<String>,
    pub role: String,
    /// Epoch seconds.
    pub expires_at: i64,
}

impl From<&Session> for SessionResponse {
    fn from(session: &Session) -> Self {
        SessionResponse {
            user_id: session.user_id,
            email: session.email.clone(),
            role: session.role.to_string(),
            expires_at: session.expiration,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct DashboardResponse {
    pub session: SessionResponse,
    pub presets: Vec<Preset>,
    pub defaults: CollectorPreset,
    pub models: &'static [&'static str],
}

impl DashboardResponse {
    pub fn new(session: &Session, presets: Vec<Preset>) -> Self {
        DashboardResponse {
            session: SessionResponse::from(session),
            presets,
            defaults: CollectorPreset::default(),
            models: SUPPORTED_MODELS,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct CreatedResponse {
    pub id: i64,
}

#[derive(Debug, Serialize)]
pub struct ResetLinkResponse {
    pub email: String,
    pub valid: bool,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
}

const UNAVAILABLE_MESSAGE: &str = "Could not reach the database, please try again later";
const INTERNAL_MESSAGE: &str = "Internal server error";

impl From<AuthError> for ErrorResponse {
    fn from(err: AuthError) -> Self {
        let code = match &err {
            AuthError::UserNotFound => "USER_NOT_FOUND",
            AuthError::UserAlreadyExists => "USER_ALREADY_EXISTS",
            AuthError::InvalidCredentials => "INVALID_CREDENTIALS",
            AuthError::AccessRevoked => "ACCESS_REVOKED",
            AuthError::PermissionDenied => "PERMISSION_DENIED",
            AuthError::Validation(_) => "VALIDATION_ERROR",
            AuthError::Token(crate::TokenError::EmailNotFound) => "TOKEN_EMAIL_NOT_FOUND",
            AuthError::Token(crate::TokenError::AlreadyUsed) => "TOKEN_ALREADY_USED",
            AuthError::Token(crate::TokenError::Mismatch) => "TOKEN_INVALID",
            AuthError::Token(crate::TokenError::Expired) => "TOKEN_EXPIRED",
            AuthError::DatabaseError(_) => "STORE_UNAVAILABLE",
            AuthError::DeliveryFailed(_) => "DELIVERY_FAILED",
            AuthError::ConfigurationError(_) => "CONFIGURATION_ERROR",
            AuthError::Internal(_) => "INTERNAL_ERROR",
        };

        // raw store and internal errors stay in the logs
        let error = match &err {
            AuthError::DatabaseError(_) => UNAVAILABLE_MESSAGE.to_owned(),
            AuthError::ConfigurationError(_) | AuthError::Internal(_) => {
                INTERNAL_MESSAGE.to_owned()
            }
            other => other.to_string(),
        };

        ErrorResponse {
            error,
            code: code.to_owned(),
        }
    }
}

impl From<CollectorError> for ErrorResponse {
    fn from(err: CollectorError) -> Self {
        let code = match &err {
            CollectorError::NoInstruments => "NO_INSTRUMENTS",
            CollectorError::InvalidTarget => "INVALID_TARGET",
            CollectorError::BarsOutOfRange(_) => "BARS_OUT_OF_RANGE",
            CollectorError::UnsupportedModel(_) => "UNSUPPORTED_MODEL",
            CollectorError::NoData => "NO_DATA",
            CollectorError::Source(_) => "MARKET_DATA_ERROR",
            CollectorError::Analyst(_) => "ANALYST_ERROR",
            CollectorError::MalformedResponse(_) => "MALFORMED_RESPONSE",
        };
        ErrorResponse {
            error: err.to_string(),
            code: code.to_owned(),
        }
    }
}

impl From<PresetError> for ErrorResponse {
    fn from(err: PresetError) -> Self {
        match err {
            PresetError::Store(err) => ErrorResponse::from(err),
            PresetError::InvalidConfig(err) => ErrorResponse::from(err),
            PresetError::InvalidName(err) => ErrorResponse::from(AuthError::Validation(err)),
            PresetError::NotFound => ErrorResponse {
                error: err.to_string(),
                code: "PRESET_NOT_FOUND".to_owned(),
            },
        }
    }
}
