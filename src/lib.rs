pub mod actions;
pub mod collector;
pub mod config;
pub mod crypto;
pub mod events;
pub mod gate;
pub mod mailer;
pub mod repository;
pub mod session;
pub mod validators;

#[cfg(feature = "actix")]
pub mod api;

#[cfg(feature = "sqlx_sqlite")]
pub mod sqlite;

#[cfg(feature = "sqlx_mysql")]
pub mod mysql;

pub use crypto::SecretString;
pub use events::{AuthEvent, dispatch, register_event_listeners};
pub use gate::{GateRejection, Route};
pub use repository::{NewUser, Preset, PresetRepository, User, UserRepository, UserSummary};
pub use session::{Carrier, ContractStatus, Role, Session};
pub use validators::ValidationError;

#[cfg(any(test, feature = "mocks"))]
pub use repository::{MockPresetRepository, MockUserRepository};

use std::fmt;

/// Reasons a presented reset token is refused.
///
/// Checked in declaration order; the first one that applies wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenError {
    EmailNotFound,
    AlreadyUsed,
    Mismatch,
    Expired,
}

impl fmt::Display for TokenError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmailNotFound => write!(f, "No account is registered with this email"),
            Self::AlreadyUsed => write!(f, "This reset link has already been used"),
            Self::Mismatch => write!(f, "Invalid reset token"),
            Self::Expired => write!(f, "This reset link has expired, request a new one"),
        }
    }
}

impl std::error::Error for TokenError {}

#[derive(Debug, Clone, PartialEq)]
pub enum AuthError {
    UserNotFound,
    UserAlreadyExists,
    InvalidCredentials,
    AccessRevoked,
    PermissionDenied,
    Validation(ValidationError),
    Token(TokenError),
    /// The credential store could not be reached or a query failed.
    DatabaseError(String),
    DeliveryFailed(String),
    ConfigurationError(String),
    Internal(String),
}

impl std::error::Error for AuthError {}

impl fmt::Display for AuthError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuthError::UserNotFound => write!(f, "User not found"),
            AuthError::UserAlreadyExists => write!(f, "User already exists"),
            AuthError::InvalidCredentials => write!(f, "Invalid email or password"),
            AuthError::AccessRevoked => write!(f, "Access for this account has been revoked"),
            AuthError::PermissionDenied => {
                write!(f, "You do not have permission to access this page")
            }
            AuthError::Validation(err) => write!(f, "{err}"),
            AuthError::Token(err) => write!(f, "{err}"),
            AuthError::DatabaseError(msg) => write!(f, "Database error: {msg}"),
            AuthError::DeliveryFailed(msg) => write!(f, "Email delivery failed: {msg}"),
            AuthError::ConfigurationError(msg) => write!(f, "Configuration error: {msg}"),
            AuthError::Internal(msg) => write!(f, "Internal error: {msg}"),
        }
    }
}

impl From<ValidationError> for AuthError {
    fn from(err: ValidationError) -> Self {
        AuthError::Validation(err)
    }
}

impl From<TokenError> for AuthError {
    fn from(err: TokenError) -> Self {
        AuthError::Token(err)
    }
}
