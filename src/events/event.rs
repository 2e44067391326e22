use chrono::{DateTime, Utc};

use crate::session::ContractStatus;

/// Events emitted by the dashboard actions.
///
/// Actions always fire them; with no listener registered they go nowhere.
#[derive(Debug, Clone)]
pub enum AuthEvent {
    // authentication
    LoginSuccess {
        user_id: i64,
        email: String,
        at: DateTime<Utc>,
    },
    LoginFailed {
        email: String,
        reason: String,
        at: DateTime<Utc>,
    },
    LogoutSuccess {
        user_id: i64,
        at: DateTime<Utc>,
    },

    // password
    PasswordResetRequested {
        email: String,
        at: DateTime<Utc>,
    },
    PasswordResetCompleted {
        email: String,
        at: DateTime<Utc>,
    },

    // administration
    UserCreated {
        user_id: i64,
        email: String,
        by: String,
        at: DateTime<Utc>,
    },
    UserDeleted {
        email: String,
        by: String,
        at: DateTime<Utc>,
    },
    ContractStatusChanged {
        email: String,
        status: ContractStatus,
        by: String,
        at: DateTime<Utc>,
    },

    // analysis
    AnalysisCompleted {
        user_id: i64,
        target: String,
        rows: usize,
        trade_ideas: usize,
        at: DateTime<Utc>,
    },
}

impl AuthEvent {
    /// Dot-separated event name for logs.
    pub fn name(&self) -> &'static str {
        match self {
            Self::LoginSuccess { .. } => "auth.login.success",
            Self::LoginFailed { .. } => "auth.login.failed",
            Self::LogoutSuccess { .. } => "auth.logout.success",
            Self::PasswordResetRequested { .. } => "auth.password.reset_requested",
            Self::PasswordResetCompleted { .. } => "auth.password.reset_completed",
            Self::UserCreated { .. } => "admin.user.created",
            Self::UserDeleted { .. } => "admin.user.deleted",
            Self::ContractStatusChanged { .. } => "admin.user.contract_status_changed",
            Self::AnalysisCompleted { .. } => "collector.analysis.completed",
        }
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        match self {
            Self::LoginSuccess { at, .. }
            | Self::LoginFailed { at, .. }
            | Self::LogoutSuccess { at, .. }
            | Self::PasswordResetRequested { at, .. }
            | Self::PasswordResetCompleted { at, .. }
            | Self::UserCreated { at, .. }
            | Self::UserDeleted { at, .. }
            | Self::ContractStatusChanged { at, .. }
            | Self::AnalysisCompleted { at, .. } => *at,
        }
    }
}
