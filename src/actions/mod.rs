//! Request-level operations.
//!
//! Each action owns its collaborators and exposes `execute` (or a few named
//! methods). Actions that depend on the clock also have an `execute_at`
//! variant taking the time explicitly.

pub mod admin;
pub mod analysis;
pub mod forgot_password;
pub mod login;
pub mod logout;
pub mod presets;
pub mod reset_password;

pub use admin::{
    AdminOverview, AdminOverviewAction, CreateUserAction, CreateUserInput, DeleteUserAction,
    UpdateContractStatusAction,
};
pub use analysis::{AnalysisRun, DEFAULT_REPORT_LANGUAGE, RunAnalysisAction};
pub use forgot_password::{ForgotPasswordAction, RESET_REQUESTED_MESSAGE, reset_link};
pub use login::LoginAction;
pub use logout::LogoutAction;
pub use presets::{PresetError, PresetsAction};
pub use reset_password::{ResetPasswordAction, ValidateResetTokenAction};
