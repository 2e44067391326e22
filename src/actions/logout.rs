use chrono::Utc;

use crate::events::{AuthEvent, dispatch};
use crate::session::{self, Carrier};
use crate::{AuthError, Route, Session};

/// Clears the carrier. Touches no store, so it works for any client state.
pub struct LogoutAction;

impl LogoutAction {
    pub fn new() -> Self {
        LogoutAction
    }

    /// Always returns [`Route::Login`] on success; calling it again is a no-op.
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(name = "logout", skip_all, err)
    )]
    pub async fn execute(&self, carrier: &dyn Carrier) -> Result<Route, AuthError> {
        let previous = Session::rehydrate(carrier);
        session::clear(carrier)?;

        if previous.logged_in && previous.user_id != 0 {
            log::info!(target: "rdx_dash", "msg=\"logout success\" user_id={}", previous.user_id);
            dispatch(AuthEvent::LogoutSuccess {
                user_id: previous.user_id,
                at: Utc::now(),
            })
            .await;
        }

        Ok(Route::Login)
    }
}

impl Default for LogoutAction {
    fn default() -> Self {
        Self::new()
    }
}
