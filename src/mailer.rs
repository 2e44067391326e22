//! Delivery of password-reset links.
//!
//! Delivery is best effort: the caller logs a failure and carries on, so the
//! page a user sees after a reset request never depends on the mail server.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::AuthError;

#[derive(Debug, Clone, PartialEq)]
pub struct ResetEmail {
    pub to: String,
    pub link: String,
    pub expires_at: DateTime<Utc>,
}

impl ResetEmail {
    pub fn subject(&self) -> &'static str {
        "Password reset"
    }

    pub fn body(&self) -> String {
        format!(
            "A password reset was requested for this account.\n\n\
             Open the link below to choose a new password:\n{}\n\n\
             The link expires at {} UTC. If you did not ask for a reset, ignore this message.",
            self.link,
            self.expires_at.format("%Y-%m-%d %H:%M"),
        )
    }
}

#[async_trait]
pub trait ResetMailer: Send + Sync {
    async fn send(&self, email: &ResetEmail) -> Result<(), AuthError>;
}

/// Writes the message to the log instead of sending it. Suitable for
/// development only, the link is a credential.
#[derive(Debug, Clone, Default)]
pub struct LogMailer;

#[async_trait]
impl ResetMailer for LogMailer {
    async fn send(&self, email: &ResetEmail) -> Result<(), AuthError> {
        log::info!(
            target: "rdx_dash",
            "msg=\"reset email\" to=\"{}\" expires_at=\"{}\" link=\"{}\"",
            email.to,
            email.expires_at.to_rfc3339(),
            email.link
        );
        Ok(())
    }
}

#[cfg(any(test, feature = "mocks"))]
pub use mock::MockResetMailer;

#[cfg(any(test, feature = "mocks"))]
mod mock {
    #![allow(clippy::unwrap_used)]

    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::{Arc, Mutex};

    use super::*;

    #[derive(Clone, Default)]
    pub struct MockResetMailer {
        pub sent: Arc<Mutex<Vec<ResetEmail>>>,
        failing: Arc<AtomicBool>,
    }

    impl MockResetMailer {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn set_failing(&self, failing: bool) {
            self.failing.store(failing, Ordering::SeqCst);
        }

        pub fn last(&self) -> Option<ResetEmail> {
            self.sent.lock().unwrap().last().cloned()
        }
    }

    #[async_trait]
    impl ResetMailer for MockResetMailer {
        async fn send(&self, email: &ResetEmail) -> Result<(), AuthError> {
            if self.failing.load(Ordering::SeqCst) {
                return Err(AuthError::DeliveryFailed("smtp unavailable".to_owned()));
            }
            self.sent.lock().unwrap().push(email.clone());
            Ok(())
        }
    }
}
