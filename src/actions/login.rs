use chrono::Utc;

use crate::crypto::{PasswordHasher, Sha256SaltedHasher};
use crate::events::{AuthEvent, dispatch};
use crate::session::{self, Carrier, SessionConfig};
use crate::validators::{ValidationError, normalize_email};
use crate::{AuthError, Session, UserRepository};

/// Verifies credentials and commits a fresh session to the carrier.
pub struct LoginAction<U: UserRepository, H: PasswordHasher = Sha256SaltedHasher> {
    user_repository: U,
    hasher: H,
    config: SessionConfig,
}

impl<U: UserRepository> LoginAction<U> {
    pub fn new(user_repository: U, config: SessionConfig) -> Self {
        Self::with_hasher(user_repository, Sha256SaltedHasher, config)
    }
}

impl<U: UserRepository, H: PasswordHasher> LoginAction<U, H> {
    pub fn with_hasher(user_repository: U, hasher: H, config: SessionConfig) -> Self {
        LoginAction {
            user_repository,
            hasher,
            config,
        }
    }

    pub async fn execute(
        &self,
        carrier: &dyn Carrier,
        email: &str,
        password: &str,
    ) -> Result<Session, AuthError> {
        self.execute_at(carrier, email, password, Utc::now().timestamp())
            .await
    }

    /// Logs in as of `now` (epoch seconds).
    ///
    /// Unknown email and wrong password both yield `InvalidCredentials`. On any
    /// failure past input validation the carrier is reset to logged-out.
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(name = "login", skip_all, err)
    )]
    pub async fn execute_at(
        &self,
        carrier: &dyn Carrier,
        email: &str,
        password: &str,
        now: i64,
    ) -> Result<Session, AuthError> {
        if email.trim().is_empty() {
            return Err(ValidationError::EmailEmpty.into());
        }
        if password.is_empty() {
            return Err(ValidationError::PasswordEmpty.into());
        }
        let email = normalize_email(email);

        let user = match self.user_repository.find_user_by_email(&email).await {
            Ok(user) => user,
            Err(e) => {
                reset_carrier(carrier);
                return Err(e);
            }
        };

        let Some(user) =
            user.filter(|u| self.hasher.verify(password, &u.salt, &u.password_hash))
        else {
            reset_carrier(carrier);
            log::info!(target: "rdx_dash", "msg=\"login failed\" reason=\"invalid credentials\"");
            dispatch(AuthEvent::LoginFailed {
                email,
                reason: "invalid credentials".to_owned(),
                at: Utc::now(),
            })
            .await;
            return Err(AuthError::InvalidCredentials);
        };

        if self.config.deny_revoked_login && !user.is_active() {
            reset_carrier(carrier);
            log::info!(target: "rdx_dash", "msg=\"login refused\" reason=\"access revoked\" user_id={}", user.id);
            dispatch(AuthEvent::LoginFailed {
                email,
                reason: "access revoked".to_owned(),
                at: Utc::now(),
            })
            .await;
            return Err(AuthError::AccessRevoked);
        }

        let session = Session {
            logged_in: true,
            email: Some(user.email.clone()),
            user_id: user.id,
            role: user.role,
            contract_status: Some(user.contract_status),
            expiration: now + self.config.session_lifetime.num_seconds(),
        };
        session.commit(carrier)?;

        log::info!(
            target: "rdx_dash",
            "msg=\"login success\" user_id={} role={} contract_status={}",
            user.id,
            user.role,
            user.contract_status
        );
        dispatch(AuthEvent::LoginSuccess {
            user_id: user.id,
            email: user.email,
            at: Utc::now(),
        })
        .await;

        Ok(session)
    }
}

fn reset_carrier(carrier: &dyn Carrier) {
    if let Err(e) = session::clear(carrier) {
        log::warn!(target: "rdx_dash", "msg=\"failed to clear carrier\" error=\"{e}\"");
    }
}
