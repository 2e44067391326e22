use chrono::{DateTime, Utc};

use crate::config::ResetConfig;
use crate::crypto::{generate_token, hash_token};
use crate::events::{AuthEvent, dispatch};
use crate::mailer::{ResetEmail, ResetMailer};
use crate::validators::{normalize_email, validate_email};
use crate::{AuthError, UserRepository};

/// The only message shown after a reset request, whether or not the account exists.
pub const RESET_REQUESTED_MESSAGE: &str =
    "If this email is registered, you will receive a message with instructions to reset your password.";

/// Issues a reset token and mails the link.
pub struct ForgotPasswordAction<U: UserRepository, M: ResetMailer> {
    user_repository: U,
    mailer: M,
    config: ResetConfig,
}

impl<U: UserRepository, M: ResetMailer> ForgotPasswordAction<U, M> {
    pub fn new(user_repository: U, mailer: M) -> Self {
        Self::with_config(user_repository, mailer, ResetConfig::default())
    }

    pub fn with_config(user_repository: U, mailer: M, config: ResetConfig) -> Self {
        ForgotPasswordAction {
            user_repository,
            mailer,
            config,
        }
    }

    pub async fn execute(&self, email: &str) -> Result<Option<String>, AuthError> {
        self.execute_at(email, Utc::now()).await
    }

    /// Returns `Ok(Some(token))` when a token was issued and `Ok(None)` when no
    /// account has this email. Callers must render both the same way
    /// ([`RESET_REQUESTED_MESSAGE`]).
    ///
    /// A failed delivery is logged; the token stays issued.
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(name = "forgot_password", skip_all, err)
    )]
    pub async fn execute_at(
        &self,
        email: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<String>, AuthError> {
        let email = normalize_email(email);
        validate_email(&email)?;

        let Some(user) = self.user_repository.find_user_by_email(&email).await? else {
            log::info!(target: "rdx_dash", "msg=\"password reset for unknown email\"");
            return Ok(None);
        };

        let token = generate_token(self.config.token_length);
        let expires_at = now + self.config.token_expiry;
        self.user_repository
            .set_reset_token(&user.email, &hash_token(&token), expires_at)
            .await?;

        let message = ResetEmail {
            to: user.email.clone(),
            link: reset_link(&self.config.link_base_url, &token, &user.email, expires_at),
            expires_at,
        };
        if let Err(e) = self.mailer.send(&message).await {
            log::warn!(target: "rdx_dash", "msg=\"reset email not delivered\" user_id={} error=\"{e}\"", user.id);
        }

        log::info!(target: "rdx_dash", "msg=\"password reset requested\" user_id={}", user.id);
        dispatch(AuthEvent::PasswordResetRequested {
            email: user.email,
            at: Utc::now(),
        })
        .await;

        Ok(Some(token))
    }
}

/// `{base}/reset-password?token=..&email=..&exptime=..` with `exptime` in epoch seconds.
pub fn reset_link(base_url: &str, token: &str, email: &str, expires_at: DateTime<Utc>) -> String {
    format!(
        "{}/reset-password?token={}&email={}&exptime={}",
        base_url.trim_end_matches('/'),
        urlencoding::encode(token),
        urlencoding::encode(email),
        expires_at.timestamp()
    )
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::*;
    use crate::crypto::RESET_TOKEN_LENGTH;
    use crate::mailer::MockResetMailer;
    use crate::validators::ValidationError;
    use crate::{MockUserRepository, User};

    fn repo() -> MockUserRepository {
        MockUserRepository::with_users(vec![User::mock_from_email("ana@x.com")])
    }

    #[tokio::test]
    async fn test_issues_token_and_sends_link() {
        let repo = repo();
        let mailer = MockResetMailer::new();
        let action = ForgotPasswordAction::new(repo.clone(), mailer.clone());
        let now = Utc::now();

        let token = action.execute_at("Ana@x.com", now).await.unwrap().unwrap();
        assert_eq!(token.len(), RESET_TOKEN_LENGTH);

        let user = repo.find_user_by_email("ana@x.com").await.unwrap().unwrap();
        assert_eq!(user.reset_token, Some(hash_token(&token)));
        assert_eq!(user.token_expires_at, Some(now + Duration::minutes(15)));
        assert!(!user.token_used);

        let sent = mailer.last().unwrap();
        assert_eq!(sent.to, "ana@x.com");
        assert!(sent.link.contains(&format!("token={token}")));
        assert!(sent.link.contains("email=ana%40x.com"));
        assert!(sent.link.contains(&format!("exptime={}", sent.expires_at.timestamp())));
    }

    #[tokio::test]
    async fn test_unknown_email_issues_nothing() {
        let mailer = MockResetMailer::new();
        let action = ForgotPasswordAction::new(repo(), mailer.clone());

        assert_eq!(action.execute("bob@x.com").await.unwrap(), None);
        assert!(mailer.last().is_none());
    }

    #[tokio::test]
    async fn test_invalid_email_does_not_touch_store() {
        let repo = repo();
        repo.set_unavailable(true);
        let action = ForgotPasswordAction::new(repo, MockResetMailer::new());

        assert_eq!(
            action.execute("not-an-email").await.unwrap_err(),
            AuthError::Validation(ValidationError::EmailInvalidFormat)
        );
        assert_eq!(
            action.execute("ana@localhost").await.unwrap_err(),
            AuthError::Validation(ValidationError::EmailInvalidFormat)
        );
    }

    #[tokio::test]
    async fn test_delivery_failure_keeps_token() {
        let repo = repo();
        let mailer = MockResetMailer::new();
        mailer.set_failing(true);
        let action = ForgotPasswordAction::new(repo.clone(), mailer);

        let token = action.execute("ana@x.com").await.unwrap();
        assert!(token.is_some());
        let user = repo.find_user_by_email("ana@x.com").await.unwrap().unwrap();
        assert!(!user.token_used);
    }

    #[tokio::test]
    async fn test_reissue_replaces_previous_token() {
        let repo = repo();
        let action = ForgotPasswordAction::new(repo.clone(), MockResetMailer::new());

        let first = action.execute("ana@x.com").await.unwrap().unwrap();
        let second = action.execute("ana@x.com").await.unwrap().unwrap();
        assert_ne!(first, second);

        let user = repo.find_user_by_email("ana@x.com").await.unwrap().unwrap();
        assert_eq!(user.reset_token, Some(hash_token(&second)));
    }

    #[test]
    fn test_reset_link_format() {
        let expires_at = DateTime::from_timestamp(1_700_000_900, 0).unwrap();
        assert_eq!(
            reset_link("https://dash.example.com/", "abc", "a+b@x.com", expires_at),
            "https://dash.example.com/reset-password?token=abc&email=a%2Bb%40x.com&exptime=1700000900"
        );
    }
}
