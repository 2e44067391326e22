use chrono::{DateTime, Utc};

use crate::crypto::{PasswordHasher, Sha256SaltedHasher, constant_time_eq, hash_token};
use crate::events::{AuthEvent, dispatch};
use crate::validators::{PasswordPolicy, ValidationError, normalize_email};
use crate::{AuthError, TokenError, User, UserRepository};

/// Checks a presented reset token before the new-password form is shown.
pub struct ValidateResetTokenAction<U: UserRepository> {
    user_repository: U,
}

impl<U: UserRepository> ValidateResetTokenAction<U> {
    pub fn new(user_repository: U) -> Self {
        ValidateResetTokenAction { user_repository }
    }

    pub async fn execute(&self, email: &str, token: &str) -> Result<User, AuthError> {
        self.execute_at(email, token, Utc::now()).await
    }

    /// Fails closed with the first of: email not found, already used,
    /// mismatch, expired.
    pub async fn execute_at(
        &self,
        email: &str,
        token: &str,
        now: DateTime<Utc>,
    ) -> Result<User, AuthError> {
        let email = normalize_email(email);
        let user = self
            .user_repository
            .find_user_by_email(&email)
            .await?
            .ok_or(TokenError::EmailNotFound)?;
        check_token(&user, token, now)?;
        Ok(user)
    }
}

fn check_token(user: &User, token: &str, now: DateTime<Utc>) -> Result<(), TokenError> {
    if user.token_used {
        return Err(TokenError::AlreadyUsed);
    }
    let matches = user
        .reset_token
        .as_deref()
        .is_some_and(|stored| constant_time_eq(stored.as_bytes(), hash_token(token).as_bytes()));
    if !matches {
        return Err(TokenError::Mismatch);
    }
    match user.token_expires_at {
        Some(expires_at) if now <= expires_at => Ok(()),
        _ => Err(TokenError::Expired),
    }
}

/// Sets a new password through a valid reset token.
pub struct ResetPasswordAction<U: UserRepository, H: PasswordHasher = Sha256SaltedHasher> {
    user_repository: U,
    hasher: H,
    policy: PasswordPolicy,
}

impl<U: UserRepository> ResetPasswordAction<U> {
    pub fn new(user_repository: U) -> Self {
        ResetPasswordAction {
            user_repository,
            hasher: Sha256SaltedHasher,
            policy: PasswordPolicy::default(),
        }
    }
}

impl<U: UserRepository, H: PasswordHasher> ResetPasswordAction<U, H> {
    pub fn with_hasher<H2: PasswordHasher>(self, hasher: H2) -> ResetPasswordAction<U, H2> {
        ResetPasswordAction {
            user_repository: self.user_repository,
            hasher,
            policy: self.policy,
        }
    }

    #[must_use]
    pub fn with_policy(mut self, policy: PasswordPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub async fn execute(
        &self,
        email: &str,
        token: &str,
        new_password: &str,
        confirmation: &str,
    ) -> Result<(), AuthError> {
        self.execute_at(email, token, new_password, confirmation, Utc::now())
            .await
    }

    /// The token is checked again, then the confirmation, then the policy.
    /// The store is written only when all three pass, and in a single
    /// statement that also consumes the token.
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(name = "reset_password", skip_all, err)
    )]
    pub async fn execute_at(
        &self,
        email: &str,
        token: &str,
        new_password: &str,
        confirmation: &str,
        now: DateTime<Utc>,
    ) -> Result<(), AuthError> {
        let email = normalize_email(email);
        let user = self
            .user_repository
            .find_user_by_email(&email)
            .await?
            .ok_or(TokenError::EmailNotFound)?;
        check_token(&user, token, now)?;

        if new_password != confirmation {
            return Err(ValidationError::PasswordConfirmationMismatch.into());
        }
        self.policy.validate(new_password)?;

        let password_hash = self.hasher.hash(new_password, &user.salt);
        let updated = self
            .user_repository
            .consume_reset_token(&user.email, &hash_token(token), &password_hash)
            .await?;
        if updated == 0 {
            log::warn!(target: "rdx_dash", "msg=\"reset token consumed concurrently\" user_id={}", user.id);
            return Err(TokenError::AlreadyUsed.into());
        }

        log::info!(target: "rdx_dash", "msg=\"password reset completed\" user_id={}", user.id);
        dispatch(AuthEvent::PasswordResetCompleted {
            email: user.email,
            at: Utc::now(),
        })
        .await;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::*;
    use crate::MockUserRepository;

    const TOKEN: &str = "k3J9aQ2mX7pL0vR5tY8wZ1";

    fn user_with_token(expires_at: DateTime<Utc>, used: bool) -> User {
        User {
            reset_token: Some(hash_token(TOKEN)),
            token_expires_at: Some(expires_at),
            token_used: used,
            ..User::mock_from_credentials("ana@x.com", "OldPass1!")
        }
    }

    fn repo(user: User) -> MockUserRepository {
        MockUserRepository::with_users(vec![user])
    }

    #[tokio::test]
    async fn test_validate_order() {
        let now = Utc::now();
        let action = ValidateResetTokenAction::new(repo(user_with_token(now - Duration::minutes(1), true)));

        assert_eq!(
            action.execute_at("bob@x.com", TOKEN, now).await.unwrap_err(),
            AuthError::Token(TokenError::EmailNotFound)
        );
        // used wins over mismatch and expiry
        assert_eq!(
            action.execute_at("ana@x.com", "wrong", now).await.unwrap_err(),
            AuthError::Token(TokenError::AlreadyUsed)
        );

        let action = ValidateResetTokenAction::new(repo(user_with_token(now - Duration::minutes(1), false)));
        // mismatch wins over expiry
        assert_eq!(
            action.execute_at("ana@x.com", "wrong", now).await.unwrap_err(),
            AuthError::Token(TokenError::Mismatch)
        );
        assert_eq!(
            action.execute_at("ana@x.com", TOKEN, now).await.unwrap_err(),
            AuthError::Token(TokenError::Expired)
        );
    }

    #[tokio::test]
    async fn test_validate_at_expiry_instant_passes() {
        let now = Utc::now();
        let action = ValidateResetTokenAction::new(repo(user_with_token(now, false)));
        assert!(action.execute_at("ana@x.com", TOKEN, now).await.is_ok());
        assert_eq!(
            action
                .execute_at("ana@x.com", TOKEN, now + Duration::seconds(1))
                .await
                .unwrap_err(),
            AuthError::Token(TokenError::Expired)
        );
    }

    #[tokio::test]
    async fn test_never_issued_token_is_used() {
        let action = ValidateResetTokenAction::new(repo(User::mock_from_email("ana@x.com")));
        assert_eq!(
            action.execute("ana@x.com", TOKEN).await.unwrap_err(),
            AuthError::Token(TokenError::AlreadyUsed)
        );
    }

    #[tokio::test]
    async fn test_reset_password_success() {
        let now = Utc::now();
        let user = user_with_token(now + Duration::minutes(10), false);
        let salt = user.salt.clone();
        let repo = repo(user);
        let action = ResetPasswordAction::new(repo.clone());

        action
            .execute_at("ana@x.com", TOKEN, "NewPass1!", "NewPass1!", now)
            .await
            .unwrap();

        let stored = repo.find_user_by_email("ana@x.com").await.unwrap().unwrap();
        assert!(stored.token_used);
        assert_eq!(stored.salt, salt);
        assert!(Sha256SaltedHasher.verify("NewPass1!", &salt, &stored.password_hash));

        assert_eq!(
            action
                .execute_at("ana@x.com", TOKEN, "Other1!x", "Other1!x", now)
                .await
                .unwrap_err(),
            AuthError::Token(TokenError::AlreadyUsed)
        );
    }

    #[tokio::test]
    async fn test_confirmation_checked_before_policy() {
        let now = Utc::now();
        let repo = repo(user_with_token(now + Duration::minutes(10), false));
        let action = ResetPasswordAction::new(repo.clone());

        assert_eq!(
            action
                .execute_at("ana@x.com", TOKEN, "abc", "abd", now)
                .await
                .unwrap_err(),
            AuthError::Validation(ValidationError::PasswordConfirmationMismatch)
        );
        assert_eq!(
            action
                .execute_at("ana@x.com", TOKEN, "abc12!", "abc12!", now)
                .await
                .unwrap_err(),
            AuthError::Validation(ValidationError::PasswordMissingUppercase)
        );

        let stored = repo.find_user_by_email("ana@x.com").await.unwrap().unwrap();
        assert!(!stored.token_used);
        assert!(Sha256SaltedHasher.verify("OldPass1!", &stored.salt, &stored.password_hash));
    }

    #[tokio::test]
    async fn test_expired_token_blocks_reset() {
        let now = Utc::now();
        let repo = repo(user_with_token(now - Duration::seconds(1), false));
        let action = ResetPasswordAction::new(repo);

        assert_eq!(
            action
                .execute_at("ana@x.com", TOKEN, "NewPass1!", "NewPass1!", now)
                .await
                .unwrap_err(),
            AuthError::Token(TokenError::Expired)
        );
    }

    #[tokio::test]
    async fn test_token_consumed_between_check_and_write() {
        let now = Utc::now();
        let repo = repo(user_with_token(now + Duration::minutes(10), false));
        let action = ResetPasswordAction::new(repo.clone());

        // another request consumed the token after ours read the row
        let user = repo.find_user_by_email("ana@x.com").await.unwrap().unwrap();
        check_token(&user, TOKEN, now).unwrap();
        repo.mark_token_used("ana@x.com").await.unwrap();

        let updated = repo
            .consume_reset_token("ana@x.com", &hash_token(TOKEN), "x")
            .await
            .unwrap();
        assert_eq!(updated, 0);
        assert_eq!(
            action
                .execute_at("ana@x.com", TOKEN, "NewPass1!", "NewPass1!", now)
                .await
                .unwrap_err(),
            AuthError::Token(TokenError::AlreadyUsed)
        );
    }
}
