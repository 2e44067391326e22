//! User management for the admin page.
//!
//! Every action takes the acting [`Session`] and applies the role gate itself,
//! so a handler that forgot to call it still cannot reach the store.

use chrono::Utc;

use crate::crypto::{PasswordHasher, Sha256SaltedHasher, generate_salt};
use crate::events::{AuthEvent, dispatch};
use crate::gate::require_admin;
use crate::validators::{PasswordPolicy, ValidationError, normalize_email, validate_email, validate_name};
use crate::{AuthError, ContractStatus, NewUser, Role, Session, UserRepository, UserSummary};

fn actor_email(actor: &Session) -> String {
    actor.email.clone().unwrap_or_default()
}

#[derive(Debug, Clone)]
pub struct CreateUserInput {
    pub name: String,
    pub email: String,
    pub password: String,
    pub contract_status: ContractStatus,
}

pub struct CreateUserAction<U: UserRepository, H: PasswordHasher = Sha256SaltedHasher> {
    user_repository: U,
    hasher: H,
    policy: PasswordPolicy,
}

impl<U: UserRepository> CreateUserAction<U> {
    pub fn new(user_repository: U) -> Self {
        CreateUserAction {
            user_repository,
            hasher: Sha256SaltedHasher,
            policy: PasswordPolicy::lenient(),
        }
    }
}

impl<U: UserRepository, H: PasswordHasher> CreateUserAction<U, H> {
    /// Initial passwords only need the minimum length unless a stricter
    /// policy is set here.
    #[must_use]
    pub fn with_policy(mut self, policy: PasswordPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Creates a `User`-role account with a fresh salt. Returns the new id.
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(name = "create_user", skip_all, err)
    )]
    pub async fn execute(&self, actor: &Session, input: CreateUserInput) -> Result<i64, AuthError> {
        require_admin(actor)?;

        let name = input.name.trim().to_owned();
        let email = normalize_email(&input.email);
        validate_name(&name)?;
        validate_email(&email)?;
        if input.password.is_empty() {
            return Err(ValidationError::PasswordEmpty.into());
        }
        self.policy.validate(&input.password)?;

        if self.user_repository.find_user_by_email(&email).await?.is_some() {
            return Err(AuthError::UserAlreadyExists);
        }

        let salt = generate_salt();
        let new_user = NewUser {
            name,
            email,
            password_hash: self.hasher.hash(&input.password, &salt),
            salt,
            role: Role::User,
            contract_status: input.contract_status,
        };
        let user_id = self.user_repository.insert_user(&new_user).await?;

        log::info!(target: "rdx_dash", "msg=\"user created\" user_id={user_id} by_user_id={}", actor.user_id);
        dispatch(AuthEvent::UserCreated {
            user_id,
            email: new_user.email,
            by: actor_email(actor),
            at: Utc::now(),
        })
        .await;

        Ok(user_id)
    }
}

pub struct UpdateContractStatusAction<U: UserRepository> {
    user_repository: U,
}

impl<U: UserRepository> UpdateContractStatusAction<U> {
    pub fn new(user_repository: U) -> Self {
        UpdateContractStatusAction { user_repository }
    }

    /// Grants (`Active`) or revokes access. Existing sessions of the target
    /// user are not affected until they expire.
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(name = "update_contract_status", skip_all, err)
    )]
    pub async fn execute(
        &self,
        actor: &Session,
        email: &str,
        status: ContractStatus,
    ) -> Result<(), AuthError> {
        require_admin(actor)?;
        let email = normalize_email(email);

        let updated = self
            .user_repository
            .update_contract_status(&email, status)
            .await?;
        if updated == 0 {
            return Err(AuthError::UserNotFound);
        }

        log::info!(target: "rdx_dash", "msg=\"contract status changed\" status={status} by_user_id={}", actor.user_id);
        dispatch(AuthEvent::ContractStatusChanged {
            email,
            status,
            by: actor_email(actor),
            at: Utc::now(),
        })
        .await;

        Ok(())
    }
}

pub struct DeleteUserAction<U: UserRepository> {
    user_repository: U,
}

impl<U: UserRepository> DeleteUserAction<U> {
    pub fn new(user_repository: U) -> Self {
        DeleteUserAction { user_repository }
    }

    /// Removes the account and, through the foreign key, its presets.
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(name = "delete_user", skip_all, err)
    )]
    pub async fn execute(&self, actor: &Session, email: &str) -> Result<(), AuthError> {
        require_admin(actor)?;
        let email = normalize_email(email);

        let deleted = self.user_repository.delete_user(&email).await?;
        if deleted == 0 {
            return Err(AuthError::UserNotFound);
        }

        log::info!(target: "rdx_dash", "msg=\"user deleted\" by_user_id={}", actor.user_id);
        dispatch(AuthEvent::UserDeleted {
            email,
            by: actor_email(actor),
            at: Utc::now(),
        })
        .await;

        Ok(())
    }
}

/// Totals and the user list shown on the admin page.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct AdminOverview {
    pub total_users: i64,
    pub active_users: i64,
    pub users: Vec<UserSummary>,
}

pub struct AdminOverviewAction<U: UserRepository> {
    user_repository: U,
}

impl<U: UserRepository> AdminOverviewAction<U> {
    pub fn new(user_repository: U) -> Self {
        AdminOverviewAction { user_repository }
    }

    pub async fn execute(&self, actor: &Session) -> Result<AdminOverview, AuthError> {
        require_admin(actor)?;

        let total_users = self.user_repository.count_users(None).await?;
        let active_users = self
            .user_repository
            .count_users(Some(ContractStatus::Active))
            .await?;
        let users = self
            .user_repository
            .list_users()
            .await?
            .into_iter()
            .map(UserSummary::from)
            .collect();

        Ok(AdminOverview {
            total_users,
            active_users,
            users,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{MockUserRepository, User};

    fn admin() -> Session {
        Session {
            logged_in: true,
            email: Some("root@x.com".to_owned()),
            user_id: 1,
            role: Role::Admin,
            contract_status: Some(ContractStatus::Active),
            expiration: i64::MAX,
        }
    }

    fn plain_user() -> Session {
        Session {
            role: Role::User,
            email: Some("ana@x.com".to_owned()),
            user_id: 2,
            ..admin()
        }
    }

    fn input(email: &str) -> CreateUserInput {
        CreateUserInput {
            name: " Bruno ".to_owned(),
            email: email.to_owned(),
            password: "secret".to_owned(),
            contract_status: ContractStatus::Active,
        }
    }

    #[tokio::test]
    async fn test_create_user() {
        let repo = MockUserRepository::new();
        let action = CreateUserAction::new(repo.clone());

        let id = action.execute(&admin(), input("Bruno@X.com")).await.unwrap();

        let user = repo.find_user_by_email("bruno@x.com").await.unwrap().unwrap();
        assert_eq!(user.id, id);
        assert_eq!(user.name, "Bruno");
        assert_eq!(user.role, Role::User);
        assert!(user.token_used);
        assert_eq!(user.salt.len(), 32);
        assert!(Sha256SaltedHasher.verify("secret", &user.salt, &user.password_hash));
    }

    #[tokio::test]
    async fn test_create_user_validation() {
        let action = CreateUserAction::new(MockUserRepository::new());

        let mut missing_name = input("b@x.com");
        missing_name.name = "  ".to_owned();
        assert_eq!(
            action.execute(&admin(), missing_name).await.unwrap_err(),
            AuthError::Validation(ValidationError::NameEmpty)
        );

        let mut missing_password = input("b@x.com");
        missing_password.password = String::new();
        assert_eq!(
            action.execute(&admin(), missing_password).await.unwrap_err(),
            AuthError::Validation(ValidationError::PasswordEmpty)
        );

        assert_eq!(
            action.execute(&admin(), input("bruno")).await.unwrap_err(),
            AuthError::Validation(ValidationError::EmailInvalidFormat)
        );
    }

    #[tokio::test]
    async fn test_create_duplicate_user() {
        let repo = MockUserRepository::with_users(vec![User::mock_from_email("bruno@x.com")]);
        let action = CreateUserAction::new(repo);

        assert_eq!(
            action.execute(&admin(), input("bruno@x.com")).await.unwrap_err(),
            AuthError::UserAlreadyExists
        );
    }

    #[tokio::test]
    async fn test_non_admin_rejected_before_store() {
        let repo = MockUserRepository::new();
        repo.set_unavailable(true);

        assert_eq!(
            CreateUserAction::new(repo.clone())
                .execute(&plain_user(), input("b@x.com"))
                .await
                .unwrap_err(),
            AuthError::PermissionDenied
        );
        assert_eq!(
            DeleteUserAction::new(repo.clone())
                .execute(&plain_user(), "b@x.com")
                .await
                .unwrap_err(),
            AuthError::PermissionDenied
        );
        assert_eq!(
            AdminOverviewAction::new(repo)
                .execute(&plain_user())
                .await
                .unwrap_err(),
            AuthError::PermissionDenied
        );
    }

    #[tokio::test]
    async fn test_revoke_and_restore() {
        let repo = MockUserRepository::with_users(vec![User::mock_from_email("ana@x.com")]);
        let action = UpdateContractStatusAction::new(repo.clone());

        action
            .execute(&admin(), "ana@x.com", ContractStatus::Revoked)
            .await
            .unwrap();
        let user = repo.find_user_by_email("ana@x.com").await.unwrap().unwrap();
        assert_eq!(user.contract_status, ContractStatus::Revoked);

        action
            .execute(&admin(), "ana@x.com", ContractStatus::Active)
            .await
            .unwrap();
        let user = repo.find_user_by_email("ana@x.com").await.unwrap().unwrap();
        assert!(user.is_active());

        assert_eq!(
            action
                .execute(&admin(), "nobody@x.com", ContractStatus::Active)
                .await
                .unwrap_err(),
            AuthError::UserNotFound
        );
    }

    #[tokio::test]
    async fn test_delete_user() {
        let repo = MockUserRepository::with_users(vec![User::mock_from_email("ana@x.com")]);
        let action = DeleteUserAction::new(repo.clone());

        action.execute(&admin(), "ana@x.com").await.unwrap();
        assert!(repo.find_user_by_email("ana@x.com").await.unwrap().is_none());
        assert_eq!(
            action.execute(&admin(), "ana@x.com").await.unwrap_err(),
            AuthError::UserNotFound
        );
    }

    #[tokio::test]
    async fn test_overview_counts() {
        let mut revoked = User::mock_from_email("old@x.com");
        revoked.id = 2;
        revoked.contract_status = ContractStatus::Revoked;
        let repo = MockUserRepository::with_users(vec![User::mock_from_email("ana@x.com"), revoked]);

        let overview = AdminOverviewAction::new(repo).execute(&admin()).await.unwrap();
        assert_eq!(overview.total_users, 2);
        assert_eq!(overview.active_users, 1);
        assert_eq!(overview.users[0].email, "old@x.com");

        let json = serde_json::to_string(&overview).unwrap();
        assert!(!json.contains("fakehashedpassword"));
        assert!(!json.contains("fakesalt"));
    }
}
