use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::AuthError;
use crate::session::{ContractStatus, Role};

/// A row of the `users` table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub name: String,
    /// Stored trimmed and lower-cased; the lookup key for every query.
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    #[serde(skip_serializing)]
    pub salt: String,
    pub role: Role,
    pub contract_status: ContractStatus,
    /// SHA-256 of the outstanding reset token, if one was ever issued.
    #[serde(skip_serializing)]
    pub reset_token: Option<String>,
    #[serde(skip_serializing)]
    pub token_expires_at: Option<DateTime<Utc>>,
    /// True unless a reset token is outstanding. Fresh accounts start at true.
    #[serde(skip_serializing)]
    pub token_used: bool,
    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn is_active(&self) -> bool {
        self.contract_status == ContractStatus::Active
    }
}

#[cfg(any(test, feature = "mocks"))]
impl User {
    pub fn mock() -> Self {
        Self::mock_from_email("test@example.com")
    }

    pub fn mock_from_email(email: &str) -> Self {
        User {
            id: 1,
            name: "Test User".to_owned(),
            email: email.to_owned(),
            password_hash: "fakehashedpassword".to_owned(),
            salt: "fakesalt".to_owned(),
            role: Role::User,
            contract_status: ContractStatus::Active,
            reset_token: None,
            token_expires_at: None,
            token_used: true,
            created_at: Utc::now(),
        }
    }

    /// A user whose stored hash matches `password` under the default hasher.
    pub fn mock_from_credentials(email: &str, password: &str) -> Self {
        use crate::crypto::{PasswordHasher, Sha256SaltedHasher, generate_salt};

        let salt = generate_salt();
        User {
            password_hash: Sha256SaltedHasher.hash(password, &salt),
            salt,
            ..Self::mock_from_email(email)
        }
    }
}

/// Input for [`UserRepository::insert_user`].
#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub salt: String,
    pub role: Role,
    pub contract_status: ContractStatus,
}

/// What the admin page shows about a user. Never carries hash, salt or token.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UserSummary {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub contract_status: ContractStatus,
    pub created_at: DateTime<Utc>,
}

impl From<User> for UserSummary {
    fn from(user: User) -> Self {
        UserSummary {
            id: user.id,
            name: user.name,
            email: user.email,
            role: user.role,
            contract_status: user.contract_status,
            created_at: user.created_at,
        }
    }
}

/// Credential store.
///
/// Every method addresses rows by email. Methods returning `u64` report the
/// number of rows affected and leave it to the caller to decide whether zero
/// is an error. Any connectivity or query failure is `AuthError::DatabaseError`.
#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, AuthError>;

    async fn update_password(&self, email: &str, password_hash: &str) -> Result<u64, AuthError>;

    /// Stores a reset token hash with its expiry and marks it unused.
    async fn set_reset_token(
        &self,
        email: &str,
        token_hash: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<u64, AuthError>;

    async fn mark_token_used(&self, email: &str) -> Result<u64, AuthError>;

    /// Swaps the password hash and marks the token used in one statement,
    /// only if `token_hash` is still the outstanding unused token.
    async fn consume_reset_token(
        &self,
        email: &str,
        token_hash: &str,
        password_hash: &str,
    ) -> Result<u64, AuthError>;

    /// Returns the new row id.
    async fn insert_user(&self, user: &NewUser) -> Result<i64, AuthError>;

    async fn update_contract_status(
        &self,
        email: &str,
        status: ContractStatus,
    ) -> Result<u64, AuthError>;

    async fn delete_user(&self, email: &str) -> Result<u64, AuthError>;

    /// Newest first.
    async fn list_users(&self) -> Result<Vec<User>, AuthError>;

    /// Counts all users, or only those with the given status.
    async fn count_users(&self, status: Option<ContractStatus>) -> Result<i64, AuthError>;
}
