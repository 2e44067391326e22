use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, MySqlPool};

use crate::{AuthError, ContractStatus, NewUser, Role, User, UserRepository};

#[derive(Clone)]
pub struct MySqlUserRepository {
    pool: MySqlPool,
}

impl MySqlUserRepository {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }
}

const USER_COLUMNS: &str = "id, name, email, password_hash, salt, access_lvl, contract_status, \
     reset_token, token_expires_at, token_used, created_at";

#[derive(FromRow)]
struct UserRecord {
    id: i64,
    name: String,
    email: String,
    password_hash: String,
    salt: String,
    access_lvl: String,
    contract_status: String,
    reset_token: Option<String>,
    token_expires_at: Option<DateTime<Utc>>,
    token_used: bool,
    created_at: DateTime<Utc>,
}

impl From<UserRecord> for User {
    fn from(row: UserRecord) -> Self {
        User {
            id: row.id,
            name: row.name,
            email: row.email,
            password_hash: row.password_hash,
            salt: row.salt,
            role: Role::from_access_level(&row.access_lvl),
            contract_status: ContractStatus::from_store(&row.contract_status),
            reset_token: row.reset_token,
            token_expires_at: row.token_expires_at,
            token_used: row.token_used,
            created_at: row.created_at,
        }
    }
}

fn db_error(operation: &'static str) -> impl FnOnce(sqlx::Error) -> AuthError {
    move |e| {
        log::error!(target: "rdx_dash", "msg=\"database error\", operation=\"{operation}\", error=\"{e}\"");
        AuthError::DatabaseError(e.to_string())
    }
}

#[async_trait]
impl UserRepository for MySqlUserRepository {
    #[cfg_attr(feature = "tracing", tracing::instrument(skip(self, email), err))]
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, AuthError> {
        let row: Option<UserRecord> =
            sqlx::query_as(&format!("SELECT {USER_COLUMNS} FROM users WHERE email = ?"))
                .bind(email)
                .fetch_optional(&self.pool)
                .await
                .map_err(db_error("find_user_by_email"))?;

        Ok(row.map(Into::into))
    }

    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(skip(self, email, password_hash), err)
    )]
    async fn update_password(&self, email: &str, password_hash: &str) -> Result<u64, AuthError> {
        let result = sqlx::query("UPDATE users SET password_hash = ? WHERE email = ?")
            .bind(password_hash)
            .bind(email)
            .execute(&self.pool)
            .await
            .map_err(db_error("update_password"))?;

        Ok(result.rows_affected())
    }

    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(skip(self, email, token_hash), err)
    )]
    async fn set_reset_token(
        &self,
        email: &str,
        token_hash: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<u64, AuthError> {
        let result = sqlx::query(
            "UPDATE users SET reset_token = ?, token_expires_at = ?, token_used = FALSE WHERE email = ?",
        )
        .bind(token_hash)
        .bind(expires_at)
        .bind(email)
        .execute(&self.pool)
        .await
        .map_err(db_error("set_reset_token"))?;

        Ok(result.rows_affected())
    }

    #[cfg_attr(feature = "tracing", tracing::instrument(skip(self, email), err))]
    async fn mark_token_used(&self, email: &str) -> Result<u64, AuthError> {
        let result = sqlx::query("UPDATE users SET token_used = TRUE WHERE email = ?")
            .bind(email)
            .execute(&self.pool)
            .await
            .map_err(db_error("mark_token_used"))?;

        Ok(result.rows_affected())
    }

    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(skip(self, email, token_hash, password_hash), err)
    )]
    async fn consume_reset_token(
        &self,
        email: &str,
        token_hash: &str,
        password_hash: &str,
    ) -> Result<u64, AuthError> {
        let result = sqlx::query(
            "UPDATE users SET password_hash = ?, token_used = TRUE \
             WHERE email = ? AND reset_token = ? AND token_used = FALSE",
        )
        .bind(password_hash)
        .bind(email)
        .bind(token_hash)
        .execute(&self.pool)
        .await
        .map_err(db_error("consume_reset_token"))?;

        Ok(result.rows_affected())
    }

    #[cfg_attr(feature = "tracing", tracing::instrument(skip(self, user), err))]
    async fn insert_user(&self, user: &NewUser) -> Result<i64, AuthError> {
        let result = sqlx::query(
            "INSERT INTO users (name, email, password_hash, salt, access_lvl, contract_status, token_used, created_at) \
             VALUES (?, ?, ?, ?, ?, ?, TRUE, ?)",
        )
        .bind(&user.name)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(&user.salt)
        .bind(user.role.as_str())
        .bind(user.contract_status.as_str())
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db) if db.is_unique_violation() => AuthError::UserAlreadyExists,
            other => db_error("insert_user")(other),
        })?;

        Ok(result.last_insert_id() as i64)
    }

    #[cfg_attr(feature = "tracing", tracing::instrument(skip(self, email), err))]
    async fn update_contract_status(
        &self,
        email: &str,
        status: ContractStatus,
    ) -> Result<u64, AuthError> {
        let result = sqlx::query("UPDATE users SET contract_status = ? WHERE email = ?")
            .bind(status.as_str())
            .bind(email)
            .execute(&self.pool)
            .await
            .map_err(db_error("update_contract_status"))?;

        Ok(result.rows_affected())
    }

    #[cfg_attr(feature = "tracing", tracing::instrument(skip(self, email), err))]
    async fn delete_user(&self, email: &str) -> Result<u64, AuthError> {
        let result = sqlx::query("DELETE FROM users WHERE email = ?")
            .bind(email)
            .execute(&self.pool)
            .await
            .map_err(db_error("delete_user"))?;

        Ok(result.rows_affected())
    }

    #[cfg_attr(feature = "tracing", tracing::instrument(skip(self), err))]
    async fn list_users(&self) -> Result<Vec<User>, AuthError> {
        let rows: Vec<UserRecord> =
            sqlx::query_as(&format!("SELECT {USER_COLUMNS} FROM users ORDER BY id DESC"))
                .fetch_all(&self.pool)
                .await
                .map_err(db_error("list_users"))?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    #[cfg_attr(feature = "tracing", tracing::instrument(skip(self), err))]
    async fn count_users(&self, status: Option<ContractStatus>) -> Result<i64, AuthError> {
        let count: i64 = match status {
            Some(status) => {
                sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM users WHERE contract_status = ?")
                    .bind(status.as_str())
                    .fetch_one(&self.pool)
                    .await
            }
            None => {
                sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM users")
                    .fetch_one(&self.pool)
                    .await
            }
        }
        .map_err(db_error("count_users"))?;

        Ok(count)
    }
}
