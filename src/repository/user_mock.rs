#![allow(clippy::unwrap_used)]

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use crate::AuthError;
use crate::session::ContractStatus;

use super::user::{NewUser, User, UserRepository};

#[derive(Clone)]
pub struct MockUserRepository {
    pub users: Arc<Mutex<Vec<User>>>,
    unavailable: Arc<AtomicBool>,
}

impl MockUserRepository {
    pub fn new() -> Self {
        Self {
            users: Arc::new(Mutex::new(vec![])),
            unavailable: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn with_users(users: Vec<User>) -> Self {
        let repo = Self::new();
        *repo.users.lock().unwrap() = users;
        repo
    }

    /// Makes every subsequent call fail as if the database were down.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    fn check_available(&self) -> Result<(), AuthError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(AuthError::DatabaseError("connection refused".to_owned()));
        }
        Ok(())
    }

    fn update_where(&self, email: &str, f: impl FnOnce(&mut User)) -> u64 {
        let mut users = self.users.lock().unwrap();
        match users.iter_mut().find(|u| u.email == email) {
            Some(user) => {
                f(user);
                1
            }
            None => 0,
        }
    }
}

impl Default for MockUserRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl UserRepository for MockUserRepository {
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, AuthError> {
        self.check_available()?;
        let users = self.users.lock().unwrap();
        Ok(users.iter().find(|u| u.email == email).cloned())
    }

    async fn update_password(&self, email: &str, password_hash: &str) -> Result<u64, AuthError> {
        self.check_available()?;
        Ok(self.update_where(email, |user| {
            password_hash.clone_into(&mut user.password_hash);
        }))
    }

    async fn set_reset_token(
        &self,
        email: &str,
        token_hash: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<u64, AuthError> {
        self.check_available()?;
        Ok(self.update_where(email, |user| {
            user.reset_token = Some(token_hash.to_owned());
            user.token_expires_at = Some(expires_at);
            user.token_used = false;
        }))
    }

    async fn mark_token_used(&self, email: &str) -> Result<u64, AuthError> {
        self.check_available()?;
        Ok(self.update_where(email, |user| user.token_used = true))
    }

    async fn consume_reset_token(
        &self,
        email: &str,
        token_hash: &str,
        password_hash: &str,
    ) -> Result<u64, AuthError> {
        self.check_available()?;
        let mut users = self.users.lock().unwrap();
        let Some(user) = users.iter_mut().find(|u| {
            u.email == email && !u.token_used && u.reset_token.as_deref() == Some(token_hash)
        }) else {
            return Ok(0);
        };
        password_hash.clone_into(&mut user.password_hash);
        user.token_used = true;
        Ok(1)
    }

    async fn insert_user(&self, new_user: &NewUser) -> Result<i64, AuthError> {
        self.check_available()?;
        let mut users = self.users.lock().unwrap();
        if users.iter().any(|u| u.email == new_user.email) {
            return Err(AuthError::UserAlreadyExists);
        }
        let id = users.iter().map(|u| u.id).max().unwrap_or(0) + 1;
        users.push(User {
            id,
            name: new_user.name.clone(),
            email: new_user.email.clone(),
            password_hash: new_user.password_hash.clone(),
            salt: new_user.salt.clone(),
            role: new_user.role,
            contract_status: new_user.contract_status,
            reset_token: None,
            token_expires_at: None,
            token_used: true,
            created_at: Utc::now(),
        });
        Ok(id)
    }

    async fn update_contract_status(
        &self,
        email: &str,
        status: ContractStatus,
    ) -> Result<u64, AuthError> {
        self.check_available()?;
        Ok(self.update_where(email, |user| user.contract_status = status))
    }

    async fn delete_user(&self, email: &str) -> Result<u64, AuthError> {
        self.check_available()?;
        let mut users = self.users.lock().unwrap();
        let len_before = users.len();
        users.retain(|u| u.email != email);
        Ok((len_before - users.len()) as u64)
    }

    async fn list_users(&self) -> Result<Vec<User>, AuthError> {
        self.check_available()?;
        let mut users = self.users.lock().unwrap().clone();
        users.sort_by(|a, b| b.id.cmp(&a.id));
        Ok(users)
    }

    async fn count_users(&self, status: Option<ContractStatus>) -> Result<i64, AuthError> {
        self.check_available()?;
        let users = self.users.lock().unwrap();
        let count = users
            .iter()
            .filter(|u| status.is_none_or(|s| u.contract_status == s))
            .count();
        Ok(count as i64)
    }
}
