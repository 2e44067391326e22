use actix_web::cookie::Cookie;
use actix_web::test::TestRequest;
use chrono::{Duration, Utc};

use crate::crypto::{PasswordHasher, Sha256SaltedHasher, generate_salt};
use crate::session::{Carrier, CarrierKey, InMemoryCarrier, SessionConfig, SignedCarrier};
use crate::{AuthError, ContractStatus, NewUser, Role, Session, User, UserRepository};

/// Inserts a user with a known password straight into a repository.
pub struct TestUserBuilder<'a, U> {
    user_repo: &'a U,
    email: String,
    password: String,
    name: String,
    role: Role,
    contract_status: ContractStatus,
}

impl<'a, U> TestUserBuilder<'a, U>
where
    U: UserRepository,
{
    pub fn new(user_repo: &'a U) -> Self {
        Self {
            user_repo,
            email: format!("test-{}@example.com", uuid()),
            password: "testpassword123".to_owned(),
            name: "Test User".to_owned(),
            role: Role::User,
            contract_status: ContractStatus::Active,
        }
    }

    #[must_use]
    pub fn email(mut self, email: impl Into<String>) -> Self {
        self.email = email.into();
        self
    }

    #[must_use]
    pub fn password(mut self, password: impl Into<String>) -> Self {
        self.password = password.into();
        self
    }

    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    #[must_use]
    pub fn admin(mut self) -> Self {
        self.role = Role::Admin;
        self
    }

    #[must_use]
    pub fn revoked(mut self) -> Self {
        self.contract_status = ContractStatus::Revoked;
        self
    }

    pub async fn build(self) -> Result<User, AuthError> {
        let salt = generate_salt();
        let new_user = NewUser {
            name: self.name,
            email: self.email.clone(),
            password_hash: Sha256SaltedHasher.hash(&self.password, &salt),
            salt,
            role: self.role,
            contract_status: self.contract_status,
        };
        self.user_repo.insert_user(&new_user).await?;

        self.user_repo
            .find_user_by_email(&self.email)
            .await?
            .ok_or(AuthError::UserNotFound)
    }
}

/// A live session for `user`, expiring after `lifetime`.
pub fn session_for(user: &User, lifetime: Duration) -> Session {
    Session {
        logged_in: true,
        email: Some(user.email.clone()),
        user_id: user.id,
        role: user.role,
        contract_status: Some(user.contract_status),
        expiration: (Utc::now() + lifetime).timestamp(),
    }
}

pub trait ActingAs {
    /// Attaches the signed carrier cookies for `session`.
    #[must_use]
    fn acting_as(self, session: &Session, config: &SessionConfig) -> Self;
}

impl ActingAs for TestRequest {
    fn acting_as(self, session: &Session, config: &SessionConfig) -> Self {
        let carrier = SignedCarrier::new(InMemoryCarrier::new(), config.secret_key.clone());
        if session.commit(&carrier).is_err() {
            return self;
        }

        CarrierKey::ALL
            .into_iter()
            .filter_map(|key| carrier.inner().get(key).map(|value| (key, value)))
            .fold(self, |req, (key, value)| {
                req.cookie(Cookie::new(config.cookie_name(key), value))
            })
    }
}

fn uuid() -> String {
    use std::time::{SystemTime, UNIX_EPOCH};

    let duration = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default();

    format!("{}{}", duration.as_nanos(), rand_suffix())
}

fn rand_suffix() -> String {
    crate::crypto::generate_token(8).to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MockUserRepository;
    use crate::SecretString;

    #[tokio::test]
    async fn test_user_builder_creates_user() {
        let user_repo = MockUserRepository::new();

        let user = TestUserBuilder::new(&user_repo)
            .email("builder@example.com")
            .password("password123")
            .admin()
            .build()
            .await
            .unwrap();

        assert_eq!(user.email, "builder@example.com");
        assert_eq!(user.role, Role::Admin);
        assert!(Sha256SaltedHasher.verify("password123", &user.salt, &user.password_hash));
    }

    #[tokio::test]
    async fn test_user_builder_default_values() {
        let user_repo = MockUserRepository::new();

        let user = TestUserBuilder::new(&user_repo).build().await.unwrap();

        assert!(user.email.ends_with("@example.com"));
        assert_eq!(user.role, Role::User);
        assert!(user.is_active());
    }

    #[test]
    fn test_acting_as_sets_every_carrier_cookie() {
        let config = SessionConfig {
            secret_key: SecretString::new("acting-as-test-secret-0123456789abcdef"),
            ..Default::default()
        };
        let session = session_for(&User::mock(), Duration::hours(1));

        let req = TestRequest::default()
            .acting_as(&session, &config)
            .to_http_request();

        for key in CarrierKey::ALL {
            assert!(req.cookie(&config.cookie_name(key)).is_some(), "{key:?}");
        }
    }
}
