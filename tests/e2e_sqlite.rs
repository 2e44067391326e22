// these tests use #[serial] to run sequentially because setup_db() recreates
// the database each time. without serial, parallel tests would interfere
// with each other's data.
#![allow(clippy::indexing_slicing)]

//! End-to-end tests for `SQLite` repositories.
//!
//! These tests use an in-memory `SQLite` database.
//! Run with: `cargo test --features sqlx_sqlite --test e2e_sqlite`

#![cfg(feature = "sqlx_sqlite")]
#![allow(clippy::unwrap_used, clippy::expect_used)]

use chrono::{Duration, TimeZone, Utc};
use rdx_dash::actions::{
    ForgotPasswordAction, LoginAction, PresetsAction, ResetPasswordAction,
    ValidateResetTokenAction,
};
use rdx_dash::collector::CollectorPreset;
use rdx_dash::crypto::{PasswordHasher, Sha256SaltedHasher, generate_salt, hash_token};
use rdx_dash::mailer::MockResetMailer;
use rdx_dash::session::{InMemoryCarrier, SessionConfig};
use rdx_dash::sqlite::{SqlitePresetRepository, SqliteUserRepository, migrations};
use rdx_dash::{
    AuthError, ContractStatus, NewUser, PresetRepository, Role, SecretString, Session,
    TokenError, UserRepository,
};
use serial_test::serial;
use sqlx::SqlitePool;
use sqlx::sqlite::SqlitePoolOptions;

async fn setup_db() -> SqlitePool {
    // Use in-memory database for testing
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .expect("Failed to connect to in-memory SQLite database");

    migrations::run(&pool)
        .await
        .expect("Failed to run migrations");

    pool
}

fn new_user(email: &str, password: &str, role: Role) -> NewUser {
    let salt = generate_salt();
    NewUser {
        name: "Test User".to_owned(),
        email: email.to_owned(),
        password_hash: Sha256SaltedHasher.hash(password, &salt),
        salt,
        role,
        contract_status: ContractStatus::Active,
    }
}

fn session_of(user_id: i64) -> Session {
    Session {
        logged_in: true,
        email: Some("ana@x.com".to_owned()),
        user_id,
        role: Role::User,
        contract_status: None,
        expiration: i64::MAX,
    }
}

fn session_config() -> SessionConfig {
    SessionConfig {
        secret_key: SecretString::new("e2e-sqlite-secret-key-0123456789abcdef"),
        ..Default::default()
    }
}

#[tokio::test]
#[serial]
async fn test_migrations_are_idempotent() {
    let pool = setup_db().await;
    migrations::run(&pool).await.expect("second run");
}

#[tokio::test]
#[serial]
async fn test_user_repository_crud() {
    let pool = setup_db().await;
    let repo = SqliteUserRepository::new(pool);

    let id = repo
        .insert_user(&new_user("ana@x.com", "secret1", Role::User))
        .await
        .expect("Failed to insert user");
    assert!(id > 0);

    let user = repo
        .find_user_by_email("ana@x.com")
        .await
        .unwrap()
        .expect("User should exist");
    assert_eq!(user.id, id);
    assert_eq!(user.role, Role::User);
    assert_eq!(user.contract_status, ContractStatus::Active);
    assert!(user.token_used);
    assert!(repo.find_user_by_email("nobody@x.com").await.unwrap().is_none());

    let duplicate = repo
        .insert_user(&new_user("ana@x.com", "other", Role::User))
        .await;
    assert_eq!(duplicate.unwrap_err(), AuthError::UserAlreadyExists);

    assert_eq!(repo.update_password("ana@x.com", "newhash").await.unwrap(), 1);
    assert_eq!(repo.update_password("nobody@x.com", "newhash").await.unwrap(), 0);

    assert_eq!(
        repo.update_contract_status("ana@x.com", ContractStatus::Revoked)
            .await
            .unwrap(),
        1
    );
    let user = repo.find_user_by_email("ana@x.com").await.unwrap().unwrap();
    assert_eq!(user.password_hash, "newhash");
    assert_eq!(user.contract_status, ContractStatus::Revoked);

    assert_eq!(repo.delete_user("ana@x.com").await.unwrap(), 1);
    assert_eq!(repo.delete_user("ana@x.com").await.unwrap(), 0);
}

#[tokio::test]
#[serial]
async fn test_list_and_count_users() {
    let pool = setup_db().await;
    let repo = SqliteUserRepository::new(pool);

    repo.insert_user(&new_user("admin@x.com", "pw", Role::Admin))
        .await
        .unwrap();
    repo.insert_user(&new_user("ana@x.com", "pw", Role::User))
        .await
        .unwrap();
    repo.insert_user(&new_user("bruno@x.com", "pw", Role::User))
        .await
        .unwrap();
    repo.update_contract_status("bruno@x.com", ContractStatus::Revoked)
        .await
        .unwrap();

    let users = repo.list_users().await.unwrap();
    let emails: Vec<&str> = users.iter().map(|u| u.email.as_str()).collect();
    assert_eq!(emails, vec!["bruno@x.com", "ana@x.com", "admin@x.com"]);
    assert_eq!(users[2].role, Role::Admin);

    assert_eq!(repo.count_users(None).await.unwrap(), 3);
    assert_eq!(
        repo.count_users(Some(ContractStatus::Active)).await.unwrap(),
        2
    );
    assert_eq!(
        repo.count_users(Some(ContractStatus::Revoked)).await.unwrap(),
        1
    );
}

#[tokio::test]
#[serial]
async fn test_unknown_stored_values_fail_closed() {
    let pool = setup_db().await;
    let repo = SqliteUserRepository::new(pool.clone());
    repo.insert_user(&new_user("ana@x.com", "pw", Role::User))
        .await
        .unwrap();

    sqlx::query("UPDATE users SET access_lvl = 'admin', contract_status = 'paused' WHERE email = ?")
        .bind("ana@x.com")
        .execute(&pool)
        .await
        .unwrap();

    let user = repo.find_user_by_email("ana@x.com").await.unwrap().unwrap();
    assert_eq!(user.role, Role::User);
    assert_eq!(user.contract_status, ContractStatus::Revoked);
}

#[tokio::test]
#[serial]
async fn test_reset_token_is_consumed_once() {
    let pool = setup_db().await;
    let repo = SqliteUserRepository::new(pool);
    repo.insert_user(&new_user("ana@x.com", "pw", Role::User))
        .await
        .unwrap();

    let expires_at = Utc.with_ymd_and_hms(2030, 1, 1, 12, 0, 0).unwrap();
    let token_hash = hash_token("raw-token");
    assert_eq!(
        repo.set_reset_token("ana@x.com", &token_hash, expires_at)
            .await
            .unwrap(),
        1
    );

    let user = repo.find_user_by_email("ana@x.com").await.unwrap().unwrap();
    assert_eq!(user.reset_token.as_deref(), Some(token_hash.as_str()));
    assert_eq!(user.token_expires_at, Some(expires_at));
    assert!(!user.token_used);

    assert_eq!(
        repo.consume_reset_token("ana@x.com", "wrong-hash", "h1")
            .await
            .unwrap(),
        0
    );
    assert_eq!(
        repo.consume_reset_token("ana@x.com", &token_hash, "h1")
            .await
            .unwrap(),
        1
    );
    assert_eq!(
        repo.consume_reset_token("ana@x.com", &token_hash, "h2")
            .await
            .unwrap(),
        0
    );

    let user = repo.find_user_by_email("ana@x.com").await.unwrap().unwrap();
    assert_eq!(user.password_hash, "h1");
    assert!(user.token_used);

    repo.set_reset_token("ana@x.com", &token_hash, expires_at)
        .await
        .unwrap();
    assert_eq!(repo.mark_token_used("ana@x.com").await.unwrap(), 1);
    let user = repo.find_user_by_email("ana@x.com").await.unwrap().unwrap();
    assert!(user.token_used);
}

#[tokio::test]
#[serial]
async fn test_preset_repository() {
    let pool = setup_db().await;
    let users = SqliteUserRepository::new(pool.clone());
    let presets = SqlitePresetRepository::new(pool);

    let ana = users
        .insert_user(&new_user("ana@x.com", "pw", Role::User))
        .await
        .unwrap();
    let bruno = users
        .insert_user(&new_user("bruno@x.com", "pw", Role::User))
        .await
        .unwrap();

    let short = CollectorPreset {
        bars: 20,
        ..Default::default()
    };
    presets
        .save_preset(ana, "morning", &CollectorPreset::default())
        .await
        .unwrap();
    presets.save_preset(ana, "afternoon", &short).await.unwrap();
    presets.save_preset(ana, "morning", &short).await.unwrap();
    presets.save_preset(bruno, "morning", &short).await.unwrap();

    let list = presets.list_presets(ana).await.unwrap();
    let names: Vec<&str> = list.iter().map(|p| p.name.as_str()).collect();
    assert_eq!(names, vec!["afternoon", "morning"]);
    assert_eq!(list[1].config, short);

    assert_eq!(presets.delete_preset(bruno, "afternoon").await.unwrap(), 0);
    assert_eq!(presets.delete_preset(ana, "afternoon").await.unwrap(), 1);

    // presets go with their owner
    users.delete_user("ana@x.com").await.unwrap();
    assert!(presets.list_presets(ana).await.unwrap().is_empty());
    assert_eq!(presets.list_presets(bruno).await.unwrap().len(), 1);
}

#[tokio::test]
#[serial]
async fn test_presets_action_on_sqlite() {
    let pool = setup_db().await;
    let users = SqliteUserRepository::new(pool.clone());
    let ana = users
        .insert_user(&new_user("ana@x.com", "pw", Role::User))
        .await
        .unwrap();

    let action = PresetsAction::new(SqlitePresetRepository::new(pool));
    action
        .save(&session_of(ana), "  daily ", &CollectorPreset::default())
        .await
        .unwrap();

    let found = action.find(&session_of(ana), "daily").await.unwrap();
    assert_eq!(found.config, CollectorPreset::default());
}

#[tokio::test]
#[serial]
async fn test_login_and_reset_flow() {
    let pool = setup_db().await;
    let repo = SqliteUserRepository::new(pool);
    repo.insert_user(&new_user("ana@x.com", "secret1", Role::User))
        .await
        .unwrap();

    let carrier = InMemoryCarrier::new();
    let login = LoginAction::new(repo.clone(), session_config());
    let session = login
        .execute_at(&carrier, "ana@x.com", "secret1", 1_700_000_000)
        .await
        .expect("Login should succeed");
    assert!(session.is_valid(1_700_000_000));
    assert_eq!(
        Session::rehydrate(&carrier).expiration,
        1_700_000_000 + 12 * 3600
    );

    let mailer = MockResetMailer::new();
    let now = Utc::now();
    let token = ForgotPasswordAction::new(repo.clone(), mailer.clone())
        .execute_at("ana@x.com", now)
        .await
        .unwrap()
        .expect("token issued");
    assert_eq!(mailer.sent.lock().unwrap().len(), 1);

    // the store holds the hash, never the token
    let stored = repo.find_user_by_email("ana@x.com").await.unwrap().unwrap();
    assert_ne!(stored.reset_token.as_deref(), Some(token.as_str()));

    ValidateResetTokenAction::new(repo.clone())
        .execute_at("ana@x.com", &token, now + Duration::minutes(5))
        .await
        .expect("token valid");

    let late = ValidateResetTokenAction::new(repo.clone())
        .execute_at("ana@x.com", &token, now + Duration::minutes(16))
        .await;
    assert_eq!(late.unwrap_err(), AuthError::Token(TokenError::Expired));

    ResetPasswordAction::new(repo.clone())
        .execute_at("ana@x.com", &token, "NewPass1!", "NewPass1!", now)
        .await
        .expect("reset succeeds");

    let err = login
        .execute_at(&carrier, "ana@x.com", "secret1", 1_700_000_000)
        .await
        .unwrap_err();
    assert_eq!(err, AuthError::InvalidCredentials);
    login
        .execute_at(&carrier, "ana@x.com", "NewPass1!", 1_700_000_000)
        .await
        .expect("new password works");
}
