//! Session lifecycle scenarios across login, the gates, admin actions,
//! password reset and logout.
//!
//! Run with: `cargo test --features mocks --test session_lifecycle`

#![cfg(feature = "mocks")]
#![allow(clippy::unwrap_used, clippy::expect_used)]

use chrono::{Duration, Utc};
use rdx_dash::actions::{
    CreateUserAction, CreateUserInput, ForgotPasswordAction, LoginAction, LogoutAction,
    ResetPasswordAction, UpdateContractStatusAction, ValidateResetTokenAction,
};
use rdx_dash::gate::{self, GateRejection, Route};
use rdx_dash::mailer::MockResetMailer;
use rdx_dash::session::{InMemoryCarrier, SessionConfig, SignedCarrier};
use rdx_dash::{
    AuthError, ContractStatus, MockUserRepository, Role, SecretString, Session, TokenError, User,
};

const NOW: i64 = 1_700_000_000;

fn config() -> SessionConfig {
    SessionConfig {
        secret_key: SecretString::new("session-lifecycle-secret-0123456789abcdef"),
        ..Default::default()
    }
}

fn signed_carrier() -> SignedCarrier<InMemoryCarrier> {
    SignedCarrier::new(InMemoryCarrier::new(), config().secret_key)
}

fn admin_session() -> Session {
    Session {
        logged_in: true,
        email: Some("admin@x.com".to_owned()),
        user_id: 99,
        role: Role::Admin,
        contract_status: Some(ContractStatus::Active),
        expiration: i64::MAX,
    }
}

async fn create_ana(repo: &MockUserRepository) {
    CreateUserAction::new(repo.clone())
        .execute(
            &admin_session(),
            CreateUserInput {
                name: "Ana".to_owned(),
                email: "ana@x.com".to_owned(),
                password: "Abcdef1!".to_owned(),
                contract_status: ContractStatus::Active,
            },
        )
        .await
        .expect("admin creates Ana");
}

#[test]
fn validity_boundaries() {
    for expiration in [NOW - 1, NOW, NOW + 1, 0] {
        let session = Session {
            expiration,
            ..admin_session()
        };
        let expected = expiration != 0 && expiration > NOW;
        assert_eq!(session.is_valid(NOW), expected, "expiration={expiration}");
    }
}

#[tokio::test]
async fn created_user_logs_in_but_cannot_open_admin() {
    let repo = MockUserRepository::new();
    create_ana(&repo).await;

    let carrier = signed_carrier();
    let session = LoginAction::new(repo.clone(), config())
        .execute_at(&carrier, "ana@x.com", "Abcdef1!", NOW)
        .await
        .unwrap();
    assert!(session.is_valid(NOW));
    assert_eq!(session.role, Role::User);
    assert_eq!(session.expiration, NOW + config().session_lifetime.num_seconds());

    let page = gate::authorize(&carrier, NOW + 1).unwrap();
    assert_eq!(page.email.as_deref(), Some("ana@x.com"));
    assert_eq!(
        gate::authorize_admin(&carrier, NOW + 1).unwrap_err(),
        GateRejection::Denied(AuthError::PermissionDenied)
    );
}

#[tokio::test]
async fn revoked_user_still_logs_in_by_default() {
    let repo = MockUserRepository::new();
    create_ana(&repo).await;
    UpdateContractStatusAction::new(repo.clone())
        .execute(&admin_session(), "ana@x.com", ContractStatus::Revoked)
        .await
        .unwrap();

    let session = LoginAction::new(repo.clone(), config())
        .execute_at(&signed_carrier(), "ana@x.com", "Abcdef1!", NOW)
        .await
        .unwrap();
    assert_eq!(session.contract_status, Some(ContractStatus::Revoked));

    let strict = SessionConfig {
        deny_revoked_login: true,
        ..config()
    };
    let carrier = signed_carrier();
    let err = LoginAction::new(repo, strict)
        .execute_at(&carrier, "ana@x.com", "Abcdef1!", NOW)
        .await
        .unwrap_err();
    assert_eq!(err, AuthError::AccessRevoked);
    assert!(gate::authorize(&carrier, NOW).is_err());
}

#[tokio::test]
async fn failed_login_leaves_store_untouched_and_client_logged_out() {
    let repo = MockUserRepository::with_users(vec![User::mock_from_credentials(
        "ana@x.com",
        "Abcdef1!",
    )]);
    let before = serde_json::to_string(&*repo.users.lock().unwrap()).unwrap();

    let carrier = signed_carrier();
    let login = LoginAction::new(repo.clone(), config());
    login
        .execute_at(&carrier, "ana@x.com", "Abcdef1!", NOW)
        .await
        .unwrap();

    for (email, password) in [("ana@x.com", "wrong"), ("nobody@x.com", "Abcdef1!")] {
        let err = login
            .execute_at(&carrier, email, password, NOW)
            .await
            .unwrap_err();
        assert_eq!(err, AuthError::InvalidCredentials);

        let session = Session::rehydrate(&carrier);
        assert!(!session.logged_in);
        assert_eq!(session.expiration, 0);
    }

    let after = serde_json::to_string(&*repo.users.lock().unwrap()).unwrap();
    assert_eq!(before, after);
}

#[tokio::test]
async fn logout_then_gate_redirects() {
    let repo = MockUserRepository::new();
    create_ana(&repo).await;

    let carrier = signed_carrier();
    LoginAction::new(repo, config())
        .execute_at(&carrier, "ana@x.com", "Abcdef1!", NOW)
        .await
        .unwrap();

    let route = LogoutAction::new().execute(&carrier).await.unwrap();
    assert_eq!(route, Route::Login);
    assert_eq!(
        gate::authorize(&carrier, NOW).unwrap_err(),
        GateRejection::Redirect(Route::Login)
    );
}

#[tokio::test]
async fn session_expires_after_lifetime() {
    let repo = MockUserRepository::new();
    create_ana(&repo).await;

    let carrier = signed_carrier();
    let session = LoginAction::new(repo, config())
        .execute_at(&carrier, "ana@x.com", "Abcdef1!", NOW)
        .await
        .unwrap();

    assert!(gate::authorize(&carrier, session.expiration - 1).is_ok());
    assert_eq!(
        gate::authorize(&carrier, session.expiration).unwrap_err(),
        GateRejection::Redirect(Route::Login)
    );
    // the expired check also cleared the carrier
    assert!(gate::authorize(&carrier, NOW).is_err());
}

#[tokio::test]
async fn reset_token_is_accepted_once() {
    let repo = MockUserRepository::new();
    create_ana(&repo).await;
    let mailer = MockResetMailer::new();
    let now = Utc::now();

    let token = ForgotPasswordAction::new(repo.clone(), mailer.clone())
        .execute_at("ana@x.com", now)
        .await
        .unwrap()
        .unwrap();
    assert!(mailer.last().unwrap().link.contains(&token));

    let validate = ValidateResetTokenAction::new(repo.clone());
    validate.execute_at("ana@x.com", &token, now).await.unwrap();

    ResetPasswordAction::new(repo.clone())
        .execute_at("ana@x.com", &token, "Newpass1!", "Newpass1!", now)
        .await
        .unwrap();

    assert_eq!(
        validate.execute_at("ana@x.com", &token, now).await.unwrap_err(),
        AuthError::Token(TokenError::AlreadyUsed)
    );

    let session = LoginAction::new(repo, config())
        .execute_at(&signed_carrier(), "ana@x.com", "Newpass1!", NOW)
        .await
        .unwrap();
    assert!(session.is_valid(NOW));
}

#[tokio::test]
async fn expired_reset_token_is_rejected() {
    let repo = MockUserRepository::new();
    create_ana(&repo).await;
    let issued = Utc::now() - Duration::hours(1);

    let token = ForgotPasswordAction::new(repo.clone(), MockResetMailer::new())
        .execute_at("ana@x.com", issued)
        .await
        .unwrap()
        .unwrap();

    let err = ResetPasswordAction::new(repo.clone())
        .execute("ana@x.com", &token, "Newpass1!", "Newpass1!")
        .await
        .unwrap_err();
    assert_eq!(err, AuthError::Token(TokenError::Expired));

    // the old password still works
    LoginAction::new(repo, config())
        .execute_at(&signed_carrier(), "ana@x.com", "Abcdef1!", NOW)
        .await
        .unwrap();
}

#[tokio::test]
async fn unknown_email_gets_no_token() {
    let repo = MockUserRepository::new();
    let mailer = MockResetMailer::new();

    let issued = ForgotPasswordAction::new(repo, mailer.clone())
        .execute("nobody@x.com")
        .await
        .unwrap();
    assert!(issued.is_none());
    assert!(mailer.last().is_none());
}
