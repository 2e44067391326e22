#![allow(
    clippy::print_stdout,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::missing_docs_in_private_items,
    clippy::doc_markdown
)]

//! Dashboard server example
//!
//! Serves the whole dashboard from a local SQLite file with a seeded admin
//! account. Reset links are written to the log instead of being emailed, and
//! market data comes from a canned in-memory source.
//!
//! Run with: `SESSION_SECRET=$(openssl rand -hex 32) cargo run --example dashboard_server`
//! With a real analyst: `OPENAI_API_KEY=... cargo run --example dashboard_server --features openai`
//!
//! Try it:
//!   curl -X POST http://localhost:8080/login \
//!     -H "Content-Type: application/json" \
//!     -d '{"email": "admin@example.com", "password": "changeme123"}' \
//!     -c cookies.txt
//!
//!   curl http://localhost:8080/dashboard -b cookies.txt
//!   curl http://localhost:8080/admin -b cookies.txt
//!   curl -X POST http://localhost:8080/dashboard/analysis -b cookies.txt \
//!     -H "Content-Type: application/json" -d '{}'

use actix_web::{App, HttpServer, web};
use chrono::{Duration, Utc};
use rdx_dash::api::actix::dashboard_app;
use rdx_dash::collector::{Analyst, Bar, CollectorPreset, MockMarketDataSource};
use rdx_dash::config::AppConfig;
use rdx_dash::crypto::{PasswordHasher, Sha256SaltedHasher, generate_salt};
use rdx_dash::events::listeners::LoggingListener;
use rdx_dash::mailer::LogMailer;
use rdx_dash::sqlite::{SqlitePresetRepository, SqliteUserRepository, create_repositories};
use rdx_dash::{ContractStatus, NewUser, Role, UserRepository, register_event_listeners};
use sqlx::sqlite::SqlitePoolOptions;
use tracing_subscriber::EnvFilter;

const ADMIN_EMAIL: &str = "admin@example.com";
const ADMIN_PASSWORD: &str = "changeme123";

fn canned_bars(symbol: &str, exchange: &str, base: f64) -> Vec<Bar> {
    let start = Utc::now() - Duration::hours(24);
    (0..24)
        .map(|i| {
            let open = base + f64::from(i) * 0.5;
            Bar {
                symbol: symbol.to_string(),
                exchange: exchange.to_string(),
                datetime: start + Duration::hours(i64::from(i)),
                open,
                high: open + 1.0,
                low: open - 1.0,
                close: open + 0.25,
                volume: 1000.0 + f64::from(i),
            }
        })
        .collect()
}

fn market_source() -> MockMarketDataSource {
    let mut source = MockMarketDataSource::new();
    for instrument in CollectorPreset::default().instruments() {
        source = source.with_bars(
            &instrument.to_string(),
            canned_bars(&instrument.symbol, &instrument.exchange, 100.0),
        );
    }
    source
}

#[cfg(feature = "openai")]
fn analyst(config: &AppConfig) -> rdx_dash::collector::OpenAiAnalyst {
    use rdx_dash::collector::{OpenAiAnalyst, OpenAiConfig};

    OpenAiAnalyst::new(OpenAiConfig::new(config.openai_api_key.clone()))
        .expect("OPENAI_API_KEY must be set with the openai feature")
}

#[cfg(not(feature = "openai"))]
fn analyst(_config: &AppConfig) -> rdx_dash::collector::MockAnalyst {
    rdx_dash::collector::MockAnalyst::new(
        r#"{"trend_summary": "Demo analyst, no model was called.", "trade_ideas": []}"#,
    )
}

async fn seed_admin(user_repo: &SqliteUserRepository) {
    if user_repo
        .find_user_by_email(ADMIN_EMAIL)
        .await
        .expect("user lookup")
        .is_some()
    {
        return;
    }

    let salt = generate_salt();
    let admin = NewUser {
        name: "Admin".to_string(),
        email: ADMIN_EMAIL.to_string(),
        password_hash: Sha256SaltedHasher.hash(ADMIN_PASSWORD, &salt),
        salt,
        role: Role::Admin,
        contract_status: ContractStatus::Active,
    };
    user_repo.insert_user(&admin).await.expect("seed admin");
}

async fn serve<A>(config: AppConfig, analyst: A) -> std::io::Result<()>
where
    A: Analyst + Clone + 'static,
{
    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect("sqlite:rdx_dash.db?mode=rwc")
        .await
        .expect("open rdx_dash.db");
    rdx_dash::sqlite::migrations::run(&pool)
        .await
        .expect("run migrations");

    let (user_repo, preset_repo) = create_repositories(pool);
    seed_admin(&user_repo).await;

    let source = market_source();
    let session_config = config.session;
    let reset_config = config.reset;

    println!("Starting dashboard on http://localhost:8080");
    println!("Admin: {ADMIN_EMAIL} / {ADMIN_PASSWORD}");

    HttpServer::new(move || {
        App::new()
            .app_data(web::Data::new(user_repo.clone()))
            .app_data(web::Data::new(preset_repo.clone()))
            .app_data(web::Data::new(LogMailer))
            .app_data(web::Data::new(source.clone()))
            .app_data(web::Data::new(analyst.clone()))
            .app_data(web::Data::new(session_config.clone()))
            .app_data(web::Data::new(reset_config.clone()))
            .configure(
                dashboard_app::<
                    SqliteUserRepository,
                    SqlitePresetRepository,
                    LogMailer,
                    MockMarketDataSource,
                    A,
                >,
            )
    })
    .bind("127.0.0.1:8080")?
    .run()
    .await
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // also picks up the `log` records emitted by the library
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();
    register_event_listeners(|registry| {
        registry.listen(LoggingListener::new());
    });

    let mut config = AppConfig::from_env();
    // plain HTTP on localhost
    config.session.cookie_secure = false;
    if let Err(reason) = config.session.validate() {
        log::error!(target: "rdx_dash", "msg=\"invalid session config, set SESSION_SECRET\" reason=\"{reason}\"");
        return Err(std::io::Error::new(std::io::ErrorKind::InvalidInput, reason));
    }

    let analyst = analyst(&config);
    serve(config, analyst).await
}
