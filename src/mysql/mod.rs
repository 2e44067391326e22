//! MySQL backend, the production credential store.

pub mod migrations;
mod preset;
mod user;

use sqlx::MySqlPool;
use sqlx::mysql::MySqlPoolOptions;

use crate::AuthError;
use crate::config::StoreConfig;

pub use preset::MySqlPresetRepository;
pub use user::MySqlUserRepository;

/// Opens a pool for `config`. An unreachable server is a `DatabaseError`,
/// which the pages render as a connectivity message.
pub async fn connect(config: &StoreConfig) -> Result<MySqlPool, AuthError> {
    MySqlPoolOptions::new()
        .max_connections(5)
        .connect(&config.connection_url())
        .await
        .map_err(|e| {
            log::error!(target: "rdx_dash", "msg=\"database connection failed\", host=\"{}\", error=\"{e}\"", config.host);
            AuthError::DatabaseError(e.to_string())
        })
}

/// Creates every MySQL repository from one pool.
pub fn create_repositories(pool: MySqlPool) -> (MySqlUserRepository, MySqlPresetRepository) {
    (
        MySqlUserRepository::new(pool.clone()),
        MySqlPresetRepository::new(pool),
    )
}
