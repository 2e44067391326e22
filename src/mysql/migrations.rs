//! MySQL migrations, embedded from `migrations_mysql/`.
//!
//! ```rust,ignore
//! use rdx_dash::mysql::migrations;
//!
//! async fn setup_database(pool: &sqlx::MySqlPool) -> Result<(), sqlx::migrate::MigrateError> {
//!     migrations::run(pool).await
//! }
//! ```

use sqlx::MySqlPool;

/// Creates the `users` and `presets` tables if they are missing.
pub async fn run(pool: &MySqlPool) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("./migrations_mysql").run(pool).await
}
