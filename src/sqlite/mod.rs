//! `SQLite` backend.
//!
//! Used for development and tests; production runs on MySQL. Both backends
//! share the same schema and queries differ only in dialect.

pub mod migrations;
mod preset;
mod user;

use sqlx::SqlitePool;

pub use preset::SqlitePresetRepository;
pub use user::SqliteUserRepository;

/// Creates every `SQLite` repository from one pool.
pub fn create_repositories(pool: SqlitePool) -> (SqliteUserRepository, SqlitePresetRepository) {
    (
        SqliteUserRepository::new(pool.clone()),
        SqlitePresetRepository::new(pool),
    )
}
