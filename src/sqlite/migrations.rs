//! Embedded `SQLite` migrations.
//!
//! ```rust,ignore
//! use rdx_dash::sqlite::migrations;
//! use sqlx::SqlitePool;
//!
//! async fn setup_database(pool: &SqlitePool) -> Result<(), sqlx::Error> {
//!     migrations::run(pool).await
//! }
//! ```

use sqlx::{Executor, SqlitePool};

const MIGRATIONS: &[(&str, &str)] = &[
    (
        "20250105000001_create_users_table",
        include_str!("../../migrations_sqlite/20250105000001_create_users_table.sql"),
    ),
    (
        "20250105000002_create_presets_table",
        include_str!("../../migrations_sqlite/20250105000002_create_presets_table.sql"),
    ),
];

/// Applies pending migrations in order, tracked in `_rdx_migrations`.
///
/// Statements are split on `;`, so migrations must not contain semicolons
/// inside string literals.
pub async fn run(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    pool.execute(
        r"
        CREATE TABLE IF NOT EXISTS _rdx_migrations (
            name TEXT PRIMARY KEY,
            applied_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now'))
        )
        ",
    )
    .await?;

    for (name, sql) in MIGRATIONS {
        let applied: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM _rdx_migrations WHERE name = ?)")
                .bind(*name)
                .fetch_one(pool)
                .await?;
        if applied {
            continue;
        }

        for statement in sql.split(';') {
            let trimmed = statement.trim();
            if !trimmed.is_empty() {
                pool.execute(trimmed).await?;
            }
        }

        sqlx::query("INSERT INTO _rdx_migrations (name) VALUES (?)")
            .bind(*name)
            .execute(pool)
            .await?;
        log::info!(target: "rdx_dash", "msg=\"migration applied\" name=\"{name}\"");
    }
    Ok(())
}
