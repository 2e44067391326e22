use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, SqlitePool};

use crate::collector::CollectorPreset;
use crate::{AuthError, Preset, PresetRepository};

#[derive(Clone)]
pub struct SqlitePresetRepository {
    pool: SqlitePool,
}

impl SqlitePresetRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[derive(FromRow)]
struct PresetRecord {
    name: String,
    config: String,
    updated_at: DateTime<Utc>,
}

impl TryFrom<PresetRecord> for Preset {
    type Error = AuthError;

    fn try_from(row: PresetRecord) -> Result<Self, Self::Error> {
        let config: CollectorPreset = serde_json::from_str(&row.config).map_err(|e| {
            log::error!(target: "rdx_dash", "msg=\"malformed preset\", name=\"{}\", error=\"{e}\"", row.name);
            AuthError::Internal(format!("malformed preset {}", row.name))
        })?;
        Ok(Preset {
            name: row.name,
            config,
            updated_at: row.updated_at,
        })
    }
}

fn db_error(operation: &'static str) -> impl FnOnce(sqlx::Error) -> AuthError {
    move |e| {
        log::error!(target: "rdx_dash", "msg=\"database error\", operation=\"{operation}\", error=\"{e}\"");
        AuthError::DatabaseError(e.to_string())
    }
}

#[async_trait]
impl PresetRepository for SqlitePresetRepository {
    #[cfg_attr(feature = "tracing", tracing::instrument(skip(self), err))]
    async fn list_presets(&self, user_id: i64) -> Result<Vec<Preset>, AuthError> {
        let rows: Vec<PresetRecord> = sqlx::query_as(
            "SELECT name, config, updated_at FROM presets WHERE user_id = ? ORDER BY name",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(db_error("list_presets"))?;

        rows.into_iter().map(Preset::try_from).collect()
    }

    #[cfg_attr(feature = "tracing", tracing::instrument(skip(self, config), err))]
    async fn save_preset(
        &self,
        user_id: i64,
        name: &str,
        config: &CollectorPreset,
    ) -> Result<(), AuthError> {
        let json = serde_json::to_string(config).map_err(|e| AuthError::Internal(e.to_string()))?;
        sqlx::query(
            "INSERT INTO presets (user_id, name, config, updated_at) VALUES (?, ?, ?, ?) \
             ON CONFLICT (user_id, name) DO UPDATE SET config = excluded.config, updated_at = excluded.updated_at",
        )
        .bind(user_id)
        .bind(name)
        .bind(json)
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(db_error("save_preset"))?;

        Ok(())
    }

    #[cfg_attr(feature = "tracing", tracing::instrument(skip(self), err))]
    async fn delete_preset(&self, user_id: i64, name: &str) -> Result<u64, AuthError> {
        let result = sqlx::query("DELETE FROM presets WHERE user_id = ? AND name = ?")
            .bind(user_id)
            .bind(name)
            .execute(&self.pool)
            .await
            .map_err(db_error("delete_preset"))?;

        Ok(result.rows_affected())
    }
}
