use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::AuthError;
use crate::collector::CollectorPreset;

/// A named collector configuration saved by one user.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Preset {
    pub name: String,
    pub config: CollectorPreset,
    pub updated_at: DateTime<Utc>,
}

/// Per-user collector presets, unique by `(user_id, name)`.
#[async_trait]
pub trait PresetRepository: Send + Sync {
    /// Ordered by name.
    async fn list_presets(&self, user_id: i64) -> Result<Vec<Preset>, AuthError>;

    /// Inserts or replaces the preset with this name.
    async fn save_preset(
        &self,
        user_id: i64,
        name: &str,
        config: &CollectorPreset,
    ) -> Result<(), AuthError>;

    async fn delete_preset(&self, user_id: i64, name: &str) -> Result<u64, AuthError>;
}
