#![allow(clippy::unwrap_used)]

use async_trait::async_trait;
use chrono::Utc;
use std::sync::{Arc, Mutex};

use crate::AuthError;
use crate::collector::CollectorPreset;

use super::preset::{Preset, PresetRepository};

#[derive(Clone, Default)]
pub struct MockPresetRepository {
    /// `(user_id, preset)` pairs.
    pub presets: Arc<Mutex<Vec<(i64, Preset)>>>,
}

impl MockPresetRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PresetRepository for MockPresetRepository {
    async fn list_presets(&self, user_id: i64) -> Result<Vec<Preset>, AuthError> {
        let presets = self.presets.lock().unwrap();
        let mut found: Vec<Preset> = presets
            .iter()
            .filter(|(owner, _)| *owner == user_id)
            .map(|(_, preset)| preset.clone())
            .collect();
        found.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(found)
    }

    async fn save_preset(
        &self,
        user_id: i64,
        name: &str,
        config: &CollectorPreset,
    ) -> Result<(), AuthError> {
        let mut presets = self.presets.lock().unwrap();
        let preset = Preset {
            name: name.to_owned(),
            config: config.clone(),
            updated_at: Utc::now(),
        };
        match presets
            .iter_mut()
            .find(|(owner, p)| *owner == user_id && p.name == name)
        {
            Some((_, existing)) => *existing = preset,
            None => presets.push((user_id, preset)),
        }
        Ok(())
    }

    async fn delete_preset(&self, user_id: i64, name: &str) -> Result<u64, AuthError> {
        let mut presets = self.presets.lock().unwrap();
        let len_before = presets.len();
        presets.retain(|(owner, p)| !(*owner == user_id && p.name == name));
        Ok((len_before - presets.len()) as u64)
    }
}
