use std::fmt;

use crate::collector::{CollectorError, CollectorPreset};
use crate::validators::{ValidationError, validate_name};
use crate::{AuthError, Preset, PresetRepository, Session};

/// Why a preset could not be saved or loaded.
#[derive(Debug, Clone, PartialEq)]
pub enum PresetError {
    InvalidName(ValidationError),
    InvalidConfig(CollectorError),
    NotFound,
    Store(AuthError),
}

impl fmt::Display for PresetError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidName(err) => write!(f, "{err}"),
            Self::InvalidConfig(err) => write!(f, "{err}"),
            Self::NotFound => write!(f, "Preset not found"),
            Self::Store(err) => write!(f, "{err}"),
        }
    }
}

impl std::error::Error for PresetError {}

impl From<AuthError> for PresetError {
    fn from(err: AuthError) -> Self {
        PresetError::Store(err)
    }
}

/// Lists, saves and deletes the collector presets of the session's user.
///
/// Presets are always addressed through the session's `user_id`; one user
/// cannot see or touch another user's presets.
pub struct PresetsAction<P: PresetRepository> {
    preset_repository: P,
}

impl<P: PresetRepository> PresetsAction<P> {
    pub fn new(preset_repository: P) -> Self {
        PresetsAction { preset_repository }
    }

    pub async fn list(&self, session: &Session) -> Result<Vec<Preset>, PresetError> {
        Ok(self.preset_repository.list_presets(session.user_id).await?)
    }

    /// Inserts or overwrites the preset called `name` after validating it.
    pub async fn save(
        &self,
        session: &Session,
        name: &str,
        config: &CollectorPreset,
    ) -> Result<(), PresetError> {
        let name = name.trim();
        validate_name(name).map_err(PresetError::InvalidName)?;
        config.validate().map_err(PresetError::InvalidConfig)?;

        self.preset_repository
            .save_preset(session.user_id, name, config)
            .await?;
        log::info!(target: "rdx_dash", "msg=\"preset saved\" user_id={} name=\"{name}\"", session.user_id);
        Ok(())
    }

    pub async fn find(&self, session: &Session, name: &str) -> Result<Preset, PresetError> {
        let name = name.trim();
        self.list(session)
            .await?
            .into_iter()
            .find(|preset| preset.name == name)
            .ok_or(PresetError::NotFound)
    }

    pub async fn delete(&self, session: &Session, name: &str) -> Result<(), PresetError> {
        let deleted = self
            .preset_repository
            .delete_preset(session.user_id, name.trim())
            .await?;
        if deleted == 0 {
            return Err(PresetError::NotFound);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{MockPresetRepository, Role};

    fn session(user_id: i64) -> Session {
        Session {
            logged_in: true,
            email: Some("ana@x.com".to_owned()),
            user_id,
            role: Role::User,
            contract_status: None,
            expiration: i64::MAX,
        }
    }

    #[tokio::test]
    async fn test_save_list_delete() {
        let action = PresetsAction::new(MockPresetRepository::new());
        let ana = session(1);

        action.save(&ana, " morning ", &CollectorPreset::default()).await.unwrap();
        let short = CollectorPreset {
            bars: 30,
            ..Default::default()
        };
        action.save(&ana, "afternoon", &short).await.unwrap();
        action.save(&ana, "morning", &short).await.unwrap();

        let presets = action.list(&ana).await.unwrap();
        let names: Vec<&str> = presets.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["afternoon", "morning"]);
        assert_eq!(presets[1].config.bars, 30);
        assert_eq!(action.find(&ana, "afternoon ").await.unwrap().config.bars, 30);

        action.delete(&ana, "morning").await.unwrap();
        assert_eq!(action.delete(&ana, "morning").await.unwrap_err(), PresetError::NotFound);
    }

    #[tokio::test]
    async fn test_presets_are_per_user() {
        let action = PresetsAction::new(MockPresetRepository::new());
        action
            .save(&session(1), "mine", &CollectorPreset::default())
            .await
            .unwrap();

        assert!(action.list(&session(2)).await.unwrap().is_empty());
        assert_eq!(
            action.delete(&session(2), "mine").await.unwrap_err(),
            PresetError::NotFound
        );
    }

    #[tokio::test]
    async fn test_rejects_invalid_preset() {
        let action = PresetsAction::new(MockPresetRepository::new());
        let bad = CollectorPreset {
            bars: 0,
            ..Default::default()
        };

        assert_eq!(
            action.save(&session(1), "x", &bad).await.unwrap_err(),
            PresetError::InvalidConfig(CollectorError::BarsOutOfRange(0))
        );
        assert_eq!(
            action
                .save(&session(1), "  ", &CollectorPreset::default())
                .await
                .unwrap_err(),
            PresetError::InvalidName(ValidationError::NameEmpty)
        );
    }
}
