use std::sync::Arc;

use kana_core::model::{AppSettings, AppSettingsPatch};
use storage::repository::SettingsRepository;

use crate::error::AppSettingsServiceError;

#[derive(Clone)]
pub struct AppSettingsService {
    repo: Arc<dyn SettingsRepository>,
}

impl AppSettingsService {
    #[must_use]
    pub fn new(repo: Arc<dyn SettingsRepository>) -> Self {
        Self { repo }
    }

    /// Load persisted settings (or defaults if missing or corrupt).
    ///
    /// # Errors
    ///
    /// Returns `AppSettingsServiceError` if the store cannot be read.
    pub async fn load(&self) -> Result<AppSettings, AppSettingsServiceError> {
        match self.repo.get_settings().await {
            Ok(settings) => Ok(settings.unwrap_or_default()),
            Err(err) if err.is_corrupt() => {
                log::warn!("saved settings are corrupt, using defaults: {err}");
                Ok(AppSettings::default())
            }
            Err(err) => Err(err.into()),
        }
    }

    /// Apply a partial update and persist the result.
    ///
    /// # Errors
    ///
    /// Returns `AppSettingsServiceError` if loading or persistence fails.
    pub async fn update(
        &self,
        patch: &AppSettingsPatch,
    ) -> Result<AppSettings, AppSettingsServiceError> {
        let settings = self.load().await?.merged(patch);
        self.repo.save_settings(&settings).await?;
        Ok(settings)
    }

    /// Flip dark mode and persist.
    ///
    /// # Errors
    ///
    /// Returns `AppSettingsServiceError` if loading or persistence fails.
    pub async fn toggle_dark_mode(&self) -> Result<AppSettings, AppSettingsServiceError> {
        let current = self.load().await?;
        let patch = AppSettingsPatch {
            dark_mode: Some(!current.dark_mode()),
            ..AppSettingsPatch::new()
        };
        let settings = current.merged(&patch);
        self.repo.save_settings(&settings).await?;
        Ok(settings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kana_core::model::FontSize;
    use storage::repository::{SETTINGS_KEY, Storage};

    #[tokio::test]
    async fn defaults_when_nothing_saved() {
        let storage = Storage::in_memory();
        let service = AppSettingsService::new(Arc::clone(&storage.settings));

        let settings = service.load().await.unwrap();
        assert!(settings.audio_enabled());
        assert!(!settings.dark_mode());
        assert_eq!(settings.font_size(), FontSize::Medium);
    }

    #[tokio::test]
    async fn partial_update_keeps_other_fields() {
        let storage = Storage::in_memory();
        let service = AppSettingsService::new(Arc::clone(&storage.settings));

        service
            .update(&AppSettingsPatch {
                font_size: Some(FontSize::Small),
                ..AppSettingsPatch::new()
            })
            .await
            .unwrap();
        let toggled = service.toggle_dark_mode().await.unwrap();

        assert!(toggled.dark_mode());
        assert!(toggled.audio_enabled());
        assert_eq!(toggled.font_size(), FontSize::Small);
        assert_eq!(service.load().await.unwrap(), toggled);

        let back = service.toggle_dark_mode().await.unwrap();
        assert!(!back.dark_mode());
    }

    #[tokio::test]
    async fn corrupt_settings_fall_back_to_defaults() {
        let storage = Storage::in_memory();
        storage.kv.put(SETTINGS_KEY, "not json").await.unwrap();
        let service = AppSettingsService::new(Arc::clone(&storage.settings));

        assert_eq!(service.load().await.unwrap(), AppSettings::default());
    }
}
