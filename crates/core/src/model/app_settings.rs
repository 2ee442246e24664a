use serde::{Deserialize, Serialize};

/// Text size preference for the presentation layer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FontSize {
    Small,
    #[default]
    Medium,
    Large,
}

/// Learner preferences, persisted separately from progress.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AppSettings {
    audio_enabled: bool,
    dark_mode: bool,
    font_size: FontSize,
}

/// Partial update; `None` fields keep their current value.
#[derive(Clone, Debug, Default)]
pub struct AppSettingsPatch {
    pub audio_enabled: Option<bool>,
    pub dark_mode: Option<bool>,
    pub font_size: Option<FontSize>,
}

impl AppSettingsPatch {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl AppSettings {
    #[must_use]
    pub fn audio_enabled(&self) -> bool {
        self.audio_enabled
    }

    #[must_use]
    pub fn dark_mode(&self) -> bool {
        self.dark_mode
    }

    #[must_use]
    pub fn font_size(&self) -> FontSize {
        self.font_size
    }

    /// Settings with `patch` merged over `self`.
    #[must_use]
    pub fn merged(&self, patch: &AppSettingsPatch) -> Self {
        Self {
            audio_enabled: patch.audio_enabled.unwrap_or(self.audio_enabled),
            dark_mode: patch.dark_mode.unwrap_or(self.dark_mode),
            font_size: patch.font_size.unwrap_or(self.font_size),
        }
    }
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            audio_enabled: true,
            dark_mode: false,
            font_size: FontSize::Medium,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_first_run() {
        let settings = AppSettings::default();
        assert!(settings.audio_enabled());
        assert!(!settings.dark_mode());
        assert_eq!(settings.font_size(), FontSize::Medium);
    }

    #[test]
    fn patch_only_touches_given_fields() {
        let settings = AppSettings::default().merged(&AppSettingsPatch {
            dark_mode: Some(true),
            ..AppSettingsPatch::new()
        });
        assert!(settings.dark_mode());
        assert!(settings.audio_enabled());
    }

    #[test]
    fn partial_documents_fill_defaults() {
        let settings: AppSettings = serde_json::from_str(r#"{"fontSize":"large"}"#).unwrap();
        assert_eq!(settings.font_size(), FontSize::Large);
        assert!(settings.audio_enabled());
    }
}
