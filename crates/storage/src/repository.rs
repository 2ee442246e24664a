use async_trait::async_trait;
use kana_core::model::{AppSettings, ProgressState};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use thiserror::Error;

/// Key of the learning-progress document.
pub const PROGRESS_KEY: &str = "japanese-learning-progress";
/// Key of the settings document.
pub const SETTINGS_KEY: &str = "japanese-learning-settings";

/// Errors surfaced by storage adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("connection error: {0}")]
    Connection(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

impl StorageError {
    /// True when the stored bytes exist but cannot be decoded.
    #[must_use]
    pub fn is_corrupt(&self) -> bool {
        matches!(self, StorageError::Serialization(_))
    }
}

/// Durable string key-value store, the only thing adapters must provide.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Fetch the value stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backend cannot be read.
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Store `value` under `key`, replacing any previous value.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backend cannot be written.
    async fn put(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Delete `key`. Missing keys are not an error.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backend cannot be written.
    async fn remove(&self, key: &str) -> Result<(), StorageError>;
}

#[async_trait]
pub trait ProgressRepository: Send + Sync {
    /// Load the saved progress document.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Serialization` if the document is corrupt, or
    /// other storage errors.
    async fn get_progress(&self) -> Result<Option<ProgressState>, StorageError>;

    /// Persist the whole progress document.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the document cannot be stored.
    async fn save_progress(&self, progress: &ProgressState) -> Result<(), StorageError>;

    /// Remove the saved progress document.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backend cannot be written.
    async fn clear_progress(&self) -> Result<(), StorageError>;
}

#[async_trait]
pub trait SettingsRepository: Send + Sync {
    /// Load saved settings.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Serialization` if the document is corrupt, or
    /// other storage errors.
    async fn get_settings(&self) -> Result<Option<AppSettings>, StorageError>;

    /// Persist settings.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the document cannot be stored.
    async fn save_settings(&self, settings: &AppSettings) -> Result<(), StorageError>;
}

//
// ─── JSON DOCUMENTS ───────────────────────────────────────────────────────────
//

/// Stores progress and settings as JSON documents in any `KeyValueStore`.
#[derive(Clone)]
pub struct DocumentRepository {
    kv: Arc<dyn KeyValueStore>,
}

impl DocumentRepository {
    #[must_use]
    pub fn new(kv: Arc<dyn KeyValueStore>) -> Self {
        Self { kv }
    }

    async fn load<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, StorageError> {
        let Some(raw) = self.kv.get(key).await? else {
            return Ok(None);
        };
        serde_json::from_str(&raw)
            .map(Some)
            .map_err(|err| StorageError::Serialization(format!("{key}: {err}")))
    }

    async fn store<T: Serialize + Sync>(&self, key: &str, value: &T) -> Result<(), StorageError> {
        let raw = serde_json::to_string(value)
            .map_err(|err| StorageError::Serialization(format!("{key}: {err}")))?;
        log::debug!("writing {key} ({} bytes)", raw.len());
        self.kv.put(key, &raw).await
    }
}

#[async_trait]
impl ProgressRepository for DocumentRepository {
    async fn get_progress(&self) -> Result<Option<ProgressState>, StorageError> {
        self.load(PROGRESS_KEY).await
    }

    async fn save_progress(&self, progress: &ProgressState) -> Result<(), StorageError> {
        self.store(PROGRESS_KEY, progress).await
    }

    async fn clear_progress(&self) -> Result<(), StorageError> {
        self.kv.remove(PROGRESS_KEY).await
    }
}

#[async_trait]
impl SettingsRepository for DocumentRepository {
    async fn get_settings(&self) -> Result<Option<AppSettings>, StorageError> {
        self.load(SETTINGS_KEY).await
    }

    async fn save_settings(&self, settings: &AppSettings) -> Result<(), StorageError> {
        self.store(SETTINGS_KEY, settings).await
    }
}

//
// ─── IN MEMORY ────────────────────────────────────────────────────────────────
//

/// Simple in-memory store for testing and prototyping.
#[derive(Clone, Default)]
pub struct InMemoryRepository {
    entries: Arc<Mutex<HashMap<String, String>>>,
}

impl InMemoryRepository {
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: Arc::new(Mutex::new(HashMap::new())),
        }
    }
}

#[async_trait]
impl KeyValueStore for InMemoryRepository {
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let guard = self
            .entries
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(guard.get(key).cloned())
    }

    async fn put(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut guard = self
            .entries
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        guard.insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), StorageError> {
        let mut guard = self
            .entries
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        guard.remove(key);
        Ok(())
    }
}

/// Aggregates the key-value backend and the typed document repositories
/// behind trait objects for easy backend swapping.
#[derive(Clone)]
pub struct Storage {
    pub kv: Arc<dyn KeyValueStore>,
    pub progress: Arc<dyn ProgressRepository>,
    pub settings: Arc<dyn SettingsRepository>,
}

impl Storage {
    #[must_use]
    pub fn from_kv(kv: Arc<dyn KeyValueStore>) -> Self {
        let documents = DocumentRepository::new(Arc::clone(&kv));
        let progress: Arc<dyn ProgressRepository> = Arc::new(documents.clone());
        let settings: Arc<dyn SettingsRepository> = Arc::new(documents);
        Self {
            kv,
            progress,
            settings,
        }
    }

    #[must_use]
    pub fn in_memory() -> Self {
        Self::from_kv(Arc::new(InMemoryRepository::new()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kana_core::model::{
        AnswerRecord, AppSettingsPatch, ProgressAction, QuestionId, QuestionKind,
    };
    use kana_core::scoring::ScoringPolicy;
    use kana_core::time::fixed_now;

    fn sample_progress() -> ProgressState {
        let mut state = ProgressState::new();
        state.apply(
            &ProgressAction::RecordResult {
                record: AnswerRecord {
                    question_id: QuestionId::from_random_bytes([5; 16]),
                    character: "あ".into(),
                    expected: "a".into(),
                    user_answer: "a".into(),
                    correct: true,
                    time_spent_ms: 900,
                    kind: QuestionKind::Recognition,
                    answered_at: fixed_now(),
                },
                practiced_on: fixed_now().date_naive(),
            },
            &ScoringPolicy::default(),
        );
        state
    }

    #[tokio::test]
    async fn progress_round_trips() {
        let storage = Storage::in_memory();
        assert!(storage.progress.get_progress().await.unwrap().is_none());

        let state = sample_progress();
        storage.progress.save_progress(&state).await.unwrap();
        let loaded = storage.progress.get_progress().await.unwrap().unwrap();
        assert_eq!(loaded, state);
    }

    #[tokio::test]
    async fn corrupt_progress_is_a_serialization_error() {
        let storage = Storage::in_memory();
        storage.kv.put(PROGRESS_KEY, "{ not json").await.unwrap();

        let err = storage.progress.get_progress().await.unwrap_err();
        assert!(err.is_corrupt());
    }

    #[tokio::test]
    async fn clear_removes_only_progress() {
        let storage = Storage::in_memory();
        storage.progress.save_progress(&sample_progress()).await.unwrap();
        let settings = AppSettings::default().merged(&AppSettingsPatch {
            dark_mode: Some(true),
            ..AppSettingsPatch::new()
        });
        storage.settings.save_settings(&settings).await.unwrap();

        storage.progress.clear_progress().await.unwrap();

        assert!(storage.progress.get_progress().await.unwrap().is_none());
        assert_eq!(storage.settings.get_settings().await.unwrap(), Some(settings));
    }
}
