use std::sync::Arc;

use kana_core::catalog::Catalog;
use kana_core::model::{AnswerRecord, ProgressAction, ProgressState, reduce};
use kana_core::scoring::ScoringPolicy;
use storage::repository::ProgressRepository;

use crate::error::ProgressServiceError;
use crate::sessions::ProgressSnapshot;

/// Owns the learner's cumulative progress and keeps it persisted.
///
/// Every change goes through the pure reducer and is written back right
/// away. Persistence is best-effort on the recording path: failures are
/// logged and the in-memory state stays authoritative.
#[derive(Clone)]
pub struct ProgressService {
    repo: Arc<dyn ProgressRepository>,
    policy: ScoringPolicy,
    state: ProgressState,
}

impl ProgressService {
    /// Service with empty progress; nothing is read from `repo`.
    #[must_use]
    pub fn new(repo: Arc<dyn ProgressRepository>) -> Self {
        Self {
            repo,
            policy: ScoringPolicy::default(),
            state: ProgressState::new(),
        }
    }

    /// Load saved progress, falling back to empty progress when the document
    /// is missing, corrupt or unreadable.
    pub async fn load(repo: Arc<dyn ProgressRepository>) -> Self {
        let mut service = Self::new(repo);
        service.reload().await;
        service
    }

    #[must_use]
    pub fn state(&self) -> &ProgressState {
        &self.state
    }

    /// Re-read the stored document, replacing in-memory state.
    pub async fn reload(&mut self) {
        self.state = match self.repo.get_progress().await {
            Ok(Some(state)) => state.normalized(),
            Ok(None) => ProgressState::new(),
            Err(err) if err.is_corrupt() => {
                log::warn!("saved progress is corrupt, starting fresh: {err}");
                ProgressState::new()
            }
            Err(err) => {
                log::warn!("could not load saved progress: {err}");
                ProgressState::new()
            }
        };
    }

    /// Fold one answer into progress and persist.
    pub async fn record_result(&mut self, record: AnswerRecord) -> &ProgressState {
        let practiced_on = record.answered_at.date_naive();
        let action = ProgressAction::RecordResult {
            record,
            practiced_on,
        };
        self.state = reduce(&self.state, &action, &self.policy);
        self.persist().await;
        &self.state
    }

    /// Replace progress with `state` and persist it.
    ///
    /// # Errors
    ///
    /// Returns `ProgressServiceError::Storage` if the document cannot be
    /// written; the in-memory state is replaced regardless.
    pub async fn save(&mut self, state: ProgressState) -> Result<(), ProgressServiceError> {
        self.state = state;
        self.repo.save_progress(&self.state).await?;
        Ok(())
    }

    /// Clear all progress and remove the saved document.
    pub async fn reset(&mut self) {
        self.state = reduce(&self.state, &ProgressAction::Reset, &self.policy);
        match self.repo.clear_progress().await {
            Ok(()) => log::debug!("progress reset"),
            Err(err) => log::warn!("failed to clear saved progress: {err}"),
        }
    }

    #[must_use]
    pub fn snapshot(&self, catalog: &Catalog) -> ProgressSnapshot {
        ProgressSnapshot::build(&self.state, catalog)
    }

    async fn persist(&self) {
        if let Err(err) = self.repo.save_progress(&self.state).await {
            log::warn!("failed to persist progress: {err}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use kana_core::model::{QuestionId, QuestionKind};
    use kana_core::time::fixed_now;
    use storage::repository::{PROGRESS_KEY, Storage, StorageError};

    fn answer(character: &str, correct: bool) -> AnswerRecord {
        AnswerRecord {
            question_id: QuestionId::from_random_bytes([9; 16]),
            character: character.to_string(),
            expected: "ka".into(),
            user_answer: if correct { "ka".into() } else { "ki".into() },
            correct,
            time_spent_ms: 1_200,
            kind: QuestionKind::Recognition,
            answered_at: fixed_now(),
        }
    }

    struct FailingRepo;

    #[async_trait]
    impl ProgressRepository for FailingRepo {
        async fn get_progress(&self) -> Result<Option<ProgressState>, StorageError> {
            Err(StorageError::Connection("offline".into()))
        }

        async fn save_progress(&self, _: &ProgressState) -> Result<(), StorageError> {
            Err(StorageError::Connection("offline".into()))
        }

        async fn clear_progress(&self) -> Result<(), StorageError> {
            Err(StorageError::Connection("offline".into()))
        }
    }

    #[tokio::test]
    async fn success_rate_after_two_of_three() {
        let storage = Storage::in_memory();
        let mut service = ProgressService::load(Arc::clone(&storage.progress)).await;

        service.record_result(answer("か", true)).await;
        service.record_result(answer("か", false)).await;
        let state = service.record_result(answer("か", true)).await;

        let rate = state.success_rate("か").unwrap();
        assert!((rate - 2.0 / 3.0).abs() < 1e-9);
        assert!((state.mastery("か") - 15.0).abs() < 1e-9);
    }

    #[tokio::test]
    async fn records_are_persisted_and_reloaded() {
        let storage = Storage::in_memory();
        let mut service = ProgressService::load(Arc::clone(&storage.progress)).await;
        service.record_result(answer("か", true)).await;
        service.record_result(answer("き", false)).await;

        let reloaded = ProgressService::load(Arc::clone(&storage.progress)).await;
        assert_eq!(reloaded.state(), service.state());
        assert_eq!(reloaded.state().exercise_history().len(), 2);
    }

    #[tokio::test]
    async fn corrupt_document_loads_as_empty() {
        let storage = Storage::in_memory();
        storage.kv.put(PROGRESS_KEY, "{\"characterMastery\": [").await.unwrap();

        let service = ProgressService::load(Arc::clone(&storage.progress)).await;
        assert!(service.state().is_empty());
    }

    #[tokio::test]
    async fn storage_failures_keep_memory_state() {
        let mut service = ProgressService::load(Arc::new(FailingRepo)).await;
        service.record_result(answer("か", true)).await;
        assert!((service.state().mastery("か") - 10.0).abs() < 1e-9);

        service.reset().await;
        assert!(service.state().is_empty());
        service.record_result(answer("か", true)).await;

        let err = service.save(ProgressState::new()).await.unwrap_err();
        assert!(matches!(err, ProgressServiceError::Storage(_)));
        assert!(service.state().is_empty());
    }

    #[tokio::test]
    async fn reset_clears_saved_progress() {
        let storage = Storage::in_memory();
        let mut service = ProgressService::load(Arc::clone(&storage.progress)).await;
        service.record_result(answer("か", true)).await;

        service.reset().await;
        assert!(service.state().is_empty());
        assert_eq!(storage.kv.get(PROGRESS_KEY).await.unwrap(), None);
        let reloaded = ProgressService::load(Arc::clone(&storage.progress)).await;
        assert!(reloaded.state().is_empty());
    }
}
