//! Shared error types for the services crate.

use thiserror::Error;

use kana_core::catalog::CatalogError;
use kana_core::model::QuestionError;
use storage::repository::StorageError;
use storage::sqlite::SqliteInitError;

/// Errors emitted by quiz sessions and their generator.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SessionError {
    #[error("no session has been generated")]
    NotStarted,
    #[error("session already completed")]
    Completed,
    #[error("question {index} was already answered")]
    AlreadyAnswered { index: usize },
    #[error("question {index} has not been answered yet")]
    NotAnswered { index: usize },
    #[error("no practice items match the requested filter")]
    EmptyPool,
    #[error(transparent)]
    Question(#[from] QuestionError),
}

/// Errors emitted by `ProgressService` when persistence is requested
/// explicitly.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ProgressServiceError {
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted by `AppSettingsService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AppSettingsServiceError {
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted while bootstrapping app services.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AppServicesError {
    #[error(transparent)]
    Sqlite(#[from] SqliteInitError),
    #[error(transparent)]
    Catalog(#[from] CatalogError),
}
