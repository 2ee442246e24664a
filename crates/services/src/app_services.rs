use std::sync::Arc;

use kana_core::catalog::Catalog;
use storage::repository::Storage;

use crate::Clock;
use crate::app_settings_service::AppSettingsService;
use crate::error::AppServicesError;
use crate::progress_service::ProgressService;
use crate::sessions::QuizLoopService;

/// Assembles app-facing services over one storage backend.
#[derive(Clone)]
pub struct AppServices {
    clock: Clock,
    catalog: Arc<Catalog>,
    storage: Storage,
    app_settings: Arc<AppSettingsService>,
}

impl AppServices {
    /// Build services backed by `SQLite` storage and the built-in catalog.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError` if storage initialization fails or the
    /// catalog does not load.
    pub async fn new_sqlite(db_url: &str, clock: Clock) -> Result<Self, AppServicesError> {
        let storage = Storage::sqlite(db_url).await?;
        Ok(Self::with_storage(storage, clock, Catalog::builtin()?))
    }

    /// Build services over an in-memory store.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError::Catalog` if the built-in catalog does not
    /// load.
    pub fn in_memory(clock: Clock) -> Result<Self, AppServicesError> {
        Ok(Self::with_storage(
            Storage::in_memory(),
            clock,
            Catalog::builtin()?,
        ))
    }

    #[must_use]
    pub fn with_storage(storage: Storage, clock: Clock, catalog: Catalog) -> Self {
        let app_settings = Arc::new(AppSettingsService::new(Arc::clone(&storage.settings)));
        Self {
            clock,
            catalog: Arc::new(catalog),
            storage,
            app_settings,
        }
    }

    #[must_use]
    pub fn clock(&self) -> Clock {
        self.clock
    }

    #[must_use]
    pub fn catalog(&self) -> Arc<Catalog> {
        Arc::clone(&self.catalog)
    }

    #[must_use]
    pub fn app_settings(&self) -> Arc<AppSettingsService> {
        Arc::clone(&self.app_settings)
    }

    /// Progress store loaded from storage (empty if nothing usable is saved).
    pub async fn progress(&self) -> ProgressService {
        ProgressService::load(Arc::clone(&self.storage.progress)).await
    }

    /// Quiz loop with freshly loaded progress.
    pub async fn quiz_loop(&self) -> QuizLoopService {
        QuizLoopService::new(self.clock, self.catalog(), self.progress().await)
    }
}
