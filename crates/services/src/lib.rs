#![forbid(unsafe_code)]

pub mod app_services;
pub mod app_settings_service;
pub mod error;
pub mod progress_service;
pub mod sessions;

pub use kana_core::Clock;
pub use sessions as session;

pub use app_services::AppServices;
pub use app_settings_service::AppSettingsService;
pub use error::{AppServicesError, AppSettingsServiceError, ProgressServiceError, SessionError};
pub use progress_service::ProgressService;

pub use sessions::{
    CompletionReason, FinalScore, ProgressSnapshot, QuestionGenerator, QuizEvent,
    QuizLoopService, QuizSession, SessionAnswerResult, SessionSnapshot,
};
