mod generator;
mod progress;
mod service;
mod timers;
mod view;
mod workflow;

// Public API of the session subsystem.
pub use crate::error::SessionError;
pub use generator::{DEFAULT_OPTION_COUNT, QuestionGenerator};
pub use progress::SessionProgress;
pub use service::{CompletionReason, FinalScore, QuizSession, SPEED_COUNTDOWN_SECS, SessionState};
pub use timers::{FiredTimer, TimerEvent, TimerId, Timers};
pub use view::{MasteryEntry, ProgressSnapshot, SessionSnapshot};
pub use workflow::{
    AUTO_ADVANCE_MS, COUNTDOWN_TICK_MS, QuizEvent, QuizLoopService, SessionAnswerResult,
};
