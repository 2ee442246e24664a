mod answer;
mod app_settings;
mod emoji;
mod ids;
mod item;
mod phrase;
pub mod progress;
mod question;

pub use ids::{ParseIdError, QuestionId};

pub use answer::AnswerRecord;
pub use app_settings::{AppSettings, AppSettingsPatch, FontSize};
pub use emoji::{EmojiItem, EmojiScript, ParseScriptError};
pub use item::{Category, ItemError, PracticeItem};
pub use phrase::{Phrase, PhraseCategory};
pub use progress::{ProgressAction, ProgressState, RECENT_WINDOW, reduce};
pub use question::{
    AnswerFormat, Question, QuestionError, QuestionKind, QuizMode, normalize_answer,
};
