use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::model::emoji::EmojiScript;
use crate::model::ids::QuestionId;

//
// ─── ERRORS ───────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum QuestionError {
    #[error("correct answer cannot be empty")]
    EmptyAnswer,

    #[error("multiple-choice question needs at least one option")]
    NoOptions,

    #[error("options must contain the correct answer exactly once")]
    MissingCorrectOption,

    #[error("duplicate option: {0}")]
    DuplicateOption(String),

    #[error("free-text questions cannot carry options")]
    OptionsOnFreeText,

    #[error("unknown quiz mode: {0}")]
    UnknownMode(String),
}

//
// ─── MODES ────────────────────────────────────────────────────────────────────
//

/// Quiz variant chosen when a session is generated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuizMode {
    /// Character shown, pick the romaji.
    Recognition,
    /// Romaji shown, pick the character.
    Production,
    /// Character shown, type the romaji.
    Typing,
    /// Recognition questions against a session countdown.
    Speed,
    /// Each question independently picks recognition, production or typing.
    Mixed,
}

impl QuizMode {
    pub const ALL: [QuizMode; 5] = [
        QuizMode::Recognition,
        QuizMode::Production,
        QuizMode::Typing,
        QuizMode::Speed,
        QuizMode::Mixed,
    ];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            QuizMode::Recognition => "recognition",
            QuizMode::Production => "production",
            QuizMode::Typing => "typing",
            QuizMode::Speed => "speed",
            QuizMode::Mixed => "mixed",
        }
    }

    /// Whether sessions in this mode run against a countdown.
    #[must_use]
    pub fn has_countdown(self) -> bool {
        matches!(self, QuizMode::Speed)
    }
}

impl fmt::Display for QuizMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for QuizMode {
    type Err = QuestionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        QuizMode::ALL
            .into_iter()
            .find(|mode| mode.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| QuestionError::UnknownMode(s.to_string()))
    }
}

/// Direction of a single generated question.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionKind {
    /// Hiragana to romaji, multiple choice.
    Recognition,
    /// Romaji to hiragana, multiple choice.
    Production,
    /// Hiragana to romaji, free text.
    Typing,
    /// Emoji to a rendering of its word, multiple choice.
    Emoji(EmojiScript),
}

impl QuestionKind {
    /// Stable key for per-kind aggregates such as practice time.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            QuestionKind::Recognition => "recognition",
            QuestionKind::Production => "production",
            QuestionKind::Typing => "typing",
            QuestionKind::Emoji(EmojiScript::Japanese) => "emoji-japanese",
            QuestionKind::Emoji(EmojiScript::Hiragana) => "emoji-hiragana",
            QuestionKind::Emoji(EmojiScript::Romaji) => "emoji-romaji",
        }
    }

    #[must_use]
    pub fn is_free_text(self) -> bool {
        matches!(self, QuestionKind::Typing)
    }

    /// Whether answers to this kind train hiragana mastery.
    #[must_use]
    pub fn tracks_mastery(self) -> bool {
        !matches!(self, QuestionKind::Emoji(_))
    }
}

//
// ─── ANSWER FORMAT ────────────────────────────────────────────────────────────
//

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "format", rename_all = "snake_case")]
pub enum AnswerFormat {
    MultipleChoice { options: Vec<String> },
    FreeText,
}

/// Trim and case-fold an answer for free-text comparison.
#[must_use]
pub fn normalize_answer(raw: &str) -> String {
    raw.trim().to_lowercase()
}

//
// ─── QUESTION ─────────────────────────────────────────────────────────────────
//

/// One immutable question of a quiz session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    id: QuestionId,
    kind: QuestionKind,
    subject: String,
    prompt: String,
    correct_answer: String,
    format: AnswerFormat,
}

impl Question {
    /// Build a validated question.
    ///
    /// `subject` is the character whose mastery the question trains; `options`
    /// must be empty for free-text kinds.
    ///
    /// # Errors
    ///
    /// Returns `QuestionError` if the answer is blank or the option set is
    /// inconsistent with the kind.
    pub fn new(
        id: QuestionId,
        kind: QuestionKind,
        subject: impl Into<String>,
        prompt: impl Into<String>,
        correct_answer: impl Into<String>,
        options: Vec<String>,
    ) -> Result<Self, QuestionError> {
        let correct_answer = correct_answer.into();
        if correct_answer.trim().is_empty() {
            return Err(QuestionError::EmptyAnswer);
        }

        let format = if kind.is_free_text() {
            if !options.is_empty() {
                return Err(QuestionError::OptionsOnFreeText);
            }
            AnswerFormat::FreeText
        } else {
            validate_options(&correct_answer, &options)?;
            AnswerFormat::MultipleChoice { options }
        };

        Ok(Self {
            id,
            kind,
            subject: subject.into(),
            prompt: prompt.into(),
            correct_answer,
            format,
        })
    }

    #[must_use]
    pub fn id(&self) -> QuestionId {
        self.id
    }

    #[must_use]
    pub fn kind(&self) -> QuestionKind {
        self.kind
    }

    #[must_use]
    pub fn subject(&self) -> &str {
        &self.subject
    }

    #[must_use]
    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    #[must_use]
    pub fn correct_answer(&self) -> &str {
        &self.correct_answer
    }

    #[must_use]
    pub fn format(&self) -> &AnswerFormat {
        &self.format
    }

    /// Choices shown to the learner; empty for free-text questions.
    #[must_use]
    pub fn options(&self) -> &[String] {
        match &self.format {
            AnswerFormat::MultipleChoice { options } => options,
            AnswerFormat::FreeText => &[],
        }
    }

    /// Grade a submitted answer.
    ///
    /// Free text compares trimmed, case-folded strings; multiple choice
    /// requires the exact option.
    #[must_use]
    pub fn is_correct(&self, answer: &str) -> bool {
        match self.format {
            AnswerFormat::FreeText => {
                normalize_answer(answer) == normalize_answer(&self.correct_answer)
            }
            AnswerFormat::MultipleChoice { .. } => answer == self.correct_answer,
        }
    }
}

fn validate_options(correct: &str, options: &[String]) -> Result<(), QuestionError> {
    if options.is_empty() {
        return Err(QuestionError::NoOptions);
    }
    let mut seen = HashSet::with_capacity(options.len());
    for option in options {
        if !seen.insert(option.as_str()) {
            return Err(QuestionError::DuplicateOption(option.clone()));
        }
    }
    if !seen.contains(correct) {
        return Err(QuestionError::MissingCorrectOption);
    }
    Ok(())
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
