use chrono::NaiveDate;
use serde::Serialize;
use std::collections::BTreeMap;

use kana_core::catalog::Catalog;
use kana_core::model::{AnswerRecord, ProgressState, QuestionKind, QuizMode, RECENT_WINDOW};

use super::progress::SessionProgress;
use super::service::{FinalScore, QuizSession, SessionState};

/// Read-only view of a running (or finished) quiz session.
///
/// This is intentionally **not** a UI view-model: it carries raw values and
/// leaves formatting to the presentation layer.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSnapshot {
    pub mode: QuizMode,
    pub state: SessionState,
    pub index: usize,
    pub score: usize,
    pub progress: SessionProgress,

    pub kind: Option<QuestionKind>,
    pub prompt: Option<String>,
    pub options: Vec<String>,
    /// Set while the current question shows its result.
    pub last_answer: Option<AnswerRecord>,

    pub time_left: Option<u32>,
    pub final_score: Option<FinalScore>,
}

impl SessionSnapshot {
    #[must_use]
    pub fn from_session(session: &QuizSession) -> Self {
        let question = session.current_question();
        Self {
            mode: session.mode(),
            state: session.state(),
            index: session.current_index(),
            score: session.score(),
            progress: session.progress(),
            kind: question.map(|q| q.kind()),
            prompt: question.map(|q| q.prompt().to_string()),
            options: question.map(|q| q.options().to_vec()).unwrap_or_default(),
            last_answer: session.current_answer().cloned(),
            time_left: session.time_left(),
            final_score: session.final_score(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MasteryEntry {
    pub character: String,
    pub romaji: Option<String>,
    pub mastery: f64,
    pub success_rate: Option<f64>,
}

/// Derived progress figures for a progress screen.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressSnapshot {
    pub total_characters: usize,
    pub mastered: usize,
    /// Mastered characters as a percentage of the whole catalog.
    pub overall_percent: f64,
    pub total_answers: usize,

    /// Last answers, oldest first.
    pub recent: Vec<AnswerRecord>,
    pub recent_success_percent: f64,

    pub streak: u32,
    pub last_practice_date: Option<NaiveDate>,
    pub time_spent_ms: u64,
    pub time_by_kind: BTreeMap<String, u64>,

    /// Weakest characters first.
    pub mastery: Vec<MasteryEntry>,
}

impl ProgressSnapshot {
    #[must_use]
    pub fn build(state: &ProgressState, catalog: &Catalog) -> Self {
        let total_characters = catalog.character_count();
        let mastered = state.mastered_count();
        #[allow(clippy::cast_precision_loss)]
        let overall_percent = if total_characters == 0 {
            0.0
        } else {
            mastered as f64 / total_characters as f64 * 100.0
        };

        let mastery = state
            .mastery_ascending()
            .into_iter()
            .map(|(character, mastery)| MasteryEntry {
                character: character.to_string(),
                romaji: catalog.romaji_for(character).map(str::to_string),
                mastery,
                success_rate: state.success_rate(character),
            })
            .collect();

        Self {
            total_characters,
            mastered,
            overall_percent,
            total_answers: state.exercise_history().len(),
            recent: state.recent(RECENT_WINDOW).to_vec(),
            recent_success_percent: state.recent_success_percent(RECENT_WINDOW),
            streak: state.streak(),
            last_practice_date: state.last_practice_date(),
            time_spent_ms: state.time_spent_ms().values().sum(),
            time_by_kind: state.time_spent_ms().clone(),
            mastery,
        }
    }
}
