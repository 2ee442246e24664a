use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::ids::QuestionId;
use crate::model::question::QuestionKind;

/// Record of a single submitted answer.
///
/// Created once per submission and never edited; progress history is a list
/// of these.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswerRecord {
    pub question_id: QuestionId,
    /// Character (or emoji) the question was about.
    pub character: String,
    pub expected: String,
    pub user_answer: String,
    pub correct: bool,
    pub time_spent_ms: u64,
    pub kind: QuestionKind,
    pub answered_at: DateTime<Utc>,
}
