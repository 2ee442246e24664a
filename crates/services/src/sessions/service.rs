use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;

use kana_core::model::{AnswerRecord, Question, QuizMode};

use super::progress::SessionProgress;
use crate::error::SessionError;

/// Length of the speed-mode countdown.
pub const SPEED_COUNTDOWN_SECS: u32 = 30;

//
// ─── STATE ─────────────────────────────────────────────────────────────────────
//

/// Why a session stopped accepting answers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CompletionReason {
    /// Every question was answered and advanced past.
    Finished,
    /// The speed countdown reached zero first.
    TimeUp,
    /// The learner stopped before the end.
    Abandoned,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum SessionState {
    Active { index: usize, answered: bool },
    Completed { reason: CompletionReason },
}

/// Score reported once a session completes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FinalScore {
    pub score: usize,
    pub total: usize,
    pub reason: CompletionReason,
}

//
// ─── SESSION ───────────────────────────────────────────────────────────────────
//

/// One bounded run over a generated question list.
///
/// The session walks the questions in order. Each question accepts exactly
/// one answer and must be answered before `advance` moves on; repeated
/// submissions are rejected without touching the score.
pub struct QuizSession {
    mode: QuizMode,
    questions: Vec<Question>,
    current: usize,
    answered_current: bool,
    score: usize,
    answers: Vec<AnswerRecord>,
    started_at: DateTime<Utc>,
    question_started_at: DateTime<Utc>,
    time_left: Option<u32>,
    completion: Option<(CompletionReason, DateTime<Utc>)>,
}

impl QuizSession {
    /// Start a session over `questions`.
    ///
    /// An empty list yields a session that is already complete with 0/0.
    #[must_use]
    pub fn new(mode: QuizMode, questions: Vec<Question>, started_at: DateTime<Utc>) -> Self {
        let completion = questions
            .is_empty()
            .then_some((CompletionReason::Finished, started_at));
        Self {
            mode,
            questions,
            current: 0,
            answered_current: false,
            score: 0,
            answers: Vec::new(),
            started_at,
            question_started_at: started_at,
            time_left: mode.has_countdown().then_some(SPEED_COUNTDOWN_SECS),
            completion,
        }
    }

    #[must_use]
    pub fn mode(&self) -> QuizMode {
        self.mode
    }

    #[must_use]
    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    #[must_use]
    pub fn current_index(&self) -> usize {
        self.current
    }

    /// Question awaiting an answer or navigation; `None` once complete.
    #[must_use]
    pub fn current_question(&self) -> Option<&Question> {
        if self.is_complete() {
            return None;
        }
        self.questions.get(self.current)
    }

    #[must_use]
    pub fn score(&self) -> usize {
        self.score
    }

    #[must_use]
    pub fn total(&self) -> usize {
        self.questions.len()
    }

    #[must_use]
    pub fn answers(&self) -> &[AnswerRecord] {
        &self.answers
    }

    /// Answer given to the current question, if any.
    #[must_use]
    pub fn current_answer(&self) -> Option<&AnswerRecord> {
        if self.answered_current {
            self.answers.last()
        } else {
            None
        }
    }

    #[must_use]
    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    #[must_use]
    pub fn completed_at(&self) -> Option<DateTime<Utc>> {
        self.completion.map(|(_, at)| at)
    }

    /// Seconds left on the countdown, for modes that have one.
    #[must_use]
    pub fn time_left(&self) -> Option<u32> {
        self.time_left
    }

    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.completion.is_some()
    }

    #[must_use]
    pub fn state(&self) -> SessionState {
        match self.completion {
            Some((reason, _)) => SessionState::Completed { reason },
            None => SessionState::Active {
                index: self.current,
                answered: self.answered_current,
            },
        }
    }

    #[must_use]
    pub fn final_score(&self) -> Option<FinalScore> {
        self.completion.map(|(reason, _)| FinalScore {
            score: self.score,
            total: self.total(),
            reason,
        })
    }

    #[must_use]
    pub fn progress(&self) -> SessionProgress {
        SessionProgress {
            total: self.total(),
            answered: self.answers.len(),
            remaining: self.total().saturating_sub(self.answers.len()),
            is_complete: self.is_complete(),
        }
    }

    /// Grade `answer` against the current question and record it.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Completed` once the session is over and
    /// `SessionError::AlreadyAnswered` on a repeated submission.
    pub fn submit_answer(
        &mut self,
        answer: &str,
        answered_at: DateTime<Utc>,
    ) -> Result<&AnswerRecord, SessionError> {
        if self.is_complete() {
            return Err(SessionError::Completed);
        }
        if self.answered_current {
            return Err(SessionError::AlreadyAnswered {
                index: self.current,
            });
        }
        let question = self
            .questions
            .get(self.current)
            .ok_or(SessionError::Completed)?;

        let correct = question.is_correct(answer);
        let elapsed = (answered_at - self.question_started_at).num_milliseconds();
        let record = AnswerRecord {
            question_id: question.id(),
            character: question.subject().to_string(),
            expected: question.correct_answer().to_string(),
            user_answer: answer.to_string(),
            correct,
            time_spent_ms: u64::try_from(elapsed).unwrap_or(0),
            kind: question.kind(),
            answered_at,
        };

        if correct {
            self.score += 1;
        }
        self.answered_current = true;
        self.answers.push(record);
        self.answers.last().ok_or(SessionError::Completed)
    }

    /// Move past the answered current question.
    ///
    /// Returns the final score when this completes the session.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Completed` once the session is over and
    /// `SessionError::NotAnswered` if the current question has no answer.
    pub fn advance(&mut self, at: DateTime<Utc>) -> Result<Option<FinalScore>, SessionError> {
        if self.is_complete() {
            return Err(SessionError::Completed);
        }
        if !self.answered_current {
            return Err(SessionError::NotAnswered {
                index: self.current,
            });
        }

        self.current += 1;
        self.answered_current = false;
        self.question_started_at = at;
        if self.current >= self.questions.len() {
            return Ok(self.complete(CompletionReason::Finished, at));
        }
        Ok(None)
    }

    /// One countdown second elapsed.
    ///
    /// Completes the session with whatever score it has when the countdown
    /// reaches zero. No-op for modes without a countdown or once complete.
    pub fn tick(&mut self, at: DateTime<Utc>) -> Option<FinalScore> {
        if self.is_complete() {
            return None;
        }
        let left = self.time_left.as_mut()?;
        *left = left.saturating_sub(1);
        if *left == 0 {
            return self.expire(at);
        }
        None
    }

    /// Stop the session early as if time ran out.
    pub fn expire(&mut self, at: DateTime<Utc>) -> Option<FinalScore> {
        if self.is_complete() {
            return None;
        }
        if let Some(left) = self.time_left.as_mut() {
            *left = 0;
        }
        self.complete(CompletionReason::TimeUp, at)
    }

    fn complete(&mut self, reason: CompletionReason, at: DateTime<Utc>) -> Option<FinalScore> {
        self.completion = Some((reason, at));
        log::debug!(
            "{} session complete: {}/{} ({reason:?})",
            self.mode,
            self.score,
            self.total()
        );
        self.final_score()
    }
}

impl fmt::Debug for QuizSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QuizSession")
            .field("mode", &self.mode)
            .field("questions_len", &self.questions.len())
            .field("current", &self.current)
            .field("answered_current", &self.answered_current)
            .field("score", &self.score)
            .field("time_left", &self.time_left)
            .field("completion", &self.completion)
            .finish_non_exhaustive()
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
