use chrono::Duration;
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::sync::Arc;

use kana_core::catalog::Catalog;
use kana_core::model::{AnswerRecord, Category, EmojiScript, Question, QuizMode};

use super::generator::QuestionGenerator;
use super::progress::SessionProgress;
use super::service::{CompletionReason, FinalScore, QuizSession, SessionState};
use super::timers::{TimerEvent, TimerId, Timers};
use super::view::{ProgressSnapshot, SessionSnapshot};
use crate::Clock;
use crate::error::SessionError;
use crate::progress_service::ProgressService;

/// Delay before an answered question moves on by itself.
pub const AUTO_ADVANCE_MS: u64 = 2_000;
/// Interval of the speed-mode countdown.
pub const COUNTDOWN_TICK_MS: u64 = 1_000;

/// Result of answering the current question.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionAnswerResult {
    pub record: AnswerRecord,
    pub score: usize,
    pub progress: SessionProgress,
}

/// Something a timer did while time elapsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuizEvent {
    /// Auto-advance moved to question `index`.
    Advanced { index: usize },
    /// Countdown second elapsed.
    Tick { time_left: u32 },
    Completed(FinalScore),
}

/// Drives one quiz at a time: generation, answering, timers and progress.
///
/// This service owns:
/// - the time source (`Clock`) and the timer queue
/// - the random source used for generation
/// - the progress store answers are forwarded to
///
/// It does **not** own presentation; callers read snapshots.
pub struct QuizLoopService {
    clock: Clock,
    catalog: Arc<Catalog>,
    progress: ProgressService,
    rng: StdRng,
    option_count: Option<usize>,
    session: Option<QuizSession>,
    timers: Timers,
    auto_advance: bool,
    pending_advance: Option<TimerId>,
}

impl QuizLoopService {
    #[must_use]
    pub fn new(clock: Clock, catalog: Arc<Catalog>, progress: ProgressService) -> Self {
        Self {
            clock,
            catalog,
            progress,
            rng: StdRng::from_os_rng(),
            option_count: None,
            session: None,
            timers: Timers::new(),
            auto_advance: true,
            pending_advance: None,
        }
    }

    /// Use a seeded generator, for reproducible sessions.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    /// Schedule the 2 s auto-advance after each answer (on by default).
    #[must_use]
    pub fn with_auto_advance(mut self, auto_advance: bool) -> Self {
        self.auto_advance = auto_advance;
        self
    }

    #[must_use]
    pub fn with_option_count(mut self, option_count: usize) -> Self {
        self.option_count = Some(option_count);
        self
    }

    #[must_use]
    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    #[must_use]
    pub fn clock(&self) -> Clock {
        self.clock
    }

    #[must_use]
    pub fn session(&self) -> Option<&QuizSession> {
        self.session.as_ref()
    }

    #[must_use]
    pub fn progress(&self) -> &ProgressService {
        &self.progress
    }

    #[must_use]
    pub fn pending_timers(&self) -> usize {
        self.timers.pending()
    }

    /// Replace any running session with a freshly generated one.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::EmptyPool` if no item matches `category`.
    pub fn generate_session(
        &mut self,
        mode: QuizMode,
        category: Option<Category>,
        count: usize,
    ) -> Result<SessionSnapshot, SessionError> {
        let questions = generator(&self.catalog, self.option_count).generate(
            mode,
            category,
            count,
            &mut self.rng,
        )?;
        Ok(self.start(mode, questions))
    }

    /// Start an emoji session answered in `script`.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::EmptyPool` if the catalog has no emoji.
    pub fn generate_emoji_session(
        &mut self,
        script: EmojiScript,
        count: usize,
    ) -> Result<SessionSnapshot, SessionError> {
        let questions = generator(&self.catalog, self.option_count).generate_emoji(
            script,
            count,
            &mut self.rng,
        )?;
        Ok(self.start(QuizMode::Recognition, questions))
    }

    /// Answer the current question.
    ///
    /// Hiragana answers are folded into progress and persisted before this
    /// returns.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::NotStarted` without a session, or the session's
    /// rejection of the submission.
    pub async fn submit_answer(
        &mut self,
        answer: &str,
    ) -> Result<SessionAnswerResult, SessionError> {
        let now = self.clock.now();
        let session = self.session.as_mut().ok_or(SessionError::NotStarted)?;
        let record = session.submit_answer(answer, now)?.clone();
        let index = session.current_index();
        let result = SessionAnswerResult {
            record: record.clone(),
            score: session.score(),
            progress: session.progress(),
        };

        if self.auto_advance {
            self.pending_advance = Some(
                self.timers
                    .schedule(AUTO_ADVANCE_MS, TimerEvent::AutoAdvance { index }),
            );
        }
        if record.kind.tracks_mastery() {
            self.progress.record_result(record).await;
        }
        Ok(result)
    }

    /// Move past the answered current question.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::NotStarted` without a session, or the session's
    /// rejection of the transition.
    pub fn advance(&mut self) -> Result<Option<FinalScore>, SessionError> {
        let now = self.clock.now();
        let session = self.session.as_mut().ok_or(SessionError::NotStarted)?;
        let finished = session.advance(now)?;
        if let Some(id) = self.pending_advance.take() {
            self.timers.cancel(id);
        }
        if finished.is_some() {
            self.clear_timers();
        }
        Ok(finished)
    }

    /// Let `ms` of time pass, firing due timers in order.
    ///
    /// A fixed clock is moved forward alongside the timers.
    pub fn elapse(&mut self, ms: u64) -> Vec<QuizEvent> {
        let deadline = self.timers.now_ms().saturating_add(ms);
        let mut events = Vec::new();
        loop {
            let before = self.timers.now_ms();
            let Some(fired) = self.timers.pop_due(deadline) else {
                break;
            };
            self.advance_clock(fired.at_ms.saturating_sub(before));
            self.fire(fired.event, &mut events);
        }
        let before = self.timers.now_ms();
        self.timers.settle(deadline);
        self.advance_clock(deadline.saturating_sub(before));
        events
    }

    /// Tear down the current session and its timers.
    ///
    /// A session still in progress is reported as
    /// [`CompletionReason::Abandoned`].
    pub fn end_session(&mut self) -> Option<FinalScore> {
        self.clear_timers();
        let session = self.session.take()?;
        Some(session.final_score().unwrap_or(FinalScore {
            score: session.score(),
            total: session.total(),
            reason: CompletionReason::Abandoned,
        }))
    }

    #[must_use]
    pub fn snapshot(&self) -> Option<SessionSnapshot> {
        self.session.as_ref().map(SessionSnapshot::from_session)
    }

    #[must_use]
    pub fn progress_snapshot(&self) -> ProgressSnapshot {
        self.progress.snapshot(&self.catalog)
    }

    pub async fn reset_progress(&mut self) {
        self.progress.reset().await;
    }

    fn clear_timers(&mut self) {
        self.timers.cancel_all();
        self.pending_advance = None;
    }

    fn start(&mut self, mode: QuizMode, questions: Vec<Question>) -> SessionSnapshot {
        self.clear_timers();
        let session = QuizSession::new(mode, questions, self.clock.now());
        if session.time_left().is_some() && !session.is_complete() {
            self.timers
                .schedule(COUNTDOWN_TICK_MS, TimerEvent::CountdownTick);
        }
        log::debug!("started {mode} session with {} questions", session.total());
        let snapshot = SessionSnapshot::from_session(&session);
        self.session = Some(session);
        snapshot
    }

    fn fire(&mut self, event: TimerEvent, events: &mut Vec<QuizEvent>) {
        let now = self.clock.now();
        let Some(session) = self.session.as_mut() else {
            return;
        };
        match event {
            TimerEvent::CountdownTick => {
                if let Some(finished) = session.tick(now) {
                    self.timers.cancel_all();
                    self.pending_advance = None;
                    events.push(QuizEvent::Completed(finished));
                } else if let Some(time_left) = session.time_left() {
                    events.push(QuizEvent::Tick { time_left });
                    self.timers
                        .schedule(COUNTDOWN_TICK_MS, TimerEvent::CountdownTick);
                }
            }
            TimerEvent::AutoAdvance { index } => {
                self.pending_advance = None;
                let ready = SessionState::Active {
                    index,
                    answered: true,
                };
                if session.state() != ready {
                    return;
                }
                match session.advance(now) {
                    Ok(Some(finished)) => {
                        self.timers.cancel_all();
                        events.push(QuizEvent::Completed(finished));
                    }
                    Ok(None) => events.push(QuizEvent::Advanced {
                        index: session.current_index(),
                    }),
                    Err(err) => log::debug!("auto-advance skipped: {err}"),
                }
            }
        }
    }

    fn advance_clock(&mut self, ms: u64) {
        if ms > 0 {
            let delta = i64::try_from(ms)
                .ok()
                .and_then(Duration::try_milliseconds)
                .unwrap_or(Duration::MAX);
            self.clock.advance(delta);
        }
    }
}

fn generator(catalog: &Catalog, option_count: Option<usize>) -> QuestionGenerator<'_> {
    let generator = QuestionGenerator::new(catalog);
    match option_count {
        Some(count) => generator.with_option_count(count),
        None => generator,
    }
}
