use rand::Rng;
use rand::seq::{IndexedRandom, SliceRandom, index};

use kana_core::catalog::Catalog;
use kana_core::model::{
    Category, EmojiScript, PracticeItem, Question, QuestionId, QuestionKind, QuizMode,
};

use crate::error::SessionError;

/// Options shown for a multiple-choice question when the pool allows it.
pub const DEFAULT_OPTION_COUNT: usize = 4;

/// Directions a hiragana question can take.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum KanaKind {
    Recognition,
    Production,
    Typing,
}

impl From<KanaKind> for QuestionKind {
    fn from(kind: KanaKind) -> Self {
        match kind {
            KanaKind::Recognition => QuestionKind::Recognition,
            KanaKind::Production => QuestionKind::Production,
            KanaKind::Typing => QuestionKind::Typing,
        }
    }
}

const MIXED_KINDS: [KanaKind; 3] = [KanaKind::Recognition, KanaKind::Production, KanaKind::Typing];

/// Builds the question list of a quiz session from the catalog.
///
/// Subjects are drawn uniformly with replacement across the session; the
/// wrong options of one question are drawn without replacement from the
/// catalog's distinct answers and shuffled together with the correct one.
pub struct QuestionGenerator<'a> {
    catalog: &'a Catalog,
    option_count: usize,
}

impl<'a> QuestionGenerator<'a> {
    #[must_use]
    pub fn new(catalog: &'a Catalog) -> Self {
        Self {
            catalog,
            option_count: DEFAULT_OPTION_COUNT,
        }
    }

    /// Override the number of multiple-choice options (at least one).
    #[must_use]
    pub fn with_option_count(mut self, option_count: usize) -> Self {
        self.option_count = option_count.max(1);
        self
    }

    /// Generate `count` hiragana questions for `mode`.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::EmptyPool` if `count > 0` and no item matches
    /// `category`.
    pub fn generate<R: Rng + ?Sized>(
        &self,
        mode: QuizMode,
        category: Option<Category>,
        count: usize,
        rng: &mut R,
    ) -> Result<Vec<Question>, SessionError> {
        if count == 0 {
            return Ok(Vec::new());
        }
        let pool = self.catalog.items(category);
        if pool.is_empty() {
            return Err(SessionError::EmptyPool);
        }

        let answers = self.catalog.distinct_answers();
        let prompts = self.catalog.distinct_prompts();
        if answers.len() < self.option_count || prompts.len() < self.option_count {
            log::debug!(
                "answer pool too small for {} options ({} answers, {} characters)",
                self.option_count,
                answers.len(),
                prompts.len()
            );
        }

        let mut questions = Vec::with_capacity(count);
        for _ in 0..count {
            let item = *pool.choose(rng).ok_or(SessionError::EmptyPool)?;
            let kind = resolve_kind(mode, rng);
            questions.push(self.build_kana_question(item, kind, &answers, &prompts, rng)?);
        }
        Ok(questions)
    }

    /// Generate `count` emoji questions answered in `script`.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::EmptyPool` if `count > 0` and the catalog has
    /// no emoji.
    pub fn generate_emoji<R: Rng + ?Sized>(
        &self,
        script: EmojiScript,
        count: usize,
        rng: &mut R,
    ) -> Result<Vec<Question>, SessionError> {
        if count == 0 {
            return Ok(Vec::new());
        }
        let emojis = self.catalog.emojis();
        if emojis.is_empty() {
            return Err(SessionError::EmptyPool);
        }

        let mut renders: Vec<&str> = Vec::with_capacity(emojis.len());
        for item in emojis {
            let text = script.render(item);
            if !renders.contains(&text) {
                renders.push(text);
            }
        }

        let mut questions = Vec::with_capacity(count);
        for _ in 0..count {
            let item = emojis.choose(rng).ok_or(SessionError::EmptyPool)?;
            let correct = script.render(item);
            let options = sample_options(correct, &renders, self.option_count, rng);
            questions.push(Question::new(
                next_id(rng),
                QuestionKind::Emoji(script),
                item.emoji.clone(),
                item.emoji.clone(),
                correct,
                options,
            )?);
        }
        Ok(questions)
    }

    fn build_kana_question<R: Rng + ?Sized>(
        &self,
        item: &PracticeItem,
        kind: KanaKind,
        answers: &[&str],
        prompts: &[&str],
        rng: &mut R,
    ) -> Result<Question, SessionError> {
        let id = next_id(rng);
        let question = match kind {
            KanaKind::Production => {
                let options = sample_options(item.prompt(), prompts, self.option_count, rng);
                Question::new(
                    id,
                    QuestionKind::Production,
                    item.prompt(),
                    item.answer(),
                    item.prompt(),
                    options,
                )?
            }
            KanaKind::Typing => Question::new(
                id,
                QuestionKind::Typing,
                item.prompt(),
                item.prompt(),
                item.answer(),
                Vec::new(),
            )?,
            KanaKind::Recognition => {
                let options = sample_options(item.answer(), answers, self.option_count, rng);
                Question::new(
                    id,
                    QuestionKind::Recognition,
                    item.prompt(),
                    item.prompt(),
                    item.answer(),
                    options,
                )?
            }
        };
        Ok(question)
    }
}

/// Question direction for one question of a session in `mode`.
fn resolve_kind<R: Rng + ?Sized>(mode: QuizMode, rng: &mut R) -> KanaKind {
    match mode {
        QuizMode::Recognition | QuizMode::Speed => KanaKind::Recognition,
        QuizMode::Production => KanaKind::Production,
        QuizMode::Typing => KanaKind::Typing,
        QuizMode::Mixed => MIXED_KINDS
            .choose(rng)
            .copied()
            .unwrap_or(KanaKind::Recognition),
    }
}

fn next_id<R: Rng + ?Sized>(rng: &mut R) -> QuestionId {
    QuestionId::from_random_bytes(rng.random())
}

/// Correct answer plus up to `count - 1` distinct distractors, shuffled.
///
/// `pool` must already be deduplicated. With a small pool the result simply
/// has fewer entries.
fn sample_options<R: Rng + ?Sized>(
    correct: &str,
    pool: &[&str],
    count: usize,
    rng: &mut R,
) -> Vec<String> {
    let wrong: Vec<&str> = pool.iter().copied().filter(|c| *c != correct).collect();
    let take = count.saturating_sub(1).min(wrong.len());

    let mut options: Vec<String> = index::sample(rng, wrong.len(), take)
        .into_iter()
        .map(|i| wrong[i].to_string())
        .collect();
    options.push(correct.to_string());
    options.shuffle(rng);
    options
}
