use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::model::answer::AnswerRecord;
use crate::scoring::{CharacterTally, MASTERED_THRESHOLD, ScoringPolicy, clamp_mastery};

/// Number of history entries shown as "recent activity".
pub const RECENT_WINDOW: usize = 10;

//
// ─── ACTIONS ──────────────────────────────────────────────────────────────────
//

/// Every way progress can change.
#[derive(Debug, Clone, PartialEq)]
pub enum ProgressAction {
    /// Append one answer, practiced on the given calendar day.
    RecordResult {
        record: AnswerRecord,
        practiced_on: NaiveDate,
    },
    /// Clear back to the empty initial state.
    Reset,
}

//
// ─── STATE ────────────────────────────────────────────────────────────────────
//

/// Cumulative learning progress.
///
/// Serialized as one JSON document; unknown or missing fields fall back to
/// their defaults so older documents still load.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProgressState {
    character_mastery: BTreeMap<String, f64>,
    exercise_history: Vec<AnswerRecord>,
    success_rates: BTreeMap<String, f64>,
    tallies: BTreeMap<String, CharacterTally>,
    time_spent_ms: BTreeMap<String, u64>,
    streak: u32,
    last_practice_date: Option<NaiveDate>,
}

/// Pure reducer: the state after applying `action` to `state`.
#[must_use]
pub fn reduce(
    state: &ProgressState,
    action: &ProgressAction,
    policy: &ScoringPolicy,
) -> ProgressState {
    let mut next = state.clone();
    next.apply(action, policy);
    next
}

impl ProgressState {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// In-place form of [`reduce`].
    pub fn apply(&mut self, action: &ProgressAction, policy: &ScoringPolicy) {
        match action {
            ProgressAction::Reset => *self = Self::default(),
            ProgressAction::RecordResult {
                record,
                practiced_on,
            } => self.record(record, *practiced_on, policy),
        }
    }

    fn record(&mut self, record: &AnswerRecord, practiced_on: NaiveDate, policy: &ScoringPolicy) {
        let character = record.character.clone();

        let mastery = self.character_mastery.get(&character).copied().unwrap_or(0.0);
        self.character_mastery
            .insert(character.clone(), policy.apply(mastery, record.correct));

        let tally = self.tallies.entry(character.clone()).or_default();
        tally.record(record.correct);
        if let Some(rate) = tally.success_rate() {
            self.success_rates.insert(character, rate);
        }

        let spent = self
            .time_spent_ms
            .entry(record.kind.as_str().to_string())
            .or_default();
        *spent = spent.saturating_add(record.time_spent_ms);

        self.update_streak(practiced_on);
        self.exercise_history.push(record.clone());
    }

    fn update_streak(&mut self, today: NaiveDate) {
        self.streak = match self.last_practice_date {
            Some(last) if last == today => self.streak.max(1),
            Some(last) if last.succ_opt() == Some(today) => self.streak.saturating_add(1),
            _ => 1,
        };
        self.last_practice_date = Some(today);
    }

    /// Repair a freshly loaded document: clamp mastery and rebuild the
    /// per-character counters when they disagree with the history.
    #[must_use]
    pub fn normalized(mut self) -> Self {
        for value in self.character_mastery.values_mut() {
            *value = clamp_mastery(*value);
        }

        let counted: u64 = self.tallies.values().map(|t| u64::from(t.total)).sum();
        if counted != self.exercise_history.len() as u64 {
            let mut tallies: BTreeMap<String, CharacterTally> = BTreeMap::new();
            for record in &self.exercise_history {
                tallies
                    .entry(record.character.clone())
                    .or_default()
                    .record(record.correct);
            }
            self.success_rates = tallies
                .iter()
                .filter_map(|(c, t)| t.success_rate().map(|rate| (c.clone(), rate)))
                .collect();
            self.tallies = tallies;
        }
        self
    }

    //
    // ─── READ ACCESS ─────────────────────────────────────────────────────────
    //

    #[must_use]
    pub fn character_mastery(&self) -> &BTreeMap<String, f64> {
        &self.character_mastery
    }

    /// Mastery for one character, 0 if never practiced.
    #[must_use]
    pub fn mastery(&self, character: &str) -> f64 {
        self.character_mastery.get(character).copied().unwrap_or(0.0)
    }

    #[must_use]
    pub fn exercise_history(&self) -> &[AnswerRecord] {
        &self.exercise_history
    }

    #[must_use]
    pub fn success_rates(&self) -> &BTreeMap<String, f64> {
        &self.success_rates
    }

    #[must_use]
    pub fn success_rate(&self, character: &str) -> Option<f64> {
        self.success_rates.get(character).copied()
    }

    /// Success rate recomputed from the full history.
    #[must_use]
    pub fn recompute_success_rate(&self, character: &str) -> Option<f64> {
        let mut tally = CharacterTally::default();
        self.exercise_history
            .iter()
            .filter(|r| r.character == character)
            .for_each(|r| tally.record(r.correct));
        tally.success_rate()
    }

    #[must_use]
    pub fn time_spent_ms(&self) -> &BTreeMap<String, u64> {
        &self.time_spent_ms
    }

    #[must_use]
    pub fn streak(&self) -> u32 {
        self.streak
    }

    #[must_use]
    pub fn last_practice_date(&self) -> Option<NaiveDate> {
        self.last_practice_date
    }

    /// The last `n` history entries, oldest first.
    #[must_use]
    pub fn recent(&self, n: usize) -> &[AnswerRecord] {
        let start = self.exercise_history.len().saturating_sub(n);
        &self.exercise_history[start..]
    }

    /// Percentage of correct answers among the last `n` entries.
    #[must_use]
    pub fn recent_success_percent(&self, n: usize) -> f64 {
        let recent = self.recent(n);
        if recent.is_empty() {
            return 0.0;
        }
        let correct = recent.iter().filter(|r| r.correct).count();
        #[allow(clippy::cast_precision_loss)]
        let pct = correct as f64 / recent.len() as f64 * 100.0;
        pct
    }

    /// Characters at or above the mastered threshold.
    #[must_use]
    pub fn mastered_count(&self) -> usize {
        self.character_mastery
            .values()
            .filter(|m| **m >= MASTERED_THRESHOLD)
            .count()
    }

    /// Mastery entries ordered weakest first.
    #[must_use]
    pub fn mastery_ascending(&self) -> Vec<(&str, f64)> {
        let mut entries: Vec<_> = self
            .character_mastery
            .iter()
            .map(|(c, m)| (c.as_str(), *m))
            .collect();
        entries.sort_by(|a, b| a.1.total_cmp(&b.1).then_with(|| a.0.cmp(b.0)));
        entries
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.exercise_history.is_empty() && self.character_mastery.is_empty()
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{QuestionId, QuestionKind};
    use crate::time::fixed_now;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn record(character: &str, correct: bool) -> AnswerRecord {
        AnswerRecord {
            question_id: QuestionId::from_random_bytes([9; 16]),
            character: character.to_string(),
            expected: "a".into(),
            user_answer: if correct { "a".into() } else { "o".into() },
            correct,
            time_spent_ms: 1_500,
            kind: QuestionKind::Recognition,
            answered_at: fixed_now(),
        }
    }

    fn day() -> NaiveDate {
        fixed_now().date_naive()
    }

    fn apply_all(state: &mut ProgressState, results: &[(&str, bool)]) {
        let policy = ScoringPolicy::default();
        for (c, ok) in results {
            state.apply(
                &ProgressAction::RecordResult {
                    record: record(c, *ok),
                    practiced_on: day(),
                },
                &policy,
            );
        }
    }

    #[test]
    fn success_rate_is_two_thirds() {
        let mut state = ProgressState::new();
        apply_all(&mut state, &[("あ", true), ("あ", true), ("あ", false)]);

        let rate = state.success_rate("あ").unwrap();
        assert!((rate - 2.0 / 3.0).abs() < 1e-12);
        assert_eq!(state.recompute_success_rate("あ"), Some(rate));
    }

    #[test]
    fn running_counters_match_full_recompute() {
        let mut state = ProgressState::new();
        let pattern = [
            ("あ", true),
            ("い", false),
            ("あ", false),
            ("う", true),
            ("い", true),
            ("あ", true),
        ];
        apply_all(&mut state, &pattern);
        for c in ["あ", "い", "う"] {
            assert_eq!(state.success_rate(c), state.recompute_success_rate(c));
        }
    }

    #[test]
    fn mastery_stays_in_bounds() {
        let mut state = ProgressState::new();
        apply_all(&mut state, &[("か", false), ("か", false)]);
        assert_eq!(state.mastery("か"), 0.0);

        let many: Vec<_> = (0..15).map(|_| ("か", true)).collect();
        apply_all(&mut state, &many);
        assert_eq!(state.mastery("か"), 100.0);

        for value in state.character_mastery().values() {
            assert!((0.0..=100.0).contains(value));
        }
    }

    #[test]
    fn mastery_stays_in_bounds_for_random_sequences() {
        let policy = ScoringPolicy::default();
        let characters = ["あ", "い", "う"];
        for seed in 0..20 {
            let mut rng = StdRng::seed_from_u64(seed);
            let mut state = ProgressState::new();
            for _ in 0..200 {
                let character = characters[rng.random_range(0..characters.len())];
                state.apply(
                    &ProgressAction::RecordResult {
                        record: record(character, rng.random_bool(0.5)),
                        practiced_on: day(),
                    },
                    &policy,
                );
                let mastery = state.mastery(character);
                assert!(
                    (0.0..=100.0).contains(&mastery),
                    "seed {seed}: {character} at {mastery}"
                );
            }
        }
    }

    #[test]
    fn reduce_leaves_input_untouched() {
        let state = ProgressState::new();
        let next = reduce(
            &state,
            &ProgressAction::RecordResult {
                record: record("あ", true),
                practiced_on: day(),
            },
            &ScoringPolicy::default(),
        );
        assert!(state.is_empty());
        assert_eq!(next.exercise_history().len(), 1);
        assert_eq!(next.mastery("あ"), 10.0);

        let cleared = reduce(&next, &ProgressAction::Reset, &ScoringPolicy::default());
        assert_eq!(cleared, ProgressState::default());
    }

    #[test]
    fn recent_view_does_not_mutate_history() {
        let mut state = ProgressState::new();
        let results: Vec<_> = (0..12).map(|i| ("え", i % 2 == 0)).collect();
        apply_all(&mut state, &results);

        assert_eq!(state.recent(RECENT_WINDOW).len(), 10);
        assert_eq!(state.exercise_history().len(), 12);
        assert!((state.recent_success_percent(RECENT_WINDOW) - 50.0).abs() < 1e-9);
        assert_eq!(state.recent(100).len(), 12);
    }

    #[test]
    fn streak_counts_consecutive_days() {
        let policy = ScoringPolicy::default();
        let mut state = ProgressState::new();
        let d0 = day();
        let d1 = d0.succ_opt().unwrap();
        let d3 = d1.succ_opt().unwrap().succ_opt().unwrap();

        for practiced_on in [d0, d0, d1] {
            state.apply(
                &ProgressAction::RecordResult {
                    record: record("お", true),
                    practiced_on,
                },
                &policy,
            );
        }
        assert_eq!(state.streak(), 2);

        state.apply(
            &ProgressAction::RecordResult {
                record: record("お", true),
                practiced_on: d3,
            },
            &policy,
        );
        assert_eq!(state.streak(), 1);
        assert_eq!(state.last_practice_date(), Some(d3));
    }

    #[test]
    fn time_spent_accumulates_per_kind() {
        let mut state = ProgressState::new();
        apply_all(&mut state, &[("あ", true), ("い", true)]);
        assert_eq!(state.time_spent_ms().get("recognition"), Some(&3_000));
    }

    #[test]
    fn normalized_rebuilds_missing_counters() {
        let mut state = ProgressState::new();
        apply_all(&mut state, &[("あ", true), ("あ", false)]);
        let json = serde_json::to_value(&state).unwrap();

        let mut stripped = json.clone();
        stripped.as_object_mut().unwrap().remove("tallies");
        stripped.as_object_mut().unwrap().remove("successRates");
        stripped["characterMastery"]["あ"] = serde_json::json!(140.0);

        let loaded: ProgressState = serde_json::from_value(stripped).unwrap();
        let loaded = loaded.normalized();
        assert_eq!(loaded.success_rate("あ"), Some(0.5));
        assert_eq!(loaded.mastery("あ"), 100.0);
    }

    #[test]
    fn mastery_ascending_orders_weakest_first() {
        let mut state = ProgressState::new();
        apply_all(&mut state, &[("あ", true), ("あ", true), ("い", true)]);
        let order: Vec<_> = state.mastery_ascending().into_iter().map(|(c, _)| c).collect();
        assert_eq!(order, vec!["い", "あ"]);
    }
}
