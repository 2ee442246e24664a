use serde::{Deserialize, Serialize};

/// Lowest mastery a character can have.
pub const MASTERY_MIN: f64 = 0.0;
/// Highest mastery a character can have.
pub const MASTERY_MAX: f64 = 100.0;
/// Mastery at or above which a character counts as mastered.
pub const MASTERED_THRESHOLD: f64 = 80.0;

/// Linear mastery update: a fixed step up on a correct answer and a fixed
/// step down on a miss, clamped into `[MASTERY_MIN, MASTERY_MAX]`.
///
/// There is no decay or interval weighting; prior mastery does not change
/// the step size.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoringPolicy {
    correct_step: f64,
    incorrect_step: f64,
}

impl Default for ScoringPolicy {
    fn default() -> Self {
        Self {
            correct_step: 10.0,
            incorrect_step: -5.0,
        }
    }
}

impl ScoringPolicy {
    /// Mastery delta for a single result.
    #[must_use]
    pub fn delta(&self, correct: bool) -> f64 {
        if correct {
            self.correct_step
        } else {
            self.incorrect_step
        }
    }

    /// Apply one result to an existing mastery value.
    #[must_use]
    pub fn apply(&self, mastery: f64, correct: bool) -> f64 {
        clamp_mastery(mastery + self.delta(correct))
    }
}

/// Clamp into the mastery range, mapping NaN to the floor.
#[must_use]
pub fn clamp_mastery(value: f64) -> f64 {
    if value.is_nan() {
        return MASTERY_MIN;
    }
    value.clamp(MASTERY_MIN, MASTERY_MAX)
}

/// Running correct/total counters for one character.
///
/// Kept alongside the history so success rates do not need a full scan.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CharacterTally {
    pub correct: u32,
    pub total: u32,
}

impl CharacterTally {
    pub fn record(&mut self, correct: bool) {
        self.total = self.total.saturating_add(1);
        if correct {
            self.correct = self.correct.saturating_add(1);
        }
    }

    /// Fraction of correct answers in `[0, 1]`, `None` before the first answer.
    #[must_use]
    pub fn success_rate(&self) -> Option<f64> {
        if self.total == 0 {
            return None;
        }
        Some(f64::from(self.correct) / f64::from(self.total))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_steps() {
        let policy = ScoringPolicy::default();
        assert_eq!(policy.delta(true), 10.0);
        assert_eq!(policy.delta(false), -5.0);
    }

    #[test]
    fn apply_clamps_both_ends() {
        let policy = ScoringPolicy::default();
        assert_eq!(policy.apply(95.0, true), 100.0);
        assert_eq!(policy.apply(100.0, true), 100.0);
        assert_eq!(policy.apply(3.0, false), 0.0);
        assert_eq!(policy.apply(0.0, false), 0.0);
        assert_eq!(policy.apply(40.0, false), 35.0);
    }

    #[test]
    fn clamp_handles_nan() {
        assert_eq!(clamp_mastery(f64::NAN), 0.0);
        assert_eq!(clamp_mastery(250.0), 100.0);
    }

    #[test]
    fn tally_tracks_rate() {
        let mut tally = CharacterTally::default();
        assert_eq!(tally.success_rate(), None);
        tally.record(true);
        tally.record(true);
        tally.record(false);
        let rate = tally.success_rate().unwrap();
        assert!((rate - 2.0 / 3.0).abs() < f64::EPSILON);
    }
}
