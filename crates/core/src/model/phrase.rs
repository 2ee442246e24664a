use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Topic a phrase belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PhraseCategory {
    LearningJapanese,
    AskingDirections,
    MeetingNewPeople,
    Shopping,
    Dining,
}

impl PhraseCategory {
    pub const ALL: [PhraseCategory; 5] = [
        PhraseCategory::LearningJapanese,
        PhraseCategory::AskingDirections,
        PhraseCategory::MeetingNewPeople,
        PhraseCategory::Shopping,
        PhraseCategory::Dining,
    ];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            PhraseCategory::LearningJapanese => "learning_japanese",
            PhraseCategory::AskingDirections => "asking_directions",
            PhraseCategory::MeetingNewPeople => "meeting_new_people",
            PhraseCategory::Shopping => "shopping",
            PhraseCategory::Dining => "dining",
        }
    }
}

/// A vocabulary phrase with its readings and a per-word gloss.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Phrase {
    pub english: String,
    pub japanese: String,
    pub hiragana: String,
    pub romaji: String,
    pub explanation: String,
    #[serde(default)]
    pub word_breakdown: BTreeMap<String, String>,
}
