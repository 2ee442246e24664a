//! Read-only practice data: the hiragana table, vocabulary phrases and emoji
//! words.

use serde::Deserialize;
use std::collections::{BTreeMap, HashSet};
use thiserror::Error;

use crate::model::{Category, EmojiItem, ItemError, Phrase, PhraseCategory, PracticeItem};

mod hiragana;

const BUILTIN_DOCUMENT: &str = include_str!("../../assets/catalog.json");

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum CatalogError {
    #[error("catalog document is malformed: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Item(#[from] ItemError),

    #[error("catalog has no hiragana items")]
    NoItems,
}

//
// ─── DOCUMENT SHAPE ───────────────────────────────────────────────────────────
//

#[derive(Debug, Default, Deserialize)]
struct CatalogDocument {
    #[serde(default)]
    hiragana: Option<HiraganaDocument>,
    #[serde(default)]
    japanese_phrases: PhraseDocument,
    #[serde(default)]
    emojis: Vec<EmojiItem>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct HiraganaDocument {
    basic: BTreeMap<String, String>,
    dakuten: BTreeMap<String, String>,
    handakuten: BTreeMap<String, String>,
    combinations: BTreeMap<String, String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct PhraseDocument {
    learning_japanese: Vec<Phrase>,
    asking_directions: Vec<Phrase>,
    meeting_new_people: Vec<Phrase>,
    shopping: Vec<Phrase>,
    dining: Vec<Phrase>,
}

impl PhraseDocument {
    fn into_map(self) -> BTreeMap<PhraseCategory, Vec<Phrase>> {
        BTreeMap::from([
            (PhraseCategory::LearningJapanese, self.learning_japanese),
            (PhraseCategory::AskingDirections, self.asking_directions),
            (PhraseCategory::MeetingNewPeople, self.meeting_new_people),
            (PhraseCategory::Shopping, self.shopping),
            (PhraseCategory::Dining, self.dining),
        ])
    }
}

//
// ─── CATALOG ──────────────────────────────────────────────────────────────────
//

/// Static lookup of practice items, phrases and emoji words.
#[derive(Debug, Clone, PartialEq)]
pub struct Catalog {
    items: Vec<PracticeItem>,
    phrases: BTreeMap<PhraseCategory, Vec<Phrase>>,
    emojis: Vec<EmojiItem>,
}

impl Catalog {
    /// Build a catalog from already validated parts.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::NoItems` if `items` is empty.
    pub fn new(
        items: Vec<PracticeItem>,
        phrases: BTreeMap<PhraseCategory, Vec<Phrase>>,
        emojis: Vec<EmojiItem>,
    ) -> Result<Self, CatalogError> {
        if items.is_empty() {
            return Err(CatalogError::NoItems);
        }
        Ok(Self {
            items,
            phrases,
            emojis,
        })
    }

    /// The catalog compiled into the crate.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError` if the bundled document fails to parse.
    pub fn builtin() -> Result<Self, CatalogError> {
        Self::from_json_str(BUILTIN_DOCUMENT)
    }

    /// Load a catalog from a JSON document.
    ///
    /// The document carries `japanese_phrases` and `emojis`; an optional
    /// `hiragana` object (category → character → romaji) replaces the
    /// built-in table.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError` on malformed JSON or invalid items.
    pub fn from_json_str(raw: &str) -> Result<Self, CatalogError> {
        let doc: CatalogDocument = serde_json::from_str(raw)?;
        let items = match doc.hiragana {
            Some(table) => items_from_document(table)?,
            None => builtin_items()?,
        };
        Self::new(items, doc.japanese_phrases.into_map(), doc.emojis)
    }

    /// All practice items, or those in `category`.
    #[must_use]
    pub fn items(&self, category: Option<Category>) -> Vec<&PracticeItem> {
        self.items
            .iter()
            .filter(|item| category.is_none_or(|c| item.category() == c))
            .collect()
    }

    #[must_use]
    pub fn all_items(&self) -> &[PracticeItem] {
        &self.items
    }

    /// Number of distinct characters across every category.
    #[must_use]
    pub fn character_count(&self) -> usize {
        self.distinct_prompts().len()
    }

    /// Romaji reading of a character, if present.
    #[must_use]
    pub fn romaji_for(&self, character: &str) -> Option<&str> {
        self.items
            .iter()
            .find(|item| item.prompt() == character)
            .map(PracticeItem::answer)
    }

    /// Distinct romaji readings in table order.
    #[must_use]
    pub fn distinct_answers(&self) -> Vec<&str> {
        dedup_in_order(self.items.iter().map(PracticeItem::answer))
    }

    /// Distinct characters in table order.
    #[must_use]
    pub fn distinct_prompts(&self) -> Vec<&str> {
        dedup_in_order(self.items.iter().map(PracticeItem::prompt))
    }

    /// Phrases of one topic; empty when the topic has none.
    #[must_use]
    pub fn phrases(&self, category: PhraseCategory) -> &[Phrase] {
        self.phrases.get(&category).map_or(&[], Vec::as_slice)
    }

    #[must_use]
    pub fn emojis(&self) -> &[EmojiItem] {
        &self.emojis
    }
}

fn dedup_in_order<'a>(values: impl Iterator<Item = &'a str>) -> Vec<&'a str> {
    let mut seen = HashSet::new();
    values.filter(|value| seen.insert(*value)).collect()
}

fn builtin_items() -> Result<Vec<PracticeItem>, ItemError> {
    let tables = [
        (Category::Basic, hiragana::BASIC),
        (Category::Dakuten, hiragana::DAKUTEN),
        (Category::Handakuten, hiragana::HANDAKUTEN),
        (Category::Combinations, hiragana::COMBINATIONS),
    ];
    let mut items = Vec::new();
    for (category, table) in tables {
        for (kana, romaji) in table {
            items.push(PracticeItem::new(*kana, *romaji, category)?);
        }
    }
    Ok(items)
}

fn items_from_document(doc: HiraganaDocument) -> Result<Vec<PracticeItem>, ItemError> {
    let tables = [
        (Category::Basic, doc.basic),
        (Category::Dakuten, doc.dakuten),
        (Category::Handakuten, doc.handakuten),
        (Category::Combinations, doc.combinations),
    ];
    let mut items = Vec::new();
    for (category, table) in tables {
        for (kana, romaji) in table {
            items.push(PracticeItem::new(kana, romaji, category)?);
        }
    }
    Ok(items)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_catalog_loads() {
        let catalog = Catalog::builtin().unwrap();
        assert_eq!(catalog.items(Some(Category::Basic)).len(), 46);
        assert_eq!(catalog.items(Some(Category::Handakuten)).len(), 5);
        assert_eq!(catalog.romaji_for("し"), Some("shi"));
        assert!(!catalog.phrases(PhraseCategory::LearningJapanese).is_empty());
        assert!(catalog.phrases(PhraseCategory::Dining).is_empty());
        assert!(catalog.emojis().len() >= 4);
    }

    #[test]
    fn distinct_answers_drop_homophones() {
        let catalog = Catalog::builtin().unwrap();
        let answers = catalog.distinct_answers();
        assert_eq!(answers.iter().filter(|a| **a == "ji").count(), 1);
        assert!(answers.len() < catalog.all_items().len());
        assert_eq!(catalog.character_count(), catalog.all_items().len());
    }

    #[test]
    fn document_can_replace_hiragana_table() {
        let raw = r#"{
            "hiragana": { "basic": { "あ": "a", "い": "i" } },
            "emojis": [
                { "emoji": "🐱", "english": "cat", "japanese": "猫", "hiragana": "ねこ", "romaji": "neko" }
            ]
        }"#;
        let catalog = Catalog::from_json_str(raw).unwrap();
        assert_eq!(catalog.all_items().len(), 2);
        assert!(catalog.items(Some(Category::Dakuten)).is_empty());
        assert_eq!(catalog.emojis().len(), 1);
    }

    #[test]
    fn empty_table_is_rejected() {
        let err = Catalog::from_json_str(r#"{ "hiragana": {} }"#).unwrap_err();
        assert!(matches!(err, CatalogError::NoItems));
    }

    #[test]
    fn malformed_document_is_an_error() {
        let err = Catalog::from_json_str("{ not json").unwrap_err();
        assert!(matches!(err, CatalogError::Json(_)));
    }
}
