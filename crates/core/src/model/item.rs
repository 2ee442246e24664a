use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

//
// ─── ERRORS ───────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ItemError {
    #[error("practice item prompt cannot be empty")]
    EmptyPrompt,

    #[error("practice item answer cannot be empty")]
    EmptyAnswer,

    #[error("unknown hiragana category: {0}")]
    UnknownCategory(String),
}

//
// ─── CATEGORY ─────────────────────────────────────────────────────────────────
//

/// Grouping of the hiragana table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    /// The 46 plain gojūon characters.
    Basic,
    /// Voiced characters marked with ゛.
    Dakuten,
    /// Semi-voiced characters marked with ゜.
    Handakuten,
    /// Yōon digraphs such as きゃ.
    Combinations,
}

impl Category {
    pub const ALL: [Category; 4] = [
        Category::Basic,
        Category::Dakuten,
        Category::Handakuten,
        Category::Combinations,
    ];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Category::Basic => "basic",
            Category::Dakuten => "dakuten",
            Category::Handakuten => "handakuten",
            Category::Combinations => "combinations",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = ItemError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Category::ALL
            .into_iter()
            .find(|category| category.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ItemError::UnknownCategory(s.to_string()))
    }
}

//
// ─── PRACTICE ITEM ────────────────────────────────────────────────────────────
//

/// One hiragana character and its romaji reading.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PracticeItem {
    prompt: String,
    answer: String,
    category: Category,
}

impl PracticeItem {
    /// Create a practice item from a character and its reading.
    ///
    /// # Errors
    ///
    /// Returns `ItemError` if either side is empty after trimming.
    pub fn new(
        prompt: impl Into<String>,
        answer: impl Into<String>,
        category: Category,
    ) -> Result<Self, ItemError> {
        let prompt = prompt.into().trim().to_string();
        let answer = answer.into().trim().to_string();
        if prompt.is_empty() {
            return Err(ItemError::EmptyPrompt);
        }
        if answer.is_empty() {
            return Err(ItemError::EmptyAnswer);
        }
        Ok(Self {
            prompt,
            answer,
            category,
        })
    }

    /// The hiragana character.
    #[must_use]
    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    /// The romaji reading.
    #[must_use]
    pub fn answer(&self) -> &str {
        &self.answer
    }

    #[must_use]
    pub fn category(&self) -> Category {
        self.category
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn category_parses_case_insensitively() {
        assert_eq!("Dakuten".parse::<Category>().unwrap(), Category::Dakuten);
        assert_eq!(" basic ".parse::<Category>().unwrap(), Category::Basic);
        assert!(matches!(
            "katakana".parse::<Category>(),
            Err(ItemError::UnknownCategory(_))
        ));
    }

    #[test]
    fn item_rejects_blank_sides() {
        assert_eq!(
            PracticeItem::new("  ", "a", Category::Basic).unwrap_err(),
            ItemError::EmptyPrompt
        );
        assert_eq!(
            PracticeItem::new("あ", "", Category::Basic).unwrap_err(),
            ItemError::EmptyAnswer
        );
    }

    #[test]
    fn item_trims_input() {
        let item = PracticeItem::new(" か ", " ka", Category::Basic).unwrap();
        assert_eq!(item.prompt(), "か");
        assert_eq!(item.answer(), "ka");
    }
}
