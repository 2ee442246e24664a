use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("unknown emoji answer script: {0}")]
pub struct ParseScriptError(String);

/// Emoji paired with the word it depicts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmojiItem {
    pub emoji: String,
    pub english: String,
    pub japanese: String,
    pub hiragana: String,
    pub romaji: String,
}

/// Which rendering of the word an emoji question asks for.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmojiScript {
    /// Standard written form (kanji/kana mix).
    #[default]
    Japanese,
    Hiragana,
    Romaji,
}

impl EmojiScript {
    pub const ALL: [EmojiScript; 3] = [
        EmojiScript::Japanese,
        EmojiScript::Hiragana,
        EmojiScript::Romaji,
    ];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            EmojiScript::Japanese => "japanese",
            EmojiScript::Hiragana => "hiragana",
            EmojiScript::Romaji => "romaji",
        }
    }

    /// The answer text for `item` in this script.
    #[must_use]
    pub fn render(self, item: &EmojiItem) -> &str {
        match self {
            EmojiScript::Japanese => &item.japanese,
            EmojiScript::Hiragana => &item.hiragana,
            EmojiScript::Romaji => &item.romaji,
        }
    }
}

impl fmt::Display for EmojiScript {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EmojiScript {
    type Err = ParseScriptError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        EmojiScript::ALL
            .into_iter()
            .find(|script| script.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ParseScriptError(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn script_selects_rendering() {
        let cat = EmojiItem {
            emoji: "🐱".into(),
            english: "cat".into(),
            japanese: "猫".into(),
            hiragana: "ねこ".into(),
            romaji: "neko".into(),
        };
        assert_eq!(EmojiScript::Japanese.render(&cat), "猫");
        assert_eq!(EmojiScript::Hiragana.render(&cat), "ねこ");
        assert_eq!(EmojiScript::Romaji.render(&cat), "neko");
    }

    #[test]
    fn script_parses_from_str() {
        assert_eq!("ROMAJI".parse::<EmojiScript>().unwrap(), EmojiScript::Romaji);
        assert!("kanji".parse::<EmojiScript>().is_err());
    }
}
