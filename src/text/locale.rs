//! Per-language digit vocabularies, injected into the resolver as plain values.

use std::collections::HashMap;

use serde::Deserialize;

use crate::error::AppError;

/// Spoken/signed words for the digits 0-9 in one language.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocaleTable {
    pub language: String,
    digit_words: [String; 10],
}

impl LocaleTable {
    pub fn new(language: impl Into<String>, digit_words: [&str; 10]) -> Self {
        Self {
            language: language.into(),
            digit_words: digit_words.map(|w| w.to_lowercase()),
        }
    }

    pub fn english() -> Self {
        Self::new(
            "en",
            [
                "zero", "one", "two", "three", "four", "five", "six", "seven", "eight", "nine",
            ],
        )
    }

    /// Word for a single-digit token, None for anything else.
    pub fn digit_word(&self, token: &str) -> Option<&str> {
        let mut chars = token.chars();
        let digit = chars.next()?.to_digit(10)?;
        if chars.next().is_some() {
            return None;
        }
        Some(self.digit_words[digit as usize].as_str())
    }
}

/// Read-only collection of locale tables keyed by language code.
#[derive(Debug, Clone, Default)]
pub struct LocaleRegistry {
    tables: HashMap<String, LocaleTable>,
}

impl LocaleRegistry {
    pub fn new(tables: impl IntoIterator<Item = LocaleTable>) -> Self {
        Self {
            tables: tables
                .into_iter()
                .map(|mut t| {
                    for word in t.digit_words.iter_mut() {
                        *word = word.to_lowercase();
                    }
                    (t.language.to_lowercase(), t)
                })
                .collect(),
        }
    }

    /// Parses a JSON array of `{ "language": "..", "digitWords": [10 words] }`.
    pub fn from_json(json: &str) -> Result<Self, AppError> {
        let tables: Vec<LocaleTable> = serde_json::from_str(json)
            .map_err(|e| AppError::InvalidOptions(format!("locale tables: {}", e)))?;
        Ok(Self::new(tables))
    }

    pub fn get(&self, language: &str) -> Option<&LocaleTable> {
        self.tables.get(&language.to_lowercase())
    }
}
