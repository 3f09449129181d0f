//! Greedy longest-match resolution of tokens against a clip catalog.

use std::path::PathBuf;

use super::catalog::ClipCatalog;
use super::locale::LocaleTable;

pub const DEFAULT_MAX_WINDOW: usize = 3;

/// One step of the resolved sequence, in input order.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "camelCase", tag = "kind")]
pub enum ResolvedItem {
    Matched { phrase: String, path: PathBuf },
    Unmatched { token: String },
}

#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolutionResult {
    /// Clip paths in playback order.
    pub playlist: Vec<PathBuf>,
    /// Tokens without a clip, in input order.
    pub unmatched_tokens: Vec<String>,
    /// Matches and misses interleaved as they occurred in the text.
    pub items: Vec<ResolvedItem>,
}

impl ResolutionResult {
    pub fn is_fully_matched(&self) -> bool {
        self.unmatched_tokens.is_empty()
    }

    fn push_match(&mut self, phrase: String, path: PathBuf) {
        self.playlist.push(path.clone());
        self.items.push(ResolvedItem::Matched { phrase, path });
    }

    fn push_miss(&mut self, token: String) {
        self.unmatched_tokens.push(token.clone());
        self.items.push(ResolvedItem::Unmatched { token });
    }
}

pub struct PhraseResolver<'a> {
    catalog: &'a ClipCatalog,
    max_window: usize,
    locale: Option<&'a LocaleTable>,
}

impl<'a> PhraseResolver<'a> {
    pub fn new(catalog: &'a ClipCatalog) -> Self {
        Self {
            catalog,
            max_window: DEFAULT_MAX_WINDOW,
            locale: None,
        }
    }

    /// Longest phrase, in tokens, tried at each position. Clamped to at least 1.
    pub fn with_max_window(mut self, max_window: usize) -> Self {
        self.max_window = max_window.max(1);
        self
    }

    /// Digits without their own clip fall back to this table's digit words.
    pub fn with_locale(mut self, locale: Option<&'a LocaleTable>) -> Self {
        self.locale = locale;
        self
    }

    pub fn resolve(&self, tokens: &[String]) -> ResolutionResult {
        let mut result = ResolutionResult::default();
        let mut i = 0;
        while i < tokens.len() {
            match self.longest_match(tokens, i) {
                Some((len, path)) => {
                    result.push_match(tokens[i..i + len].join(" "), path);
                    i += len;
                }
                None => {
                    result.push_miss(tokens[i].clone());
                    i += 1;
                }
            }
        }

        log::debug!(
            target: "signcast::text::resolver",
            "Resolved {} tokens: {} clips, {} unmatched",
            tokens.len(),
            result.playlist.len(),
            result.unmatched_tokens.len()
        );
        result
    }

    fn longest_match(&self, tokens: &[String], start: usize) -> Option<(usize, PathBuf)> {
        let longest = self.max_window.min(tokens.len() - start);
        for len in (1..=longest).rev() {
            let phrase = tokens[start..start + len].join(" ");
            if let Some(path) = self.catalog.get(&phrase) {
                return Some((len, path.to_path_buf()));
            }
        }
        let word = self.locale?.digit_word(&tokens[start])?;
        self.catalog.get(word).map(|path| (1, path.to_path_buf()))
    }
}
