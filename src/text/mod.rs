//! Text side of the pipeline: tokenizing announcement text and resolving it
//! into sign-language clips.

pub mod catalog;
pub mod locale;
pub mod resolver;
mod tokenizer;

pub use catalog::{CatalogCollision, ClipCatalog, ClipEntry, canonical_name};
pub use locale::{LocaleRegistry, LocaleTable};
pub use resolver::{DEFAULT_MAX_WINDOW, PhraseResolver, ResolutionResult, ResolvedItem};
pub use tokenizer::tokenize;

use std::path::Path;

use serde::Deserialize;

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct ResolverOptions {
    pub max_window: Option<usize>,
    /// File extensions counted as clips. Default `["mp4"]`.
    pub video_extensions: Option<Vec<String>>,
    /// Digit vocabulary used when a digit has no clip of its own.
    pub locale: Option<LocaleTable>,
}

impl ResolverOptions {
    pub fn effective_max_window(&self) -> usize {
        self.max_window.unwrap_or(DEFAULT_MAX_WINDOW).max(1)
    }

    pub fn effective_video_extensions(&self) -> Vec<String> {
        self.video_extensions
            .clone()
            .filter(|exts| !exts.is_empty())
            .unwrap_or_else(|| vec!["mp4".to_string()])
    }
}

/// Tokenize `text` and resolve it against an existing catalog.
pub fn resolve_text(text: &str, catalog: &ClipCatalog, options: &ResolverOptions) -> ResolutionResult {
    let tokens = tokenize(text);
    PhraseResolver::new(catalog)
        .with_max_window(options.effective_max_window())
        .with_locale(options.locale.as_ref())
        .resolve(&tokens)
}

/// Scan `clip_root` and resolve `text` against it. The catalog lives only for this call.
pub fn resolve_text_in_dir(
    text: &str,
    clip_root: &Path,
    options: &ResolverOptions,
) -> ResolutionResult {
    let catalog = ClipCatalog::scan(clip_root, &options.effective_video_extensions());
    resolve_text(text, &catalog, options)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolve_text_in_dir_scans_fresh_catalog() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("Arriving.mp4"), b"x").unwrap();
        let result = resolve_text_in_dir("Arriving now", dir.path(), &ResolverOptions::default());
        assert_eq!(result.playlist, [dir.path().join("Arriving.mp4")]);
        assert_eq!(result.unmatched_tokens, ["now"]);
    }

    #[test]
    fn empty_extension_list_uses_default() {
        let options = ResolverOptions {
            video_extensions: Some(vec![]),
            ..Default::default()
        };
        assert_eq!(options.effective_video_extensions(), ["mp4"]);
    }
}
