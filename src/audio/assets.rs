//! Pre-recorded per-language token audio.

use std::path::PathBuf;

use crate::error::AppError;

fn is_plain_name(name: &str) -> bool {
    !name.is_empty() && !name.contains(['/', '\\']) && !name.starts_with('.')
}

/// Language codes name a subdirectory of the asset root and a suffix of output
/// files, so they must be a single plain path component.
pub fn validate_language(language: &str) -> Result<(), AppError> {
    if is_plain_name(language) {
        Ok(())
    } else {
        Err(AppError::InvalidOptions(format!(
            "language code '{}' must be a plain name",
            language
        )))
    }
}

/// Supplies a pre-recorded WAV for one token in one language.
pub trait AudioAssetSource: Send + Sync {
    fn lookup(&self, language: &str, token: &str) -> Option<PathBuf>;
}

/// `<root>/<language>/<token>.wav`
#[derive(Debug, Clone)]
pub struct DirectoryAudioAssets {
    root: PathBuf,
}

impl DirectoryAudioAssets {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl AudioAssetSource for DirectoryAudioAssets {
    fn lookup(&self, language: &str, token: &str) -> Option<PathBuf> {
        // Both come from the request; keep lookups inside the asset root.
        if !is_plain_name(language) || !is_plain_name(token) {
            return None;
        }
        let path = self.root.join(language).join(format!("{}.wav", token));
        path.is_file().then_some(path)
    }
}

/// Look up every token in order. Misses stay as `None` so positions line up
/// with the tokens; the second value lists the tokens that had no asset.
pub fn collect_audio_parts(
    source: &dyn AudioAssetSource,
    language: &str,
    tokens: &[String],
) -> (Vec<Option<PathBuf>>, Vec<String>) {
    let mut missing = Vec::new();
    let parts = tokens
        .iter()
        .map(|token| {
            let found = source.lookup(language, token);
            if found.is_none() {
                log::debug!(
                    target: "signcast::audio::assets",
                    "No {} audio for token '{}'",
                    language,
                    token
                );
                missing.push(token.clone());
            }
            found
        })
        .collect();
    (parts, missing)
}
