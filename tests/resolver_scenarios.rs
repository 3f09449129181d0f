use std::fs;
use std::path::Path;

use signcast_core::text::{
    ClipCatalog, LocaleRegistry, PhraseResolver, ResolverOptions, resolve_text, tokenize,
};

fn catalog_dir(names: &[&str]) -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    for name in names {
        let path = dir.path().join(name);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, b"clip").unwrap();
    }
    dir
}

fn scan(dir: &Path) -> ClipCatalog {
    ClipCatalog::scan(dir, &["mp4".to_string()])
}

#[test]
fn single_known_words_produce_one_clip_each() {
    let dir = catalog_dir(&["train.mp4", "arriving.mp4", "now.mp4"]);
    let catalog = scan(dir.path());
    let result = resolve_text("Train arriving now", &catalog, &ResolverOptions::default());
    assert!(result.unmatched_tokens.is_empty());
    assert_eq!(result.playlist.len(), 3);
}

#[test]
fn multi_word_phrase_clip_beats_its_words() {
    let dir = catalog_dir(&[
        "stations/Mumbai Central.mp4",
        "words/mumbai.mp4",
        "words/central.mp4",
        "words/station.mp4",
    ]);
    let catalog = scan(dir.path());
    let result = resolve_text("mumbai central station", &catalog, &ResolverOptions::default());
    assert_eq!(
        result.playlist,
        [
            dir.path().join("stations/Mumbai Central.mp4"),
            dir.path().join("words/station.mp4"),
        ]
    );
}

#[test]
fn digit_runs_are_split_into_single_digits() {
    assert_eq!(tokenize("123"), ["1", "2", "3"]);
}

#[test]
fn platform_twelve_without_digit_clips() {
    let dir = catalog_dir(&["platform.mp4"]);
    let catalog = scan(dir.path());
    let result = resolve_text("Platform 12", &catalog, &ResolverOptions::default());
    assert_eq!(result.playlist, [dir.path().join("platform.mp4")]);
    assert_eq!(result.unmatched_tokens, ["1", "2"]);
}

#[test]
fn resolution_is_idempotent_for_an_unchanged_catalog() {
    let dir = catalog_dir(&["platform.mp4", "1.mp4", "welcome to.mp4"]);
    let catalog = scan(dir.path());
    let tokens = tokenize("Welcome to platform 11 today");
    let resolver = PhraseResolver::new(&catalog);
    assert_eq!(resolver.resolve(&tokens), resolver.resolve(&tokens));
}

#[test]
fn injected_locale_maps_digits_per_language() {
    let dir = catalog_dir(&["platform.mp4", "ek.mp4", "do.mp4"]);
    let catalog = scan(dir.path());
    let registry = LocaleRegistry::from_json(
        r#"[{"language": "hi", "digitWords": ["shunya","ek","do","teen","char","paanch","chhah","saat","aath","nau"]}]"#,
    )
    .unwrap();
    let options = ResolverOptions {
        locale: registry.get("hi").cloned(),
        ..Default::default()
    };
    let result = resolve_text("platform 12", &catalog, &options);
    assert!(result.is_fully_matched());
    assert_eq!(
        result.playlist,
        [
            dir.path().join("platform.mp4"),
            dir.path().join("ek.mp4"),
            dir.path().join("do.mp4"),
        ]
    );
}

#[test]
fn missing_catalog_root_resolves_nothing() {
    let catalog = scan(Path::new("/definitely/not/here"));
    let result = resolve_text("platform", &catalog, &ResolverOptions::default());
    assert!(result.playlist.is_empty());
    assert_eq!(result.unmatched_tokens, ["platform"]);
}
