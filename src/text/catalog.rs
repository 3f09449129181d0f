//! Clip catalog: canonical clip name -> clip file, built from a directory tree.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

/// One available clip.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClipEntry {
    pub canonical_name: String,
    pub path: PathBuf,
}

/// Two files that mapped to the same canonical name. The later one won.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogCollision {
    pub canonical_name: String,
    pub kept: PathBuf,
    pub shadowed: PathBuf,
}

#[derive(Debug, Clone, Default)]
pub struct ClipCatalog {
    clips: HashMap<String, PathBuf>,
    collisions: Vec<CatalogCollision>,
}

/// Lower-cased file stem, or None when the file has no usable name.
pub fn canonical_name(path: &Path) -> Option<String> {
    let stem = path.file_stem()?.to_str()?.trim();
    if stem.is_empty() {
        None
    } else {
        Some(stem.to_lowercase())
    }
}

fn has_extension(path: &Path, extensions: &[String]) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|ext| extensions.iter().any(|want| want.eq_ignore_ascii_case(ext)))
}

impl ClipCatalog {
    /// Recursively scan `root` for files with one of `extensions`.
    /// A missing or unreadable root yields an empty catalog.
    pub fn scan(root: &Path, extensions: &[String]) -> Self {
        let mut catalog = Self::default();
        if !root.is_dir() {
            log::warn!(
                target: "signcast::text::catalog",
                "Clip directory does not exist: {}",
                root.display()
            );
            return catalog;
        }

        let walker = WalkDir::new(root)
            .follow_links(true)
            .sort_by_file_name()
            .into_iter();
        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    log::warn!(
                        target: "signcast::text::catalog",
                        "Skipping unreadable catalog entry: {}",
                        e
                    );
                    continue;
                }
            };
            if !entry.file_type().is_file() || !has_extension(entry.path(), extensions) {
                continue;
            }
            if let Some(name) = canonical_name(entry.path()) {
                catalog.insert(name, entry.into_path());
            }
        }

        log::debug!(
            target: "signcast::text::catalog",
            "Scanned {}: {} clips, {} collisions",
            root.display(),
            catalog.len(),
            catalog.collisions.len()
        );
        catalog
    }

    /// Build from explicit name/path pairs. Names are lower-cased; later pairs win.
    pub fn from_entries<N, P>(entries: impl IntoIterator<Item = (N, P)>) -> Self
    where
        N: AsRef<str>,
        P: Into<PathBuf>,
    {
        let mut catalog = Self::default();
        for (name, path) in entries {
            catalog.insert(name.as_ref().trim().to_lowercase(), path.into());
        }
        catalog
    }

    fn insert(&mut self, name: String, path: PathBuf) {
        if let Some(previous) = self.clips.insert(name.clone(), path.clone()) {
            log::warn!(
                target: "signcast::text::catalog",
                "Clip name '{}' is ambiguous: {} shadows {}",
                name,
                path.display(),
                previous.display()
            );
            self.collisions.push(CatalogCollision {
                canonical_name: name,
                kept: path,
                shadowed: previous,
            });
        }
    }

    pub fn get(&self, canonical_name: &str) -> Option<&Path> {
        self.clips.get(canonical_name).map(PathBuf::as_path)
    }

    pub fn contains(&self, canonical_name: &str) -> bool {
        self.clips.contains_key(canonical_name)
    }

    pub fn len(&self) -> usize {
        self.clips.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clips.is_empty()
    }

    pub fn collisions(&self) -> &[CatalogCollision] {
        &self.collisions
    }

    /// Entries sorted by name.
    pub fn entries(&self) -> Vec<ClipEntry> {
        let mut entries: Vec<ClipEntry> = self
            .clips
            .iter()
            .map(|(name, path)| ClipEntry {
                canonical_name: name.clone(),
                path: path.clone(),
            })
            .collect();
        entries.sort_by(|a, b| a.canonical_name.cmp(&b.canonical_name));
        entries
    }
}
