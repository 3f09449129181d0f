//! Temp file naming and best-effort cleanup for per-request working files.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

const TEMP_PREFIX: &str = "signcast-";

static TEMP_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Creates uniquely named files in a working directory. Names carry a
/// timestamp, the process id and a counter so concurrent requests never collide.
#[derive(Debug, Clone)]
pub struct TempFileManager {
    dir: PathBuf,
}

impl Default for TempFileManager {
    fn default() -> Self {
        Self {
            dir: std::env::temp_dir(),
        }
    }
}

impl TempFileManager {
    pub fn in_dir(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Returns a fresh path ending in `suffix`; writes `content` when given.
    pub fn create(&self, suffix: &str, content: Option<&[u8]>) -> io::Result<PathBuf> {
        fs::create_dir_all(&self.dir)?;
        let millis = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis();
        let name = format!(
            "{}{}-{}-{}-{}",
            TEMP_PREFIX,
            millis,
            std::process::id(),
            TEMP_COUNTER.fetch_add(1, Ordering::Relaxed),
            suffix
        );
        let path = self.dir.join(name);
        if let Some(data) = content {
            fs::write(&path, data)?;
        }
        Ok(path)
    }
}

/// Remove a file, logging instead of failing. Missing files are fine.
pub fn remove_file_logged(path: &Path) {
    match fs::remove_file(path) {
        Ok(()) => {
            log::trace!(target: "signcast::ffmpeg::temp", "Removed {}", path.display());
        }
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => {
            log::warn!(
                target: "signcast::ffmpeg::temp",
                "Failed to remove temp file {}: {}",
                path.display(),
                e
            );
        }
    }
}

/// Delete our temp files older than `max_age` from the system temp dir.
/// Returns how many were removed.
pub fn cleanup_old_temp_files(max_age: Duration) -> usize {
    cleanup_old_temp_files_in(&std::env::temp_dir(), max_age)
}

pub fn cleanup_old_temp_files_in(dir: &Path, max_age: Duration) -> usize {
    let Ok(entries) = fs::read_dir(dir) else {
        return 0;
    };
    let now = SystemTime::now();
    let mut removed = 0;
    for entry in entries.flatten() {
        let is_ours = entry
            .file_name()
            .to_str()
            .is_some_and(|n| n.starts_with(TEMP_PREFIX));
        if !is_ours {
            continue;
        }
        let age = entry
            .metadata()
            .and_then(|m| m.modified())
            .ok()
            .and_then(|modified| now.duration_since(modified).ok());
        if age.is_some_and(|a| a > max_age) && fs::remove_file(entry.path()).is_ok() {
            removed += 1;
        }
    }
    if removed > 0 {
        log::info!(
            target: "signcast::ffmpeg::temp",
            "Removed {} stale temp file(s) from {}",
            removed,
            dir.display()
        );
    }
    removed
}
