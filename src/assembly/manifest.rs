//! Concat demuxer list file, removed when dropped.

use std::path::{Path, PathBuf};

use crate::ffmpeg::{TempFileManager, remove_file_logged};

/// `file '<path>'`, with single quotes escaped the way the concat demuxer expects.
pub(crate) fn manifest_line(path: &Path) -> String {
    let escaped = path.to_string_lossy().replace('\'', "'\\''");
    format!("file '{}'", escaped)
}

pub(crate) fn manifest_body(inputs: &[PathBuf]) -> String {
    let mut body = String::new();
    for input in inputs {
        let absolute = std::path::absolute(input).unwrap_or_else(|_| input.clone());
        body.push_str(&manifest_line(&absolute));
        body.push('\n');
    }
    body
}

#[derive(Debug)]
pub struct ConcatManifest {
    path: PathBuf,
}

impl ConcatManifest {
    pub fn write(temp: &TempFileManager, inputs: &[PathBuf]) -> std::io::Result<Self> {
        let body = manifest_body(inputs);
        let path = temp.create("concat.txt", Some(body.as_bytes()))?;
        log::trace!(
            target: "signcast::assembly::manifest",
            "Wrote concat manifest {} ({} entries)",
            path.display(),
            inputs.len()
        );
        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for ConcatManifest {
    fn drop(&mut self) {
        remove_file_logged(&self.path);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quotes_are_escaped() {
        assert_eq!(
            manifest_line(Path::new("/clips/it's.mp4")),
            r"file '/clips/it'\''s.mp4'"
        );
    }

    #[test]
    fn relative_inputs_become_absolute() {
        let body = manifest_body(&[PathBuf::from("a.mp4")]);
        let listed = body.trim_end().trim_start_matches("file '").trim_end_matches('\'');
        assert!(Path::new(listed).is_absolute());
    }

    #[test]
    fn manifest_is_removed_on_drop() {
        let dir = tempfile::tempdir().unwrap();
        let temp = TempFileManager::in_dir(dir.path());
        let manifest =
            ConcatManifest::write(&temp, &[PathBuf::from("/a.mp4"), PathBuf::from("/b.mp4")]).unwrap();
        let path = manifest.path().to_path_buf();
        assert_eq!(
            std::fs::read_to_string(&path).unwrap(),
            "file '/a.mp4'\nfile '/b.mp4'\n"
        );
        drop(manifest);
        assert!(!path.exists());
    }
}
