//! Re-encode clips to the canonical frame rate, resolution and codec so the
//! concat demuxer can join them without per-frame filtering.

use std::path::{Path, PathBuf};

use super::validator::validate_media;
use crate::error::AppError;
use crate::ffmpeg::{
    AssemblyOptions, ProgressCallback, build_normalize_args, remove_file_logged,
    run_ffmpeg_blocking,
};

/// Checks an encoder output: non-empty and valid media. On failure the file is removed.
pub(crate) fn verify_output(output: &Path) -> Result<f64, AppError> {
    let size = std::fs::metadata(output).map(|m| m.len()).unwrap_or(0);
    if size == 0 {
        remove_file_logged(output);
        return Err(AppError::EmptyOutput {
            path: output.to_path_buf(),
        });
    }
    let descriptor = validate_media(output);
    if !descriptor.valid {
        remove_file_logged(output);
        return Err(AppError::InvalidMedia {
            path: output.to_path_buf(),
            reason: descriptor.error.unwrap_or_default(),
        });
    }
    Ok(descriptor.duration_seconds.unwrap_or(0.0))
}

pub fn normalize_clip(
    input: &Path,
    output: &Path,
    options: &AssemblyOptions,
    progress: Option<ProgressCallback>,
) -> Result<PathBuf, AppError> {
    options.validate()?;
    let source = validate_media(input);
    if !source.valid {
        return Err(AppError::InvalidMedia {
            path: input.to_path_buf(),
            reason: source.error.unwrap_or_default(),
        });
    }
    if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }

    let args = build_normalize_args(input, output, options);
    if let Err(e) = run_ffmpeg_blocking(args, source.duration_seconds, progress) {
        remove_file_logged(output);
        return Err(e);
    }
    verify_output(output)?;

    log::debug!(
        target: "signcast::assembly::normalizer",
        "Normalized {} -> {}",
        input.display(),
        output.display()
    );
    Ok(output.to_path_buf())
}

#[derive(Debug, Clone, PartialEq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClipFailure {
    pub path: PathBuf,
    pub reason: String,
}

#[derive(Debug, Clone, Default, PartialEq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NormalizedBatch {
    /// Normalized clips in input order, failures left out.
    pub outputs: Vec<PathBuf>,
    pub failures: Vec<ClipFailure>,
}

/// Normalize each clip into the working directory, one after another.
/// A failing clip is logged and skipped. Cancellation still aborts the batch.
pub fn normalize_batch(inputs: &[PathBuf], options: &AssemblyOptions) -> Result<NormalizedBatch, AppError> {
    options.validate()?;
    let temp = options.temp_files();
    let mut batch = NormalizedBatch::default();
    for input in inputs {
        let output = temp.create("normalized.mp4", None)?;
        match normalize_clip(input, &output, options, None) {
            Ok(path) => batch.outputs.push(path),
            Err(e) if e.is_terminal() => return Err(e),
            Err(e) => {
                log::warn!(
                    target: "signcast::assembly::normalizer",
                    "Skipping clip {}: {}",
                    input.display(),
                    e
                );
                batch.failures.push(ClipFailure {
                    path: input.clone(),
                    reason: e.to_string(),
                });
            }
        }
    }
    Ok(batch)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_output_is_removed_and_reported() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("out.mp4");
        std::fs::write(&out, b"").unwrap();
        let err = verify_output(&out).unwrap_err();
        assert!(matches!(err, AppError::EmptyOutput { .. }));
        assert!(!out.exists());
    }

    #[test]
    fn invalid_input_is_rejected_before_encoding() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("blank.mp4");
        std::fs::write(&input, b"").unwrap();
        let err = normalize_clip(&input, &dir.path().join("o.mp4"), &AssemblyOptions::default(), None)
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidMedia { ref path, .. } if path == &input));
    }

    #[test]
    fn batch_skips_broken_clips() {
        let dir = tempfile::tempdir().unwrap();
        let broken = dir.path().join("broken.mp4");
        std::fs::write(&broken, b"").unwrap();
        let options = AssemblyOptions {
            work_dir: Some(dir.path().join("work")),
            ..Default::default()
        };
        let batch = normalize_batch(&[broken.clone(), dir.path().join("missing.mp4")], &options)
            .unwrap();
        assert!(batch.outputs.is_empty());
        assert_eq!(batch.failures.len(), 2);
        assert_eq!(batch.failures[0].path, broken);
    }
}
