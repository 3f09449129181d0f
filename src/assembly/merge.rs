//! Muxes the sign video with one padded audio stream per language.

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::AppError;
use crate::ffmpeg::{AssemblyOptions, ProgressCallback, build_merge_args, remove_file_logged, run_ffmpeg_blocking};

/// One audio track to lay over the video, optionally tagged with an ISO 639 language.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AudioTrack {
    pub path: PathBuf,
    #[serde(default)]
    pub language: Option<String>,
}

impl AudioTrack {
    pub fn new(path: impl Into<PathBuf>, language: Option<&str>) -> Self {
        Self {
            path: path.into(),
            language: language.map(str::to_string),
        }
    }
}

fn require_file(path: &Path) -> Result<(), AppError> {
    if path.is_file() {
        Ok(())
    } else {
        Err(AppError::MissingInput {
            path: path.to_path_buf(),
        })
    }
}

/// Copy the video stream and add each track as its own padded AAC stream.
/// The result is cut to the shortest stream.
pub fn merge_audio_video(
    video: &Path,
    tracks: &[AudioTrack],
    output: &Path,
    options: &AssemblyOptions,
    progress: Option<ProgressCallback>,
) -> Result<PathBuf, AppError> {
    options.validate()?;
    require_file(video)?;
    if tracks.is_empty() {
        return Err(AppError::InvalidOptions(
            "merge needs at least one audio track".to_string(),
        ));
    }
    for track in tracks {
        require_file(&track.path)?;
    }
    if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }

    let pairs: Vec<(&Path, Option<&str>)> = tracks
        .iter()
        .map(|t| (t.path.as_path(), t.language.as_deref()))
        .collect();
    let args = build_merge_args(video, &pairs, output, options);
    log::info!(
        target: "signcast::assembly::merge",
        "Merging {} audio track(s) onto {}",
        tracks.len(),
        video.display()
    );

    if let Err(e) = run_ffmpeg_blocking(args, None, progress) {
        remove_file_logged(output);
        return Err(e);
    }
    let size = std::fs::metadata(output).map(|m| m.len()).unwrap_or(0);
    if size == 0 {
        remove_file_logged(output);
        return Err(AppError::EmptyOutput {
            path: output.to_path_buf(),
        });
    }
    Ok(output.to_path_buf())
}
