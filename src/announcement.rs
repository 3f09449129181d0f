//! End-to-end assembly of one announcement: sign video from the clip catalog,
//! one spliced audio track per language, merged into a single file.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Deserialize;

use crate::assembly::{AudioTrack, concat_videos, merge_audio_video, normalize_batch};
use crate::audio::{AudioAssetSource, collect_audio_parts, splice_wav_files, validate_language};
use crate::error::AppError;
use crate::ffmpeg::{AssemblyOptions, FfmpegProgressPayload, remove_file_logged};
use crate::pool::TranscodePool;
use crate::text::{ClipCatalog, ResolverOptions, resolve_text, tokenize};

pub type ProgressEmitter = Arc<dyn Fn(FfmpegProgressPayload) + Send + Sync>;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AudioLanguage {
    /// ISO 639 code; also the asset subdirectory name.
    pub language: String,
    /// Text spoken in this language. Defaults to the announcement text.
    #[serde(default)]
    pub text: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnnouncementRequest {
    pub text: String,
    pub clip_root: PathBuf,
    pub output: PathBuf,
    #[serde(default)]
    pub languages: Vec<AudioLanguage>,
    #[serde(default)]
    pub assembly: AssemblyOptions,
    #[serde(default)]
    pub resolver: ResolverOptions,
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MissingAudio {
    pub language: String,
    /// Tokens with no recorded audio in this language.
    pub tokens: Vec<String>,
    /// Set when the whole track was dropped.
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "camelCase", rename_all_fields = "camelCase", tag = "kind")]
pub enum AnnouncementStatus {
    Complete,
    Partial {
        unmatched_tokens: Vec<String>,
        missing_audio: Vec<MissingAudio>,
        skipped_clips: Vec<PathBuf>,
    },
}

#[derive(Debug, Clone, PartialEq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnnouncementOutcome {
    pub output: PathBuf,
    pub sign_video: PathBuf,
    pub audio_tracks: Vec<AudioTrack>,
    pub status: AnnouncementStatus,
}

/// `<dir>/<stem>.<tag>.<ext>` next to the final output.
pub(crate) fn sibling_path(output: &Path, tag: &str, ext: &str) -> PathBuf {
    let stem = output
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| "announcement".to_string());
    output.with_file_name(format!("{}.{}.{}", stem, tag, ext))
}

fn emit(progress: &Option<ProgressEmitter>, value: f64, step: &str) {
    if let Some(emit) = progress {
        emit(FfmpegProgressPayload {
            progress: value,
            step: Some(step.to_string()),
        });
    }
}

pub async fn assemble_announcement(
    request: AnnouncementRequest,
    audio_source: Arc<dyn AudioAssetSource>,
    progress: Option<ProgressEmitter>,
) -> Result<AnnouncementOutcome, AppError> {
    let AnnouncementRequest {
        text,
        clip_root,
        output,
        languages,
        assembly,
        resolver,
    } = request;
    assembly.validate()?;
    for entry in &languages {
        validate_language(&entry.language)?;
    }
    let pool = TranscodePool::from_options(&assembly);

    emit(&progress, 0.0, "resolving");
    let catalog = ClipCatalog::scan(&clip_root, &resolver.effective_video_extensions());
    let resolution = resolve_text(&text, &catalog, &resolver);
    log::info!(
        target: "signcast::announcement",
        "Resolved {} clip(s), {} unmatched token(s)",
        resolution.playlist.len(),
        resolution.unmatched_tokens.len()
    );
    if resolution.playlist.is_empty() {
        return Err(AppError::NoValidInputs);
    }
    if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }

    emit(&progress, 0.1, "normalizing");
    let batch = {
        let playlist = resolution.playlist.clone();
        let options = assembly.clone();
        pool.run(move || normalize_batch(&playlist, &options)).await?
    };
    let skipped_clips: Vec<PathBuf> = batch.failures.iter().map(|f| f.path.clone()).collect();

    emit(&progress, 0.5, "concatenating");
    let sign_video = sibling_path(&output, "sign", "mp4");
    let concat_result = {
        let clips = batch.outputs.clone();
        let target = sign_video.clone();
        let options = assembly.clone();
        pool.run(move || {
            let outcome = concat_videos(&clips, &target, &options, None)?;
            if outcome.output != target {
                std::fs::copy(&outcome.output, &target)?;
            }
            Ok(outcome)
        })
        .await
    };
    for clip in &batch.outputs {
        remove_file_logged(clip);
    }
    let concat = concat_result?;
    if !concat.warnings.is_empty() {
        log::warn!(
            target: "signcast::announcement",
            "Sign video has {} compatibility warning(s)",
            concat.warnings.len()
        );
    }

    emit(&progress, 0.7, "splicing_audio");
    let mut missing_audio = Vec::new();
    let mut jobs = Vec::with_capacity(languages.len());
    for entry in &languages {
        let tokens = tokenize(entry.text.as_deref().unwrap_or(&text));
        let (parts, missing) = collect_audio_parts(audio_source.as_ref(), &entry.language, &tokens);
        if !missing.is_empty() {
            missing_audio.push(MissingAudio {
                language: entry.language.clone(),
                tokens: missing,
                error: None,
            });
        }
        let target = sibling_path(&output, &entry.language, "wav");
        jobs.push(move || splice_wav_files(&parts, &target));
    }
    let results = pool.run_all(jobs).await;

    let mut audio_tracks = Vec::new();
    for (entry, result) in languages.iter().zip(results) {
        let error = match result {
            Ok(Some(report)) => {
                audio_tracks.push(AudioTrack::new(report.output, Some(entry.language.as_str())));
                continue;
            }
            Ok(None) => "no audio parts available".to_string(),
            Err(e) if e.is_terminal() => return Err(e),
            Err(e) => e.to_string(),
        };
        log::warn!(
            target: "signcast::announcement",
            "Dropping {} audio track: {}",
            entry.language,
            error
        );
        match missing_audio.iter_mut().find(|m| m.language == entry.language) {
            Some(existing) => existing.error = Some(error),
            None => missing_audio.push(MissingAudio {
                language: entry.language.clone(),
                tokens: Vec::new(),
                error: Some(error),
            }),
        }
    }

    emit(&progress, 0.85, "merging");
    if audio_tracks.is_empty() {
        std::fs::copy(&sign_video, &output)?;
    } else {
        let video = sign_video.clone();
        let tracks = audio_tracks.clone();
        let target = output.clone();
        let options = assembly.clone();
        pool.run(move || merge_audio_video(&video, &tracks, &target, &options, None))
            .await?;
    }
    emit(&progress, 1.0, "complete");

    let status = if resolution.unmatched_tokens.is_empty()
        && missing_audio.is_empty()
        && skipped_clips.is_empty()
    {
        AnnouncementStatus::Complete
    } else {
        AnnouncementStatus::Partial {
            unmatched_tokens: resolution.unmatched_tokens,
            missing_audio,
            skipped_clips,
        }
    };
    Ok(AnnouncementOutcome {
        output,
        sign_video,
        audio_tracks,
        status,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::DirectoryAudioAssets;

    #[test]
    fn sibling_paths_share_the_output_stem() {
        let out = Path::new("/out/train-42.mp4");
        assert_eq!(sibling_path(out, "sign", "mp4"), Path::new("/out/train-42.sign.mp4"));
        assert_eq!(sibling_path(out, "hi", "wav"), Path::new("/out/train-42.hi.wav"));
    }

    #[test]
    fn request_deserializes_with_defaults() {
        let request: AnnouncementRequest = serde_json::from_str(
            r#"{"text": "Platform 1", "clipRoot": "/clips", "output": "/out/a.mp4",
                "languages": [{"language": "en"}], "assembly": {"playbackSpeed": 1.5}}"#,
        )
        .unwrap();
        assert_eq!(request.languages[0].language, "en");
        assert!(request.languages[0].text.is_none());
        assert_eq!(request.assembly.effective_playback_speed(), 1.5);
        assert_eq!(request.resolver.effective_max_window(), 3);
    }

    #[tokio::test]
    async fn nothing_resolvable_is_no_valid_inputs() {
        let dir = tempfile::tempdir().unwrap();
        let request = AnnouncementRequest {
            text: "unknown words".to_string(),
            clip_root: dir.path().join("clips"),
            output: dir.path().join("out.mp4"),
            languages: Vec::new(),
            assembly: AssemblyOptions::default(),
            resolver: ResolverOptions::default(),
        };
        let err = assemble_announcement(request, Arc::new(DirectoryAudioAssets::new(dir.path())), None)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NoValidInputs));
    }

    #[tokio::test]
    async fn traversing_language_is_rejected_before_any_work() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("clips")).unwrap();
        std::fs::write(dir.path().join("clips/platform.mp4"), b"x").unwrap();
        let request = AnnouncementRequest {
            text: "platform".to_string(),
            clip_root: dir.path().join("clips"),
            output: dir.path().join("out/a.mp4"),
            languages: vec![AudioLanguage {
                language: "../../etc/evil".to_string(),
                text: None,
            }],
            assembly: AssemblyOptions::default(),
            resolver: ResolverOptions::default(),
        };
        let err = assemble_announcement(request, Arc::new(DirectoryAudioAssets::new(dir.path())), None)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidOptions(_)));
        assert!(!dir.path().join("out").exists());
    }

    #[test]
    fn partial_status_serializes_with_kind_tag() {
        let status = AnnouncementStatus::Partial {
            unmatched_tokens: vec!["12".into()],
            missing_audio: Vec::new(),
            skipped_clips: Vec::new(),
        };
        let json = serde_json::to_value(&status).unwrap();
        assert_eq!(json["kind"], "partial");
        assert_eq!(json["unmatchedTokens"][0], "12");
    }
}
