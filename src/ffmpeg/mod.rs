mod builder;
pub mod discovery;
mod error;
pub mod ffprobe;
mod progress;
mod runner;
mod temp;
mod verify;

pub use builder::{
    build_filtered_concat_args, build_merge_args, build_normalize_args, build_stream_concat_args,
    format_args_for_display_multiline, format_number, scale_pad_filter, setpts_filter,
};
pub use error::{FfmpegErrorPayload, parse_ffmpeg_error};
pub use runner::{ProgressCallback, active_ffmpeg_count, run_ffmpeg_blocking, terminate_all_ffmpeg};
pub use temp::{TempFileManager, cleanup_old_temp_files, cleanup_old_temp_files_in, remove_file_logged};
pub use verify::decode_check;

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::AppError;

/// Progress payload emitted to sidecar clients.
#[derive(Debug, Clone, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FfmpegProgressPayload {
    pub progress: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub step: Option<String>,
}

pub const DEFAULT_FPS: f64 = 30.0;
pub const DEFAULT_WIDTH: u32 = 1280;
pub const DEFAULT_HEIGHT: u32 = 720;
pub const DEFAULT_AUDIO_PAD_SECS: f64 = 85.0;
pub const MIN_PLAYABLE_DURATION_SECS: f64 = 0.1;
pub const MAX_PLAYABLE_DURATION_SECS: f64 = 3600.0;
pub const MIN_PLAYABLE_FILE_BYTES: u64 = 1024;
/// Above this the PTS factor no longer survives six-decimal filter formatting.
pub const MAX_PLAYBACK_SPEED: f64 = 100.0;

/// Encoding and assembly settings. Every field is optional so callers (and
/// config files) only spell out what they change; `effective_*` supplies defaults.
#[derive(Debug, Deserialize, Clone, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct AssemblyOptions {
    pub fps: Option<f64>,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub codec: Option<String>,
    pub preset: Option<String>,
    pub crf: Option<u32>,
    /// 1.0 is real time; 2.0 plays twice as fast.
    pub playback_speed: Option<f64>,
    /// Silence appended to every audio track before merging.
    pub audio_pad_seconds: Option<f64>,
    pub audio_codec: Option<String>,
    /// Audio bitrate in kbps. Default 128.
    pub audio_bitrate: Option<u32>,
    pub min_duration_secs: Option<f64>,
    pub max_duration_secs: Option<f64>,
    pub min_output_bytes: Option<u64>,
    /// Upper bound on simultaneous FFmpeg processes. Default: available parallelism.
    pub max_concurrent_transcodes: Option<usize>,
    /// Where normalized clips, manifests and intermediate files go. Default: system temp dir.
    pub work_dir: Option<PathBuf>,
    /// Run a decode-to-null pass as part of the playback compatibility check. Default false.
    pub decode_check: Option<bool>,
}

impl AssemblyOptions {
    pub fn from_json_file(path: &Path) -> Result<Self, AppError> {
        let text = std::fs::read_to_string(path)?;
        serde_json::from_str(&text).map_err(|e| {
            AppError::InvalidOptions(format!("{}: {}", path.display(), e))
        })
    }

    pub fn effective_fps(&self) -> f64 {
        let fps = self.fps.unwrap_or(DEFAULT_FPS);
        (fps * 100.0).round() / 100.0
    }

    pub fn effective_width(&self) -> u32 {
        self.width.unwrap_or(DEFAULT_WIDTH)
    }

    pub fn effective_height(&self) -> u32 {
        self.height.unwrap_or(DEFAULT_HEIGHT)
    }

    pub fn effective_codec(&self) -> &str {
        self.codec.as_deref().unwrap_or("libx264")
    }

    pub fn effective_preset(&self) -> &str {
        self.preset.as_deref().unwrap_or("medium")
    }

    pub fn effective_crf(&self) -> u32 {
        self.crf.unwrap_or(23).min(51)
    }

    pub fn effective_playback_speed(&self) -> f64 {
        self.playback_speed.unwrap_or(1.0)
    }

    pub fn effective_audio_pad_seconds(&self) -> f64 {
        self.audio_pad_seconds.unwrap_or(DEFAULT_AUDIO_PAD_SECS)
    }

    pub fn effective_audio_codec(&self) -> &str {
        self.audio_codec.as_deref().unwrap_or("aac")
    }

    pub fn effective_audio_bitrate(&self) -> u32 {
        self.audio_bitrate.unwrap_or(128).clamp(32, 320)
    }

    pub fn effective_min_duration_secs(&self) -> f64 {
        self.min_duration_secs.unwrap_or(MIN_PLAYABLE_DURATION_SECS)
    }

    pub fn effective_max_duration_secs(&self) -> f64 {
        self.max_duration_secs.unwrap_or(MAX_PLAYABLE_DURATION_SECS)
    }

    pub fn effective_min_output_bytes(&self) -> u64 {
        self.min_output_bytes.unwrap_or(MIN_PLAYABLE_FILE_BYTES)
    }

    pub fn effective_max_concurrent_transcodes(&self) -> usize {
        self.max_concurrent_transcodes
            .unwrap_or_else(|| {
                std::thread::available_parallelism()
                    .map(|n| n.get())
                    .unwrap_or(1)
            })
            .max(1)
    }

    pub fn effective_work_dir(&self) -> PathBuf {
        self.work_dir.clone().unwrap_or_else(std::env::temp_dir)
    }

    pub fn effective_decode_check(&self) -> bool {
        self.decode_check.unwrap_or(false)
    }

    /// PTS multiplier implementing the playback speed.
    pub fn pts_factor(&self) -> f64 {
        1.0 / self.effective_playback_speed()
    }

    pub fn temp_files(&self) -> TempFileManager {
        TempFileManager::in_dir(self.effective_work_dir())
    }

    /// Rejects settings FFmpeg would fail on much later with a less useful error.
    pub fn validate(&self) -> Result<(), AppError> {
        let speed = self.effective_playback_speed();
        if !speed.is_finite() || speed <= 0.0 || speed > MAX_PLAYBACK_SPEED {
            return Err(AppError::InvalidOptions(format!(
                "playbackSpeed must be in (0, {}], got {}",
                MAX_PLAYBACK_SPEED, speed
            )));
        }
        let fps = self.effective_fps();
        if !fps.is_finite() || fps <= 0.0 {
            return Err(AppError::InvalidOptions(format!(
                "fps must be a positive number, got {}",
                fps
            )));
        }
        let (w, h) = (self.effective_width(), self.effective_height());
        if w == 0 || h == 0 || w % 2 != 0 || h % 2 != 0 {
            return Err(AppError::InvalidOptions(format!(
                "resolution must be positive and even, got {}x{}",
                w, h
            )));
        }
        let pad = self.effective_audio_pad_seconds();
        if !pad.is_finite() || pad < 0.0 {
            return Err(AppError::InvalidOptions(format!(
                "audioPadSeconds must be zero or positive, got {}",
                pad
            )));
        }
        if self.effective_min_duration_secs() > self.effective_max_duration_secs() {
            return Err(AppError::InvalidOptions(
                "minDurationSecs is greater than maxDurationSecs".to_string(),
            ));
        }
        Ok(())
    }
}

/// Path to string for FFmpeg args or logging.
pub fn path_to_string(path: &(impl AsRef<Path> + ?Sized)) -> String {
    path.as_ref().to_string_lossy().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_canonical_clip_format() {
        let o = AssemblyOptions::default();
        assert_eq!(o.effective_fps(), 30.0);
        assert_eq!((o.effective_width(), o.effective_height()), (1280, 720));
        assert_eq!(o.effective_codec(), "libx264");
        assert_eq!(o.effective_audio_pad_seconds(), 85.0);
        assert_eq!(o.pts_factor(), 1.0);
        assert!(o.effective_max_concurrent_transcodes() >= 1);
        assert!(o.validate().is_ok());
    }

    #[test]
    fn deserializes_camel_case_partial_config() {
        let o: AssemblyOptions =
            serde_json::from_str(r#"{"playbackSpeed": 2.0, "width": 640, "height": 360}"#)
                .unwrap();
        assert_eq!(o.pts_factor(), 0.5);
        assert_eq!(o.effective_width(), 640);
        assert_eq!(o.effective_fps(), 30.0);
    }

    #[test]
    fn from_json_file_reports_path_on_bad_config() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("assembly.json");
        std::fs::write(&path, r#"{"fps": "fast"}"#).unwrap();
        let err = AssemblyOptions::from_json_file(&path).unwrap_err();
        assert!(matches!(err, AppError::InvalidOptions(ref m) if m.contains("assembly.json")));
    }

    #[test]
    fn validate_rejects_bad_speed_and_odd_resolution() {
        let mut o = AssemblyOptions::default();
        o.playback_speed = Some(0.0);
        assert!(o.validate().is_err());
        o.playback_speed = Some(f64::NAN);
        assert!(o.validate().is_err());
        o.playback_speed = Some(3_000_000.0);
        assert!(o.validate().is_err());
        o.playback_speed = Some(MAX_PLAYBACK_SPEED);
        assert!(o.validate().is_ok());
        o.playback_speed = Some(1.5);
        o.width = Some(641);
        assert!(o.validate().is_err());
    }

    #[test]
    fn concurrency_is_at_least_one() {
        let mut o = AssemblyOptions::default();
        o.max_concurrent_transcodes = Some(0);
        assert_eq!(o.effective_max_concurrent_transcodes(), 1);
    }
}
