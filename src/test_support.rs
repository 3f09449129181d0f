//! Fixture builders exposed for integration test targets. Every helper shells
//! out to the discovered FFmpeg with lavfi sources, so no media is checked in.

use std::path::Path;
use std::process::{Command, Stdio};

use crate::error::AppError;
use crate::ffmpeg::discovery::get_ffmpeg_path;
use crate::ffmpeg::ffprobe::{ProbeReport, probe_media};
use crate::ffmpeg::path_to_string;

fn run_fixture_ffmpeg(args: Vec<String>) -> Result<(), AppError> {
    let ffmpeg = get_ffmpeg_path()?;
    let output = Command::new(ffmpeg)
        .args(&args)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::piped())
        .output()?;
    if output.status.success() {
        Ok(())
    } else {
        Err(AppError::ffmpeg_failed(
            output.status.code().unwrap_or(-1),
            String::from_utf8_lossy(&output.stderr).to_string(),
        ))
    }
}

fn fixture_prefix() -> Vec<String> {
    ["-loglevel", "error", "-nostdin", "-y"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

/// Silent H.264 test pattern of the given size and frame rate.
pub fn create_test_clip(
    output: &Path,
    duration_secs: f64,
    width: u32,
    height: u32,
    fps: u32,
) -> Result<(), AppError> {
    let mut args = fixture_prefix();
    args.extend([
        "-f".into(),
        "lavfi".into(),
        "-i".into(),
        format!(
            "testsrc=duration={}:size={}x{}:rate={}",
            duration_secs, width, height, fps
        ),
        "-c:v".into(),
        "libx264".into(),
        "-preset".into(),
        "ultrafast".into(),
        "-pix_fmt".into(),
        "yuv420p".into(),
        path_to_string(output),
    ]);
    run_fixture_ffmpeg(args)
}

/// Canonical 44-byte-header PCM WAV: mono, 16-bit, `sample_rate` Hz.
/// Bitexact flags keep FFmpeg from inserting a LIST chunk.
pub fn create_test_tone_wav(
    output: &Path,
    duration_secs: f64,
    frequency: u32,
    sample_rate: u32,
) -> Result<(), AppError> {
    let mut args = fixture_prefix();
    args.extend([
        "-f".into(),
        "lavfi".into(),
        "-i".into(),
        format!(
            "sine=frequency={}:duration={}:sample_rate={}",
            frequency, duration_secs, sample_rate
        ),
        "-ac".into(),
        "1".into(),
        "-c:a".into(),
        "pcm_s16le".into(),
        "-map_metadata".into(),
        "-1".into(),
        "-flags".into(),
        "+bitexact".into(),
        "-fflags".into(),
        "+bitexact".into(),
        path_to_string(output),
    ]);
    run_fixture_ffmpeg(args)
}

pub fn probe_for_test(path: &Path) -> Result<ProbeReport, AppError> {
    probe_media(path)
}
