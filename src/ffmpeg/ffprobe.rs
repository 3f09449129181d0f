//! ffprobe-based metadata extraction. The JSON parsing is separate from the
//! process call so it can be tested without ffprobe installed.

use std::path::Path;
use std::process::Command;

#[cfg(windows)]
use std::os::windows::process::CommandExt;

use serde::Deserialize;

use super::discovery::get_ffprobe_path;
use crate::error::AppError;

#[derive(Debug, Deserialize)]
struct FfprobeFormat {
    duration: Option<String>,
    size: Option<String>,
    #[serde(default)]
    format_name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct FfprobeStream {
    codec_type: Option<String>,
    width: Option<u32>,
    height: Option<u32>,
    r_frame_rate: Option<String>,
    #[serde(default)]
    codec_name: Option<String>,
    #[serde(default)]
    duration: Option<String>,
}

#[derive(Debug, Deserialize)]
struct FfprobeOutput {
    format: Option<FfprobeFormat>,
    streams: Option<Vec<FfprobeStream>>,
}

/// Parses a rational like `30000/1001`. Zero denominators yield None.
pub fn parse_frame_rate(s: &str) -> Option<f64> {
    let (num, den) = s.split_once('/')?;
    let num: f64 = num.trim().parse().ok()?;
    let den: f64 = den.trim().parse().ok()?;
    if den == 0.0 {
        return None;
    }
    Some(num / den)
}

/// Subset of probe output the assembly pipeline relies on.
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProbeReport {
    pub stream_count: u32,
    pub video_stream_count: u32,
    pub audio_stream_count: u32,
    /// Container duration, falling back to the first video stream's duration.
    pub duration: Option<f64>,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub frame_rate: Option<f64>,
    pub size: Option<u64>,
    pub video_codec: Option<String>,
    pub format_name: Option<String>,
}

/// Parse ffprobe `-show_format -show_streams` JSON into a ProbeReport.
pub fn parse_ffprobe_json(json: &str) -> Result<ProbeReport, AppError> {
    let output: FfprobeOutput = serde_json::from_str(json)
        .map_err(|e| AppError::from(format!("Failed to parse ffprobe JSON: {}", e)))?;

    let streams = output.streams.unwrap_or_default();
    let count_of = |kind: &str| {
        streams
            .iter()
            .filter(|s| s.codec_type.as_deref() == Some(kind))
            .count() as u32
    };
    let video_stream = streams
        .iter()
        .find(|s| s.codec_type.as_deref() == Some("video"));

    let format = output.format.as_ref();
    let duration = format
        .and_then(|f| f.duration.as_deref())
        .or_else(|| video_stream.and_then(|s| s.duration.as_deref()))
        .and_then(|s| s.parse::<f64>().ok());

    Ok(ProbeReport {
        stream_count: streams.len() as u32,
        video_stream_count: count_of("video"),
        audio_stream_count: count_of("audio"),
        duration,
        width: video_stream.and_then(|s| s.width),
        height: video_stream.and_then(|s| s.height),
        frame_rate: video_stream
            .and_then(|s| s.r_frame_rate.as_deref())
            .and_then(parse_frame_rate),
        size: format
            .and_then(|f| f.size.as_deref())
            .and_then(|s| s.parse::<u64>().ok()),
        video_codec: video_stream.and_then(|s| s.codec_name.clone()),
        format_name: format.and_then(|f| f.format_name.clone()),
    })
}

/// Run ffprobe on a media file.
pub fn probe_media(path: &Path) -> Result<ProbeReport, AppError> {
    let ffprobe = get_ffprobe_path()?;
    let path_str = path.to_string_lossy();

    log::debug!(
        target: "signcast::ffmpeg::ffprobe",
        "probe_media: path={}",
        path_str
    );

    let mut cmd = Command::new(&ffprobe);
    cmd.args([
        "-v",
        "error",
        "-print_format",
        "json",
        "-show_format",
        "-show_streams",
        &path_str,
    ]);
    #[cfg(windows)]
    cmd.creation_flags(0x08000000); // CREATE_NO_WINDOW
    let output = cmd
        .output()
        .map_err(|e| AppError::from(format!("Failed to run ffprobe: {}", e)))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(AppError::from(format!("ffprobe failed: {}", stderr.trim())));
    }

    let json = String::from_utf8(output.stdout)
        .map_err(|_| AppError::from("ffprobe output was not valid UTF-8"))?;

    parse_ffprobe_json(&json)
}
