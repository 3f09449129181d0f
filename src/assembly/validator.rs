//! Media validation. Never fails: problems are reported in the descriptor.

use std::path::Path;

use crate::ffmpeg::ffprobe::{ProbeReport, probe_media};

#[derive(Debug, Clone, Default, PartialEq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaDescriptor {
    pub valid: bool,
    pub duration_seconds: Option<f64>,
    /// `WxH`
    pub resolution: Option<String>,
    pub frame_rate: Option<f64>,
    pub size_bytes: u64,
    pub error: Option<String>,
}

impl MediaDescriptor {
    fn invalid(size_bytes: u64, error: impl Into<String>) -> Self {
        Self {
            size_bytes,
            error: Some(error.into()),
            ..Self::default()
        }
    }
}

/// Interpret a probe report. Split out so the rules can be tested without ffprobe.
pub(crate) fn describe_probe(path: &Path, size_bytes: u64, report: &ProbeReport) -> MediaDescriptor {
    if report.stream_count == 0 {
        return MediaDescriptor::invalid(size_bytes, format!("{}: no streams", path.display()));
    }
    if report.video_stream_count == 0 {
        return MediaDescriptor::invalid(
            size_bytes,
            format!("{}: no video stream", path.display()),
        );
    }
    let resolution = match (report.width, report.height) {
        (Some(w), Some(h)) => Some(format!("{}x{}", w, h)),
        _ => None,
    };
    MediaDescriptor {
        valid: true,
        duration_seconds: report.duration,
        resolution,
        frame_rate: report.frame_rate,
        size_bytes,
        error: None,
    }
}

pub fn validate_media(path: &Path) -> MediaDescriptor {
    let size_bytes = match std::fs::metadata(path) {
        Ok(meta) if meta.is_file() => meta.len(),
        Ok(_) => {
            return MediaDescriptor::invalid(0, format!("{}: not a regular file", path.display()));
        }
        Err(e) => {
            return MediaDescriptor::invalid(0, format!("{}: {}", path.display(), e));
        }
    };
    if size_bytes == 0 {
        return MediaDescriptor::invalid(0, format!("{}: file is empty", path.display()));
    }

    let descriptor = match probe_media(path) {
        Ok(report) => describe_probe(path, size_bytes, &report),
        Err(e) => MediaDescriptor::invalid(size_bytes, format!("{}: {}", path.display(), e)),
    };
    if let Some(error) = &descriptor.error {
        log::debug!(target: "signcast::assembly::validator", "Invalid media: {}", error);
    }
    descriptor
}
