//! Crate error type. Implements Display and Serialize for sidecar clients.

use std::path::PathBuf;

use crate::ffmpeg::parse_ffmpeg_error;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("{0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    FfmpegNotFound(String),

    #[error("FFmpeg failed (code {code}): {stderr}")]
    FfmpegFailed { code: i32, stderr: String },

    #[error("Aborted")]
    Aborted,

    #[error("No valid videos to process")]
    NoValidInputs,

    #[error("Concatenation failed: {reason}")]
    ConcatenationFailed { reason: String },

    #[error("Input file not found: {}", path.display())]
    MissingInput { path: PathBuf },

    #[error("Output file is empty: {}", path.display())]
    EmptyOutput { path: PathBuf },

    #[error("Invalid media {}: {reason}", path.display())]
    InvalidMedia { path: PathBuf, reason: String },

    #[error("Unsupported WAV file {}: {reason}", path.display())]
    WavFormat { path: PathBuf, reason: String },

    #[error("Invalid options: {0}")]
    InvalidOptions(String),
}

impl AppError {
    pub fn aborted() -> Self {
        Self::Aborted
    }

    pub fn ffmpeg_failed(code: i32, stderr: impl Into<String>) -> Self {
        Self::FfmpegFailed {
            code,
            stderr: stderr.into(),
        }
    }

    pub fn wav_format(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::WavFormat {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Errors that mean "nothing usable came out of this request", as opposed to a
    /// single item failing inside a batch.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::NoValidInputs | Self::ConcatenationFailed { .. } | Self::Aborted
        )
    }
}

impl serde::Serialize for AppError {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        match self {
            AppError::FfmpegFailed { code, stderr } => {
                let payload = parse_ffmpeg_error(stderr, Some(*code));
                let json =
                    serde_json::json!({ "summary": payload.summary, "detail": payload.detail });
                serializer.serialize_str(&json.to_string())
            }
            _ => serializer.serialize_str(&self.to_string()),
        }
    }
}

impl From<String> for AppError {
    fn from(s: String) -> Self {
        if s == "Aborted" {
            AppError::Aborted
        } else {
            AppError::FfmpegFailed {
                code: -1,
                stderr: s,
            }
        }
    }
}

impl From<&str> for AppError {
    fn from(s: &str) -> Self {
        s.to_string().into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_aborted_string() {
        let e = AppError::from("Aborted");
        assert!(matches!(e, AppError::Aborted));
    }

    #[test]
    fn from_other_string() {
        let e = AppError::from("some error message");
        match &e {
            AppError::FfmpegFailed { code, stderr } => {
                assert_eq!(*code, -1);
                assert_eq!(stderr, "some error message");
            }
            _ => panic!("expected FfmpegFailed"),
        }
    }

    #[test]
    fn missing_input_names_path() {
        let e = AppError::MissingInput {
            path: PathBuf::from("/clips/none.mp4"),
        };
        assert_eq!(e.to_string(), "Input file not found: /clips/none.mp4");
    }

    #[test]
    fn terminal_errors_are_distinguished_from_item_errors() {
        assert!(AppError::NoValidInputs.is_terminal());
        assert!(
            AppError::ConcatenationFailed {
                reason: "x".into()
            }
            .is_terminal()
        );
        assert!(
            !AppError::EmptyOutput {
                path: PathBuf::from("a.mp4")
            }
            .is_terminal()
        );
    }

    #[test]
    fn ffmpeg_failure_serializes_as_summary_detail_json() {
        let e = AppError::ffmpeg_failed(1, "Invalid data found");
        let value = serde_json::to_value(&e).unwrap();
        let inner: serde_json::Value = serde_json::from_str(value.as_str().unwrap()).unwrap();
        assert_eq!(inner["summary"], "FFmpeg failed.");
        assert_eq!(inner["detail"], "Invalid data found");
    }
}
