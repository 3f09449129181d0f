//! Turns FFmpeg exit codes and stderr into a short summary plus full detail.
//!
//! Exit codes come from ffmpeg.c: 1 (general), 69 (rate exceeded), 123 (hard
//! exit), 255 (signal). -1 is used for spawn failures.

use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FfmpegErrorPayload {
    pub summary: String,
    pub detail: String,
}

const SUMMARY_MAX_LEN: usize = 120;
const ELLIPSIS: &str = "…";

/// Stderr fragments that explain a failure better than the exit code does.
const STDERR_HINTS: &[(&str, &str)] = &[
    ("no such file or directory", "Input file could not be opened."),
    ("invalid data found when processing input", "Input is not a readable media file."),
    ("unknown encoder", "Required encoder is not available in this FFmpeg build."),
    ("impossible to open", "Concat manifest references a file that cannot be opened."),
    ("unsafe file name", "Concat manifest path was rejected."),
    ("error reinitializing filters", "Inputs have inconsistent stream parameters."),
];

pub fn parse_ffmpeg_error(stderr: &str, exit_code: Option<i32>) -> FfmpegErrorPayload {
    let summary = hint_from_stderr(stderr)
        .or_else(|| exit_code.and_then(known_exit_code_summary))
        .unwrap_or_else(|| match exit_code {
            Some(code) => format!("FFmpeg failed (exit code {}).", code),
            None => first_line_truncated(stderr, SUMMARY_MAX_LEN),
        });
    FfmpegErrorPayload {
        summary,
        detail: stderr.trim().to_string(),
    }
}

fn hint_from_stderr(stderr: &str) -> Option<String> {
    let lower = stderr.to_lowercase();
    STDERR_HINTS
        .iter()
        .find(|(needle, _)| lower.contains(needle))
        .map(|(_, hint)| (*hint).to_string())
}

fn known_exit_code_summary(code: i32) -> Option<String> {
    match code {
        -1 => Some("FFmpeg not found or failed to start.".into()),
        1 => Some("FFmpeg failed.".into()),
        69 => Some("Encoding rate limit exceeded.".into()),
        123 | 255 => Some("Encoding was stopped.".into()),
        _ => None,
    }
}

fn first_line_truncated(stderr: &str, max_len: usize) -> String {
    let first = stderr
        .lines()
        .map(str::trim)
        .find(|l| !l.is_empty())
        .unwrap_or("");
    if first.len() <= max_len {
        return first.to_string();
    }
    let mut cut = max_len.saturating_sub(ELLIPSIS.len());
    while !first.is_char_boundary(cut) {
        cut -= 1;
    }
    format!("{}{}", &first[..cut], ELLIPSIS)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_codes() {
        assert_eq!(parse_ffmpeg_error("", Some(1)).summary, "FFmpeg failed.");
        assert_eq!(parse_ffmpeg_error("", Some(255)).summary, "Encoding was stopped.");
        assert!(parse_ffmpeg_error("", Some(-1)).summary.contains("not found"));
    }

    #[test]
    fn stderr_hint_beats_exit_code() {
        let p = parse_ffmpeg_error(
            "[concat @ 0x1] Impossible to open '/tmp/a.mp4'\nlist.txt: No such file",
            Some(1),
        );
        assert_eq!(
            p.summary,
            "Concat manifest references a file that cannot be opened."
        );
        assert!(p.detail.starts_with("[concat"));
    }

    #[test]
    fn unknown_code_short_summary() {
        let p = parse_ffmpeg_error("something odd", Some(42));
        assert_eq!(p.summary, "FFmpeg failed (exit code 42).");
        assert_eq!(p.detail, "something odd");
    }

    #[test]
    fn no_code_uses_first_line() {
        let p = parse_ffmpeg_error("\n  first line\nsecond", None);
        assert_eq!(p.summary, "first line");
    }

    #[test]
    fn long_stderr_truncated_on_char_boundary() {
        let long = "é".repeat(150);
        let p = parse_ffmpeg_error(&long, None);
        assert!(p.summary.len() <= SUMMARY_MAX_LEN);
        assert!(p.summary.ends_with('…'));
    }
}
