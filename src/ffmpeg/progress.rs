use std::sync::LazyLock;

use regex::Regex;

static DURATION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"Duration: (\d+):(\d+):([\d.]+)").expect("invalid duration regex")
});
/// `-progress pipe:1` reports both keys in microseconds despite the `_ms` name.
static OUT_TIME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^out_time_(?:ms|us)=(\d+)").expect("invalid time regex"));

/// Parse one line of FFmpeg output.
/// Returns (progress in [0,1] if the line carries one, duration in seconds if known).
pub fn parse_ffmpeg_progress(
    line: &str,
    current_duration: Option<f64>,
) -> (Option<f64>, Option<f64>) {
    if let Some(caps) = DURATION_RE.captures(line) {
        let hours: f64 = caps[1].parse().unwrap_or(0.0);
        let minutes: f64 = caps[2].parse().unwrap_or(0.0);
        let seconds: f64 = caps[3].parse().unwrap_or(0.0);
        return (None, Some(hours * 3600.0 + minutes * 60.0 + seconds));
    }

    if line.trim() == "progress=end" {
        return (Some(1.0), current_duration);
    }

    if let (Some(caps), Some(dur)) = (OUT_TIME_RE.captures(line), current_duration)
        && dur > 0.0
    {
        let micros: i64 = caps[1].parse().unwrap_or(0);
        let progress = (micros as f64 / 1_000_000.0 / dur).clamp(0.0, 1.0);
        return (Some(progress), Some(dur));
    }

    (None, current_duration)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duration_line_sets_duration() {
        let (prog, dur) = parse_ffmpeg_progress("  Duration: 00:01:30.50, start: 0.000000", None);
        assert_eq!(prog, None);
        assert_eq!(dur, Some(90.5));
    }

    #[test]
    fn out_time_against_known_duration() {
        let (prog, dur) = parse_ffmpeg_progress("out_time_us=2500000", Some(10.0));
        assert_eq!(prog, Some(0.25));
        assert_eq!(dur, Some(10.0));
    }

    #[test]
    fn out_time_is_clamped() {
        let (prog, _) = parse_ffmpeg_progress("out_time_ms=99000000", Some(10.0));
        assert_eq!(prog, Some(1.0));
    }

    #[test]
    fn out_time_without_duration_is_ignored() {
        assert_eq!(parse_ffmpeg_progress("out_time_ms=1000", None), (None, None));
    }

    #[test]
    fn progress_end_completes() {
        let (prog, dur) = parse_ffmpeg_progress("progress=end", Some(3.0));
        assert_eq!(prog, Some(1.0));
        assert_eq!(dur, Some(3.0));
    }

    #[test]
    fn unrelated_line_keeps_duration() {
        assert_eq!(
            parse_ffmpeg_progress("frame=12 fps=0.0", Some(5.0)),
            (None, Some(5.0))
        );
    }
}
