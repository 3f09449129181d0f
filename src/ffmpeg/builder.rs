//! FFmpeg argument construction for normalize, concat and merge steps.
//! Pure functions so the exact command lines are unit-testable.

use std::path::Path;

use super::{AssemblyOptions, path_to_string};

/// Prints a float without trailing zeros: 30.0 -> "30", 0.5 -> "0.5".
pub fn format_number(value: f64) -> String {
    let s = format!("{:.6}", value);
    let s = s.trim_end_matches('0').trim_end_matches('.');
    if s.is_empty() || s == "-" {
        "0".to_string()
    } else {
        s.to_string()
    }
}

/// Fit inside WxH keeping aspect ratio, then letterbox to exactly WxH.
pub fn scale_pad_filter(width: u32, height: u32) -> String {
    format!(
        "scale={w}:{h}:force_original_aspect_ratio=decrease,pad={w}:{h}:(ow-iw)/2:(oh-ih)/2,setsar=1",
        w = width,
        h = height
    )
}

/// `setpts` scaled by 1/speed: speed 2.0 halves every timestamp.
pub fn setpts_filter(pts_factor: f64) -> String {
    format!("setpts={}*PTS", format_number(pts_factor))
}

fn common_prefix() -> Vec<String> {
    [
        "-nostdin",
        "-hide_banner",
        "-y",
        "-threads",
        "0",
        "-progress",
        "pipe:1",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

fn concat_input(manifest: &Path) -> Vec<String> {
    vec![
        "-f".into(),
        "concat".into(),
        "-safe".into(),
        "0".into(),
        "-i".into(),
        path_to_string(manifest),
    ]
}

fn video_encoder_args(options: &AssemblyOptions) -> Vec<String> {
    vec![
        "-c:v".into(),
        options.effective_codec().to_string(),
        "-preset".into(),
        options.effective_preset().to_string(),
        "-crf".into(),
        options.effective_crf().to_string(),
        "-pix_fmt".into(),
        "yuv420p".into(),
        "-movflags".into(),
        "+faststart".into(),
    ]
}

/// Re-encode one clip to the canonical frame rate and resolution, audio stripped.
pub fn build_normalize_args(input: &Path, output: &Path, options: &AssemblyOptions) -> Vec<String> {
    let filter = format!(
        "fps={},{}",
        format_number(options.effective_fps()),
        scale_pad_filter(options.effective_width(), options.effective_height())
    );
    log::debug!(
        target: "signcast::ffmpeg::builder",
        "normalize: filter={}, input={} -> output={}",
        filter,
        input.display(),
        output.display()
    );
    let mut args = common_prefix();
    args.extend(["-i".into(), path_to_string(input), "-vf".into(), filter, "-an".into()]);
    args.extend(video_encoder_args(options));
    args.push(path_to_string(output));
    args
}

/// Single pass over a concat manifest whose entries are already normalized:
/// only timestamps are rescaled.
pub fn build_stream_concat_args(
    manifest: &Path,
    output: &Path,
    options: &AssemblyOptions,
) -> Vec<String> {
    let mut args = common_prefix();
    args.extend(concat_input(manifest));
    args.extend([
        "-vf".into(),
        setpts_filter(options.pts_factor()),
        "-an".into(),
    ]);
    args.extend(video_encoder_args(options));
    args.push(path_to_string(output));
    args
}

/// Full per-frame chain for inputs whose parameters disagree, capped at `ceiling_secs`.
pub fn build_filtered_concat_args(
    manifest: &Path,
    output: &Path,
    options: &AssemblyOptions,
    ceiling_secs: f64,
) -> Vec<String> {
    let filter = format!(
        "fps={},{},{}",
        format_number(options.effective_fps()),
        scale_pad_filter(options.effective_width(), options.effective_height()),
        setpts_filter(options.pts_factor())
    );
    let mut args = common_prefix();
    args.extend(concat_input(manifest));
    args.extend([
        "-vf".into(),
        filter,
        "-an".into(),
        "-r".into(),
        format_number(options.effective_fps()),
        "-t".into(),
        format_number(ceiling_secs),
    ]);
    args.extend(video_encoder_args(options));
    args.push(path_to_string(output));
    args
}

/// Lay padded audio tracks over a video whose picture is copied untouched.
/// `tracks` pairs each audio path with an optional ISO 639 language tag.
pub fn build_merge_args(
    video: &Path,
    tracks: &[(&Path, Option<&str>)],
    output: &Path,
    options: &AssemblyOptions,
) -> Vec<String> {
    let mut args = common_prefix();
    args.extend(["-i".into(), path_to_string(video)]);
    for (audio, _) in tracks {
        args.extend(["-i".into(), path_to_string(audio)]);
    }

    let pad = format_number(options.effective_audio_pad_seconds());
    let filter_graph = (0..tracks.len())
        .map(|i| format!("[{}:a]apad=pad_dur={}[a{}]", i + 1, pad, i))
        .collect::<Vec<_>>()
        .join(";");
    if !tracks.is_empty() {
        args.extend(["-filter_complex".into(), filter_graph]);
    }

    args.extend(["-map".into(), "0:v:0".into()]);
    for i in 0..tracks.len() {
        args.extend(["-map".into(), format!("[a{}]", i)]);
    }
    args.extend([
        "-c:v".into(),
        "copy".into(),
        "-c:a".into(),
        options.effective_audio_codec().to_string(),
        "-b:a".into(),
        format!("{}k", options.effective_audio_bitrate()),
    ]);
    for (i, (_, language)) in tracks.iter().enumerate() {
        if let Some(lang) = language.filter(|l| !l.is_empty()) {
            args.extend([format!("-metadata:s:a:{}", i), format!("language={}", lang)]);
        }
    }
    args.extend([
        "-shortest".into(),
        "-movflags".into(),
        "+faststart".into(),
        path_to_string(output),
    ]);
    args
}

/// Formats args for readable display: option and value on the same line when the next arg is a value.
pub fn format_args_for_display_multiline(args: &[String]) -> String {
    let mut lines = Vec::new();
    let mut i = 0;
    while i < args.len() {
        let arg = &args[i];
        if arg.starts_with('-') && i + 1 < args.len() && !args[i + 1].starts_with('-') {
            lines.push(format!("  {} {}", arg, args[i + 1]));
            i += 2;
        } else {
            lines.push(format!("  {}", arg));
            i += 1;
        }
    }
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    fn value_after<'a>(args: &'a [String], flag: &str) -> &'a str {
        let idx = args
            .iter()
            .position(|a| a == flag)
            .unwrap_or_else(|| panic!("missing {flag} in {args:?}"));
        &args[idx + 1]
    }

    #[test]
    fn format_number_trims() {
        assert_eq!(format_number(30.0), "30");
        assert_eq!(format_number(0.5), "0.5");
        assert_eq!(format_number(29.97), "29.97");
        assert_eq!(format_number(1.0 / 3.0), "0.333333");
        assert_eq!(format_number(0.0), "0");
    }

    #[test]
    fn setpts_is_inverse_of_speed() {
        let at = |speed: f64| {
            setpts_filter(
                AssemblyOptions {
                    playback_speed: Some(speed),
                    ..Default::default()
                }
                .pts_factor(),
            )
        };
        assert_eq!(at(1.0), "setpts=1*PTS");
        assert_eq!(at(2.0), "setpts=0.5*PTS");
        assert_eq!(at(0.5), "setpts=2*PTS");
    }

    #[test]
    fn normalize_scales_pads_and_strips_audio() {
        let args = build_normalize_args(
            Path::new("/clips/a.mp4"),
            Path::new("/tmp/a_norm.mp4"),
            &AssemblyOptions::default(),
        );
        assert_eq!(
            value_after(&args, "-vf"),
            "fps=30,scale=1280:720:force_original_aspect_ratio=decrease,pad=1280:720:(ow-iw)/2:(oh-ih)/2,setsar=1"
        );
        assert!(args.contains(&"-an".to_string()));
        assert_eq!(value_after(&args, "-movflags"), "+faststart");
        assert_eq!(value_after(&args, "-preset"), "medium");
        assert_eq!(value_after(&args, "-crf"), "23");
        assert_eq!(args.last().unwrap(), "/tmp/a_norm.mp4");
    }

    #[test]
    fn stream_concat_reads_manifest_and_scales_pts() {
        let options = AssemblyOptions {
            playback_speed: Some(1.25),
            ..Default::default()
        };
        let args = build_stream_concat_args(Path::new("/tmp/list.txt"), Path::new("/out.mp4"), &options);
        assert_eq!(value_after(&args, "-f"), "concat");
        assert_eq!(value_after(&args, "-safe"), "0");
        assert_eq!(value_after(&args, "-i"), "/tmp/list.txt");
        assert_eq!(value_after(&args, "-vf"), "setpts=0.8*PTS");
        assert!(args.contains(&"-an".to_string()));
    }

    #[test]
    fn filtered_concat_forces_frame_chain_and_ceiling() {
        let args = build_filtered_concat_args(
            Path::new("/tmp/list.txt"),
            Path::new("/out.mp4"),
            &AssemblyOptions::default(),
            12.5,
        );
        let vf = value_after(&args, "-vf");
        assert!(vf.starts_with("fps=30,scale=1280:720"));
        assert!(vf.ends_with("setpts=1*PTS"));
        assert_eq!(value_after(&args, "-t"), "12.5");
        assert_eq!(value_after(&args, "-r"), "30");
    }

    #[test]
    fn merge_maps_each_padded_track() {
        let en = Path::new("/audio/en.wav");
        let hi = Path::new("/audio/hi.wav");
        let args = build_merge_args(
            Path::new("/v.mp4"),
            &[(en, Some("eng")), (hi, None)],
            Path::new("/final.mp4"),
            &AssemblyOptions::default(),
        );
        assert_eq!(
            value_after(&args, "-filter_complex"),
            "[1:a]apad=pad_dur=85[a0];[2:a]apad=pad_dur=85[a1]"
        );
        let maps: Vec<&String> = args
            .iter()
            .enumerate()
            .filter(|(_, a)| *a == "-map")
            .map(|(i, _)| &args[i + 1])
            .collect();
        assert_eq!(maps, ["0:v:0", "[a0]", "[a1]"]);
        assert_eq!(value_after(&args, "-c:v"), "copy");
        assert_eq!(value_after(&args, "-metadata:s:a:0"), "language=eng");
        assert!(!args.contains(&"-metadata:s:a:1".to_string()));
        assert!(args.contains(&"-shortest".to_string()));
    }

    #[test]
    fn display_pairs_flags_with_values() {
        let args: Vec<String> = ["-y", "-i", "in.mp4", "-an", "out.mp4"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        assert_eq!(
            format_args_for_display_multiline(&args),
            "  -y\n  -i in.mp4\n  -an out.mp4"
        );
    }
}
