//! Joins normalized clips into one video, applying the playback speed.
//!
//! Strategies are tried in `ConcatStrategy::ORDER`. The first is a plain
//! demuxer concat that trusts its inputs to share parameters; the second
//! re-runs the full per-frame chain so mismatched inputs still line up.

use std::path::{Path, PathBuf};

use super::manifest::ConcatManifest;
use super::normalizer::verify_output;
use super::validator::{MediaDescriptor, validate_media};
use crate::error::AppError;
use crate::ffmpeg::{
    AssemblyOptions, ProgressCallback, build_filtered_concat_args, build_stream_concat_args,
    decode_check, format_args_for_display_multiline, remove_file_logged, run_ffmpeg_blocking,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ConcatStrategy {
    StreamConcat,
    FilteredReencode,
}

impl ConcatStrategy {
    pub const ORDER: [ConcatStrategy; 2] =
        [ConcatStrategy::StreamConcat, ConcatStrategy::FilteredReencode];

    pub fn label(self) -> &'static str {
        match self {
            ConcatStrategy::StreamConcat => "fast",
            ConcatStrategy::FilteredReencode => "fallback",
        }
    }
}

#[derive(Debug, Clone, PartialEq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConcatOutcome {
    pub output: PathBuf,
    /// None when a single input was passed through untouched.
    pub strategy: Option<ConcatStrategy>,
    pub dropped_inputs: Vec<PathBuf>,
    /// Playback compatibility concerns. The output is kept regardless.
    pub warnings: Vec<String>,
}

/// Upper bound for the filtered re-encode: the speed-scaled total plus one
/// second of slack, never beyond `max_secs`.
pub fn fallback_ceiling_secs(durations: &[f64], playback_speed: f64, max_secs: f64) -> f64 {
    let total: f64 = durations.iter().filter(|d| d.is_finite() && **d > 0.0).sum();
    (total / playback_speed + 1.0).min(max_secs)
}

/// Soft checks on a finished output. `decode` carries the decode-to-null result when it ran.
pub fn compatibility_warnings(
    descriptor: &MediaDescriptor,
    options: &AssemblyOptions,
    decode: Option<Result<(), String>>,
) -> Vec<String> {
    let mut warnings = Vec::new();
    if !descriptor.valid {
        warnings.push(format!(
            "output did not re-validate: {}",
            descriptor.error.as_deref().unwrap_or("unknown error")
        ));
    }
    match descriptor.duration_seconds {
        Some(d) if d < options.effective_min_duration_secs() => {
            warnings.push(format!("duration {:.3}s is too short to play reliably", d));
        }
        Some(d) if d > options.effective_max_duration_secs() => {
            warnings.push(format!("duration {:.1}s exceeds the playable maximum", d));
        }
        Some(_) => {}
        None => warnings.push("duration could not be determined".to_string()),
    }
    if descriptor.size_bytes < options.effective_min_output_bytes() {
        warnings.push(format!(
            "file size {} bytes is below the {} byte minimum",
            descriptor.size_bytes,
            options.effective_min_output_bytes()
        ));
    }
    if let Some(Err(reason)) = decode {
        warnings.push(reason);
    }
    warnings
}

fn run_strategy(
    strategy: ConcatStrategy,
    inputs: &[PathBuf],
    durations: &[f64],
    output: &Path,
    options: &AssemblyOptions,
    progress: Option<ProgressCallback>,
) -> Result<(), AppError> {
    let manifest = ConcatManifest::write(&options.temp_files(), inputs)?;
    let speed = options.effective_playback_speed();
    let expected = fallback_ceiling_secs(durations, speed, options.effective_max_duration_secs());

    let args = match strategy {
        ConcatStrategy::StreamConcat => build_stream_concat_args(manifest.path(), output, options),
        ConcatStrategy::FilteredReencode => {
            build_filtered_concat_args(manifest.path(), output, options, expected)
        }
    };
    log::debug!(
        target: "signcast::assembly::concat",
        "{} concat args:\n{}",
        strategy.label(),
        format_args_for_display_multiline(&args)
    );

    if let Err(e) = run_ffmpeg_blocking(args, Some(expected), progress) {
        remove_file_logged(output);
        return Err(e);
    }

    match strategy {
        ConcatStrategy::StreamConcat => {
            let size = std::fs::metadata(output).map(|m| m.len()).unwrap_or(0);
            if size == 0 {
                remove_file_logged(output);
                return Err(AppError::EmptyOutput {
                    path: output.to_path_buf(),
                });
            }
        }
        ConcatStrategy::FilteredReencode => {
            verify_output(output)?;
        }
    }
    Ok(())
}

pub fn concat_videos(
    inputs: &[PathBuf],
    output: &Path,
    options: &AssemblyOptions,
    progress: Option<ProgressCallback>,
) -> Result<ConcatOutcome, AppError> {
    options.validate()?;
    match inputs {
        [] => return Err(AppError::NoValidInputs),
        [only] => {
            log::debug!(
                target: "signcast::assembly::concat",
                "Single input, returning {} unchanged",
                only.display()
            );
            return Ok(ConcatOutcome {
                output: only.clone(),
                strategy: None,
                dropped_inputs: Vec::new(),
                warnings: Vec::new(),
            });
        }
        _ => {}
    }

    let mut valid = Vec::with_capacity(inputs.len());
    let mut durations = Vec::with_capacity(inputs.len());
    let mut dropped_inputs = Vec::new();
    for input in inputs {
        let descriptor = validate_media(input);
        if descriptor.valid {
            valid.push(input.clone());
            durations.push(descriptor.duration_seconds.unwrap_or(0.0));
        } else {
            log::warn!(
                target: "signcast::assembly::concat",
                "Dropping invalid input {}: {}",
                input.display(),
                descriptor.error.as_deref().unwrap_or("unknown error")
            );
            dropped_inputs.push(input.clone());
        }
    }
    if valid.is_empty() {
        return Err(AppError::NoValidInputs);
    }

    if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }

    let strategy = walk_strategies(|attempt, strategy| {
        log::info!(
            target: "signcast::assembly::concat",
            "Concat attempt {} ({}): {} inputs -> {}",
            attempt + 1,
            strategy.label(),
            valid.len(),
            output.display()
        );
        run_strategy(strategy, &valid, &durations, output, options, progress.clone())
    })?;

    let decode = options.effective_decode_check().then(|| decode_check(output));
    let warnings = compatibility_warnings(&validate_media(output), options, decode);
    for warning in &warnings {
        log::warn!(
            target: "signcast::assembly::concat",
            "{}: {}",
            output.display(),
            warning
        );
    }
    Ok(ConcatOutcome {
        output: output.to_path_buf(),
        strategy: Some(strategy),
        dropped_inputs,
        warnings,
    })
}

/// Runs `attempt` for each strategy in `ConcatStrategy::ORDER` until one succeeds.
/// `Aborted` ends the walk as is; otherwise the last failure becomes `ConcatenationFailed`.
fn walk_strategies<F>(mut attempt: F) -> Result<ConcatStrategy, AppError>
where
    F: FnMut(usize, ConcatStrategy) -> Result<(), AppError>,
{
    let mut last_error = None;
    for (index, strategy) in ConcatStrategy::ORDER.into_iter().enumerate() {
        match attempt(index, strategy) {
            Ok(()) => return Ok(strategy),
            Err(AppError::Aborted) => return Err(AppError::Aborted),
            Err(e) => {
                log::warn!(
                    target: "signcast::assembly::concat",
                    "{} concat failed: {}",
                    strategy.label(),
                    e
                );
                last_error = Some(e);
            }
        }
    }
    Err(AppError::ConcatenationFailed {
        reason: last_error
            .map(|e| e.to_string())
            .unwrap_or_else(|| "no strategy attempted".to_string()),
    })
}
