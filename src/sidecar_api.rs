//! Entry points behind the sidecar's JSON-lines methods. Params are plain serde
//! structs so the binary only has to route and serialize.

use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use serde::Deserialize;

use crate::announcement::{
    AnnouncementOutcome, AnnouncementRequest, ProgressEmitter, assemble_announcement,
};
use crate::assembly::{
    AudioTrack, ConcatOutcome, MediaDescriptor, concat_videos, merge_audio_video, normalize_clip,
    validate_media,
};
use crate::audio::{DirectoryAudioAssets, SpliceReport, splice_wav_files};
use crate::error::AppError;
use crate::ffmpeg::{
    AssemblyOptions, FfmpegProgressPayload, ProgressCallback, active_ffmpeg_count, cleanup_old_temp_files,
    path_to_string, terminate_all_ffmpeg,
};
use crate::text::{ResolutionResult, ResolverOptions, resolve_text_in_dir};

pub type SidecarProgressEmitter = ProgressEmitter;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolveParams {
    pub text: String,
    pub clip_root: PathBuf,
    #[serde(default)]
    pub resolver: ResolverOptions,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InspectParams {
    pub input_path: PathBuf,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NormalizeParams {
    pub input_path: PathBuf,
    pub output_path: PathBuf,
    #[serde(default)]
    pub options: AssemblyOptions,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConcatParams {
    pub input_paths: Vec<PathBuf>,
    pub output_path: PathBuf,
    #[serde(default)]
    pub options: AssemblyOptions,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpliceParams {
    /// Nulls are allowed and skipped.
    pub input_paths: Vec<Option<PathBuf>>,
    pub output_path: PathBuf,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MergeParams {
    pub video_path: PathBuf,
    pub tracks: Vec<AudioTrack>,
    pub output_path: PathBuf,
    #[serde(default)]
    pub options: AssemblyOptions,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssembleParams {
    /// Root of `<language>/<token>.wav` recordings.
    pub audio_root: PathBuf,
    #[serde(flatten)]
    pub request: AnnouncementRequest,
}

fn block_on_async<T>(future: impl Future<Output = Result<T, AppError>>) -> Result<T, AppError> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|e| AppError::from(format!("Failed to initialize async runtime: {}", e)))?;
    runtime.block_on(future)
}

/// Adapts a sidecar emitter to the runner's plain progress callback, tagging every update with `step`.
fn progress_callback(
    emitter: Option<&SidecarProgressEmitter>,
    step: &'static str,
) -> Option<ProgressCallback> {
    emitter.map(|emit| {
        let emit = Arc::clone(emit);
        Arc::new(move |progress: f64| {
            emit(FfmpegProgressPayload {
                progress,
                step: Some(step.to_string()),
            });
        }) as ProgressCallback
    })
}

pub fn resolve_text(params: ResolveParams) -> ResolutionResult {
    resolve_text_in_dir(&params.text, &params.clip_root, &params.resolver)
}

pub fn inspect_media(params: InspectParams) -> MediaDescriptor {
    validate_media(&params.input_path)
}

pub fn normalize_with_events(
    params: NormalizeParams,
    event_emitter: Option<SidecarProgressEmitter>,
) -> Result<String, AppError> {
    let output = normalize_clip(
        &params.input_path,
        &params.output_path,
        &params.options,
        progress_callback(event_emitter.as_ref(), "normalize"),
    )?;
    Ok(path_to_string(&output))
}

pub fn concat_with_events(
    params: ConcatParams,
    event_emitter: Option<SidecarProgressEmitter>,
) -> Result<ConcatOutcome, AppError> {
    concat_videos(
        &params.input_paths,
        &params.output_path,
        &params.options,
        progress_callback(event_emitter.as_ref(), "concat"),
    )
}

pub fn splice_audio(params: SpliceParams) -> Result<Option<SpliceReport>, AppError> {
    splice_wav_files(&params.input_paths, &params.output_path)
}

pub fn merge_with_events(
    params: MergeParams,
    event_emitter: Option<SidecarProgressEmitter>,
) -> Result<String, AppError> {
    let output = merge_audio_video(
        &params.video_path,
        &params.tracks,
        &params.output_path,
        &params.options,
        progress_callback(event_emitter.as_ref(), "merge"),
    )?;
    Ok(path_to_string(&output))
}

pub fn assemble_with_events(
    params: AssembleParams,
    event_emitter: Option<SidecarProgressEmitter>,
) -> Result<AnnouncementOutcome, AppError> {
    let assets = Arc::new(DirectoryAudioAssets::new(params.audio_root));
    block_on_async(assemble_announcement(params.request, assets, event_emitter))
}

/// Kill every running FFmpeg process. Returns how many were running.
pub fn ffmpeg_terminate() -> usize {
    terminate_all_ffmpeg()
}

pub fn cleanup_startup_temp(max_age: Duration) {
    let removed = cleanup_old_temp_files(max_age);
    if removed > 0 {
        log::info!(
            target: "signcast::sidecar_api",
            "Removed {} stale temp file(s)",
            removed
        );
    }
}

pub fn cleanup_on_exit() {
    let active = active_ffmpeg_count();
    if active > 0 {
        log::warn!(
            target: "signcast::sidecar_api",
            "Input closed with {} FFmpeg process(es) still running",
            active
        );
        terminate_all_ffmpeg();
    }
}
