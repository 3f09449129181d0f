use std::io::{self, BufRead, Write};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::thread;
use std::time::Duration;

use parking_lot::Mutex;
use serde::Deserialize;
use serde_json::{Value, json};
use signcast_core::error::AppError;
use signcast_core::ffmpeg::FfmpegProgressPayload;
use signcast_core::sidecar_api;

const STARTUP_CLEANUP_MAX_AGE_HOURS: u64 = 24;

#[derive(Debug, Deserialize)]
struct RpcRequest {
    id: u64,
    method: String,
    #[serde(default)]
    params: Value,
}

#[derive(Debug, serde::Serialize)]
struct RpcSuccess {
    id: u64,
    result: Value,
}

#[derive(Debug, serde::Serialize)]
struct RpcFailure {
    id: u64,
    error: RpcErrorPayload,
}

#[derive(Debug, Clone, serde::Serialize)]
#[serde(rename_all = "camelCase")]
struct RpcErrorPayload {
    summary: String,
    detail: String,
}

#[derive(Debug, serde::Serialize)]
struct RpcEvent {
    event: String,
    payload: Value,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "lowercase")]
enum JobKind {
    Normalize,
    Concat,
    Merge,
    Announcement,
}

impl JobKind {
    fn for_method(method: &str) -> Option<Self> {
        match method {
            "media.normalize" => Some(JobKind::Normalize),
            "media.concat" => Some(JobKind::Concat),
            "media.merge" => Some(JobKind::Merge),
            "announcement.assemble" => Some(JobKind::Announcement),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct ActiveJob {
    job_id: u64,
    kind: JobKind,
}

/// Jobs run on their own threads; all of them are tracked so `media.cancel`
/// can report what it stopped.
#[derive(Clone)]
struct JobState {
    active_jobs: Arc<Mutex<Vec<ActiveJob>>>,
    next_job_id: Arc<AtomicU64>,
}

impl JobState {
    fn new() -> Self {
        Self {
            active_jobs: Arc::new(Mutex::new(Vec::new())),
            next_job_id: Arc::new(AtomicU64::new(1)),
        }
    }

    fn begin_job(&self, kind: JobKind) -> ActiveJob {
        let job = ActiveJob {
            job_id: self.next_job_id.fetch_add(1, Ordering::Relaxed),
            kind,
        };
        self.active_jobs.lock().push(job);
        job
    }

    fn finish_job(&self, job_id: u64) {
        self.active_jobs.lock().retain(|job| job.job_id != job_id);
    }

    fn current_job_ids(&self) -> Vec<u64> {
        self.active_jobs.lock().iter().map(|job| job.job_id).collect()
    }
}

struct ActiveJobGuard {
    state: JobState,
    job_id: u64,
}

impl Drop for ActiveJobGuard {
    fn drop(&mut self) {
        self.state.finish_job(self.job_id);
    }
}

type SharedWriter = Arc<Mutex<io::Stdout>>;

fn write_json_line<T: serde::Serialize>(writer: &mut impl Write, value: &T) -> io::Result<()> {
    serde_json::to_writer(&mut *writer, value)
        .map_err(|e| io::Error::other(format!("serialize response: {}", e)))?;
    writer.write_all(b"\n")?;
    writer.flush()
}

fn write_json_line_shared<T: serde::Serialize>(writer: &SharedWriter, value: &T) -> io::Result<()> {
    let mut guard = writer.lock();
    write_json_line(&mut *guard, value)
}

fn emit_rpc_event(writer: &SharedWriter, event: &str, payload: Value) {
    let message = RpcEvent {
        event: event.to_string(),
        payload,
    };
    let _ = write_json_line_shared(writer, &message);
}

fn emit_job_progress(writer: &SharedWriter, job: ActiveJob, payload: FfmpegProgressPayload) {
    emit_rpc_event(
        writer,
        "media.job.progress",
        json!({
            "jobId": job.job_id,
            "kind": job.kind,
            "progress": payload.progress,
            "step": payload.step,
        }),
    );
}

fn emit_job_finished(writer: &SharedWriter, job: ActiveJob, error: Option<&RpcErrorPayload>) {
    match error {
        None => emit_rpc_event(
            writer,
            "media.job.complete",
            json!({ "jobId": job.job_id, "kind": job.kind }),
        ),
        Some(error) => emit_rpc_event(
            writer,
            "media.job.error",
            json!({
                "jobId": job.job_id,
                "kind": job.kind,
                "summary": error.summary,
                "detail": error.detail,
            }),
        ),
    }
}

fn parse_error_payload(err: &AppError) -> RpcErrorPayload {
    match err {
        AppError::FfmpegFailed { code, stderr } if *code == -1 => RpcErrorPayload {
            summary: stderr.clone(),
            detail: stderr.clone(),
        },
        AppError::FfmpegFailed { code, stderr } => {
            let parsed = signcast_core::ffmpeg::parse_ffmpeg_error(stderr, Some(*code));
            RpcErrorPayload {
                summary: parsed.summary,
                detail: parsed.detail,
            }
        }
        _ => {
            let text = err.to_string();
            RpcErrorPayload {
                summary: text.clone(),
                detail: text,
            }
        }
    }
}

fn params_from_value<T: serde::de::DeserializeOwned>(params: Value) -> Result<T, AppError> {
    serde_json::from_value(params)
        .map_err(|e| AppError::InvalidOptions(format!("Invalid params payload: {}", e)))
}

fn to_result_value<T: serde::Serialize>(value: T) -> Result<Value, AppError> {
    serde_json::to_value(value)
        .map_err(|e| AppError::from(format!("Failed to serialize result: {}", e)))
}

fn dispatch_sync(method: &str, params: Value, jobs: &JobState) -> Result<Value, AppError> {
    match method {
        "text.resolve" => to_result_value(sidecar_api::resolve_text(params_from_value(params)?)),
        "media.inspect" => to_result_value(sidecar_api::inspect_media(params_from_value(params)?)),
        "audio.splice" => {
            let report = sidecar_api::splice_audio(params_from_value(params)?)?;
            to_result_value(report)
        }
        "media.cancel" => {
            let job_ids = jobs.current_job_ids();
            let terminated = sidecar_api::ffmpeg_terminate();
            Ok(json!({
                "cancelled": !job_ids.is_empty(),
                "jobIds": job_ids,
                "terminatedProcesses": terminated,
            }))
        }
        _ => Err(AppError::from(format!("Unknown method: {}", method))),
    }
}

fn dispatch_job(
    method: &str,
    params: Value,
    emitter: sidecar_api::SidecarProgressEmitter,
) -> Result<Value, AppError> {
    match method {
        "media.normalize" => {
            let output = sidecar_api::normalize_with_events(params_from_value(params)?, Some(emitter))?;
            Ok(json!({ "outputPath": output }))
        }
        "media.concat" => {
            to_result_value(sidecar_api::concat_with_events(params_from_value(params)?, Some(emitter))?)
        }
        "media.merge" => {
            let output = sidecar_api::merge_with_events(params_from_value(params)?, Some(emitter))?;
            Ok(json!({ "outputPath": output }))
        }
        "announcement.assemble" => to_result_value(sidecar_api::assemble_with_events(
            params_from_value(params)?,
            Some(emitter),
        )?),
        _ => Err(AppError::from(format!("Unknown method: {}", method))),
    }
}

fn write_response(writer: &SharedWriter, id: u64, result: Result<Value, RpcErrorPayload>) {
    let written = match result {
        Ok(result) => write_json_line_shared(writer, &RpcSuccess { id, result }),
        Err(error) => write_json_line_shared(writer, &RpcFailure { id, error }),
    };
    if let Err(err) = written {
        log::error!(target: "signcast::sidecar", "Failed to write response {}: {}", id, err);
    }
}

fn handle_sync_request(request: RpcRequest, writer: &SharedWriter, jobs: &JobState) {
    let result = dispatch_sync(&request.method, request.params, jobs)
        .map_err(|err| parse_error_payload(&err));
    write_response(writer, request.id, result);
}

fn handle_job_request(request: RpcRequest, kind: JobKind, writer: &SharedWriter, jobs: &JobState) {
    let job = jobs.begin_job(kind);
    let _job_guard = ActiveJobGuard {
        state: jobs.clone(),
        job_id: job.job_id,
    };
    log::info!(
        target: "signcast::sidecar",
        "Job {} started: {}",
        job.job_id,
        request.method
    );

    let writer_for_events = Arc::clone(writer);
    let emitter: sidecar_api::SidecarProgressEmitter =
        Arc::new(move |payload| emit_job_progress(&writer_for_events, job, payload));

    let result = dispatch_job(&request.method, request.params, emitter)
        .map(|mut value| {
            if let Value::Object(map) = &mut value {
                map.insert("jobId".to_string(), json!(job.job_id));
            }
            value
        })
        .map_err(|err| parse_error_payload(&err));
    emit_job_finished(writer, job, result.as_ref().err());
    write_response(writer, request.id, result);
}

fn main() -> io::Result<()> {
    // stdout carries the protocol; logs go to stderr.
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .target(env_logger::Target::Stderr)
        .init();

    sidecar_api::cleanup_startup_temp(Duration::from_secs(STARTUP_CLEANUP_MAX_AGE_HOURS * 3600));

    let stdin = io::stdin();
    let stdout: SharedWriter = Arc::new(Mutex::new(io::stdout()));
    let jobs = JobState::new();
    let mut job_workers: Vec<thread::JoinHandle<()>> = Vec::new();

    for line in stdin.lock().lines() {
        let line = match line {
            Ok(line) => line,
            Err(err) => {
                write_response(
                    &stdout,
                    0,
                    Err(RpcErrorPayload {
                        summary: "Invalid input stream".to_string(),
                        detail: err.to_string(),
                    }),
                );
                continue;
            }
        };

        if line.trim().is_empty() {
            continue;
        }

        let request: RpcRequest = match serde_json::from_str(&line) {
            Ok(request) => request,
            Err(err) => {
                write_response(
                    &stdout,
                    0,
                    Err(RpcErrorPayload {
                        summary: "Invalid request".to_string(),
                        detail: err.to_string(),
                    }),
                );
                continue;
            }
        };

        match JobKind::for_method(&request.method) {
            Some(kind) => {
                let writer = Arc::clone(&stdout);
                let job_state = jobs.clone();
                job_workers.push(thread::spawn(move || {
                    handle_job_request(request, kind, &writer, &job_state);
                }));
            }
            None => handle_sync_request(request, &stdout, &jobs),
        }
        job_workers.retain(|worker| !worker.is_finished());
    }

    for worker in job_workers {
        let _ = worker.join();
    }

    sidecar_api::cleanup_on_exit();
    Ok(())
}
