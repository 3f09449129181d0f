//! FFmpeg process spawning and progress parsing.
//!
//! Spawns FFmpeg as a child process, parses progress from stdout (pipe:1) and
//! keeps a bounded tail of stderr for error reporting. Each running child is
//! registered so `terminate_all_ffmpeg` can stop every transcode in flight.

use std::collections::HashMap;
use std::io::{BufRead, BufReader};
use std::process::{Child, Command, Stdio};

#[cfg(windows)]
use std::os::windows::process::CommandExt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, LazyLock};
use std::thread;
use std::time::{Duration, Instant};

use parking_lot::Mutex;

use super::discovery::get_ffmpeg_path;
use super::progress::parse_ffmpeg_progress;
use crate::error::AppError;

/// Receives normalized progress in [0,1].
pub type ProgressCallback = Arc<dyn Fn(f64) + Send + Sync>;

/// Sentinel for "duration not yet known". AtomicU64 cannot hold Option<f64>,
/// so duration is stored as f64 bits; u64::MAX means "not yet known".
const NONE_DURATION_BITS: u64 = u64::MAX;

const PROGRESS_EMIT_INTERVAL: Duration = Duration::from_millis(150);
/// Keep only the last N bytes of stderr to avoid unbounded memory growth.
const MAX_STDERR_BYTES: usize = 64 * 1024;

static NEXT_PROCESS_ID: AtomicU64 = AtomicU64::new(1);
static ACTIVE_FFMPEG_PROCESSES: LazyLock<Mutex<HashMap<u64, Child>>> =
    LazyLock::new(|| Mutex::new(HashMap::new()));

struct ReadStreamConfig {
    collect_stderr: Option<Arc<Mutex<Vec<u8>>>>,
    duration: Arc<AtomicU64>,
    progress_callback: Option<ProgressCallback>,
}

fn read_stream<R: std::io::Read + Send + 'static>(
    reader: R,
    config: ReadStreamConfig,
) -> thread::JoinHandle<()> {
    thread::spawn(move || {
        let bits = config.duration.load(Ordering::Relaxed);
        let mut current_duration = (bits != NONE_DURATION_BITS).then(|| f64::from_bits(bits));
        let mut last_emit = Instant::now();
        let mut last_progress = 0.0_f64;
        let mut stream_reader = BufReader::new(reader);
        let mut line_buf = Vec::with_capacity(256);
        while stream_reader.read_until(b'\n', &mut line_buf).unwrap_or(0) > 0 {
            let line = String::from_utf8_lossy(&line_buf)
                .trim_end_matches(['\n', '\r'])
                .to_string();
            let line = line.as_str();
            if let Some(ref buf) = config.collect_stderr {
                let mut guard = buf.lock();
                guard.extend_from_slice(line.as_bytes());
                guard.push(b'\n');
                if guard.len() > MAX_STDERR_BYTES {
                    let excess = guard.len() - MAX_STDERR_BYTES;
                    guard.drain(..excess);
                }
            }
            let (progress, d) = parse_ffmpeg_progress(line, current_duration);
            if let Some(new_dur) = d {
                current_duration = Some(new_dur);
                config.duration.store(new_dur.to_bits(), Ordering::Relaxed);
            }
            if let (Some(p), Some(cb)) = (progress, config.progress_callback.as_ref()) {
                let now = Instant::now();
                if now.duration_since(last_emit) >= PROGRESS_EMIT_INTERVAL
                    || (p - last_progress).abs() >= 0.01
                    || p >= 1.0
                {
                    last_emit = now;
                    last_progress = p;
                    cb(p);
                }
            }
            line_buf.clear();
        }
    })
}

/// Run FFmpeg with `args` and block until it exits.
///
/// - `duration_secs`: expected output duration, so progress can be computed from
///   `out_time_ms` before the `Duration:` line shows up on stderr.
/// - `progress_callback`: called with throttled progress in [0,1].
///
/// Returns `Aborted` when the process was killed through `terminate_all_ffmpeg`.
pub fn run_ffmpeg_blocking(
    args: Vec<String>,
    duration_secs: Option<f64>,
    progress_callback: Option<ProgressCallback>,
) -> Result<(), AppError> {
    let ffmpeg_path = get_ffmpeg_path()?;

    let input_arg = args
        .iter()
        .position(|a| a == "-i")
        .and_then(|i| args.get(i + 1));
    log::debug!(
        target: "signcast::ffmpeg::runner",
        "Spawning FFmpeg: path={}, input={:?}, output={:?}",
        ffmpeg_path.display(),
        input_arg,
        args.last()
    );

    let mut cmd = Command::new(ffmpeg_path);
    cmd.args(&args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());
    #[cfg(windows)]
    cmd.creation_flags(0x08000000); // CREATE_NO_WINDOW
    let mut child = cmd
        .spawn()
        .map_err(|e| format!("Failed to spawn FFmpeg: {}", e))?;

    let (Some(stdout), Some(stderr)) = (child.stdout.take(), child.stderr.take()) else {
        let _ = child.kill();
        let _ = child.wait();
        return Err(AppError::from("Failed to capture FFmpeg output"));
    };

    let process_id = NEXT_PROCESS_ID.fetch_add(1, Ordering::Relaxed);
    ACTIVE_FFMPEG_PROCESSES.lock().insert(process_id, child);

    let duration = Arc::new(AtomicU64::new(
        duration_secs
            .filter(|&d| d > 0.0)
            .map(f64::to_bits)
            .unwrap_or(NONE_DURATION_BITS),
    ));
    let stderr_buffer = Arc::new(Mutex::new(Vec::new()));

    let stdout_handle = read_stream(
        stdout,
        ReadStreamConfig {
            collect_stderr: None,
            duration: Arc::clone(&duration),
            progress_callback,
        },
    );
    let stderr_handle = read_stream(
        stderr,
        ReadStreamConfig {
            collect_stderr: Some(Arc::clone(&stderr_buffer)),
            duration: Arc::clone(&duration),
            progress_callback: None,
        },
    );

    let _ = stdout_handle.join();
    let _ = stderr_handle.join();

    let child = ACTIVE_FFMPEG_PROCESSES.lock().remove(&process_id);
    let status = match child {
        Some(mut c) => c.wait()?,
        None => {
            log::warn!(
                target: "signcast::ffmpeg::runner",
                "FFmpeg process was aborted (terminated externally)"
            );
            return Err(AppError::aborted());
        }
    };

    let stderr_str = String::from_utf8_lossy(&stderr_buffer.lock()).to_string();

    if status.success() {
        log::debug!(
            target: "signcast::ffmpeg::runner",
            "FFmpeg completed successfully"
        );
        Ok(())
    } else {
        let code = status.code().unwrap_or(-1);
        let err_preview = stderr_str
            .lines()
            .rev()
            .take(3)
            .collect::<Vec<_>>()
            .join("; ");
        log::error!(
            target: "signcast::ffmpeg::runner",
            "FFmpeg failed (code={}): {}",
            code,
            err_preview
        );
        Err(AppError::ffmpeg_failed(code, stderr_str))
    }
}

/// Kill every running FFmpeg child. Their callers observe `AppError::Aborted`.
pub fn terminate_all_ffmpeg() -> usize {
    let children: Vec<Child> = ACTIVE_FFMPEG_PROCESSES
        .lock()
        .drain()
        .map(|(_, child)| child)
        .collect();
    let count = children.len();
    if count > 0 {
        log::info!(
            target: "signcast::ffmpeg::runner",
            "Terminating {} FFmpeg process(es)",
            count
        );
    }
    for mut child in children {
        let _ = child.kill();
        let _ = child.wait();
    }
    count
}

/// Number of FFmpeg children currently running.
pub fn active_ffmpeg_count() -> usize {
    ACTIVE_FFMPEG_PROCESSES.lock().len()
}
