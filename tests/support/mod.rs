#![allow(dead_code)]

use std::path::{Path, PathBuf};

use signcast_core::ffmpeg::AssemblyOptions;
use signcast_core::ffmpeg::ffprobe::ProbeReport;
use signcast_core::test_support::{create_test_clip, create_test_tone_wav, probe_for_test};

pub fn block_on_async<T>(
    future: impl std::future::Future<Output = Result<T, signcast_core::error::AppError>>,
) -> Result<T, signcast_core::error::AppError> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .expect("create tokio runtime");
    runtime.block_on(future)
}

/// Fast settings for tests: small frames, ultrafast preset, scratch work dir.
pub fn fast_options(work_dir: &Path) -> AssemblyOptions {
    AssemblyOptions {
        width: Some(320),
        height: Some(240),
        preset: Some("ultrafast".into()),
        work_dir: Some(work_dir.to_path_buf()),
        max_concurrent_transcodes: Some(2),
        ..Default::default()
    }
}

pub struct IntegrationEnv {
    pub ffmpeg: PathBuf,
    dir: tempfile::TempDir,
}

impl IntegrationEnv {
    pub fn new() -> Self {
        let ffmpeg = signcast_core::ffmpeg::discovery::get_ffmpeg_path()
            .expect("FFmpeg not found")
            .to_path_buf();
        let dir = tempfile::tempdir().expect("tempdir");
        Self { ffmpeg, dir }
    }

    pub fn path(&self, name: &str) -> PathBuf {
        let path = self.dir.path().join(name);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).expect("create fixture dir");
        }
        path
    }

    pub fn options(&self) -> AssemblyOptions {
        fast_options(&self.path("work"))
    }

    pub fn with_clip(&self, name: &str, duration_secs: f64, size: (u32, u32), fps: u32) -> PathBuf {
        let path = self.path(name);
        create_test_clip(&path, duration_secs, size.0, size.1, fps).expect("create test clip");
        path
    }

    pub fn with_tone(&self, name: &str, duration_secs: f64, frequency: u32) -> PathBuf {
        let path = self.path(name);
        create_test_tone_wav(&path, duration_secs, frequency, 16_000).expect("create test tone");
        path
    }
}

pub fn probe(path: &Path) -> ProbeReport {
    probe_for_test(path).expect("probe")
}

pub fn assert_close(actual: f64, expected: f64, tolerance: f64) {
    assert!(
        (actual - expected).abs() <= tolerance,
        "expected {} +/- {}, got {}",
        expected,
        tolerance,
        actual
    );
}
