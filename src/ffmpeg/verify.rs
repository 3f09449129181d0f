//! Stream integrity check via FFmpeg decode-to-null.
//!
//! A playable file decodes without errors; truncated or corrupt output makes
//! FFmpeg print errors or exit non-zero.

use std::path::Path;
use std::process::Command;

#[cfg(windows)]
use std::os::windows::process::CommandExt;

use super::discovery::get_ffmpeg_path;

fn decode_failed(success: bool, stderr: &str) -> bool {
    !success || stderr.to_lowercase().contains("error")
}

/// Decode every stream of `path` and discard the frames.
/// Returns the stderr tail as the error when decoding reports problems.
pub fn decode_check(path: &Path) -> Result<(), String> {
    let ffmpeg = get_ffmpeg_path().map_err(|e| e.to_string())?;
    let path_str = path.to_string_lossy();
    let mut cmd = Command::new(ffmpeg);
    cmd.args(["-v", "error", "-nostdin", "-i", path_str.as_ref(), "-f", "null", "-"]);
    #[cfg(windows)]
    cmd.creation_flags(0x08000000); // CREATE_NO_WINDOW
    let output = cmd.output().map_err(|e| e.to_string())?;
    let stderr = String::from_utf8_lossy(&output.stderr);

    if decode_failed(output.status.success(), &stderr) {
        return Err(format!(
            "Decode check failed (exit {}): {}",
            output.status.code().unwrap_or(-1),
            stderr.trim()
        ));
    }
    log::debug!(
        target: "signcast::ffmpeg::verify",
        "Decode check passed: {}",
        path_str
    );
    Ok(())
}
