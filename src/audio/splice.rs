//! Byte-level WAV concatenation: payloads are appended verbatim and only the
//! two size fields of the first file's header are rewritten. No decoding.

use std::fs;
use std::path::{Path, PathBuf};

use super::wav::{self, HEADER_LEN, RIFF_SIZE_OVERHEAD, WavFormat};
use crate::error::AppError;

/// Summary of a completed splice.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SpliceReport {
    pub output: PathBuf,
    pub parts: usize,
    pub payload_bytes: u64,
    /// Inputs that were None or did not exist.
    pub skipped: Vec<PathBuf>,
}

/// Concatenate in-memory WAV files. Every header must share the first one's
/// sample format. Returns None when no input was given.
pub fn splice_wav_bytes(files: &[(PathBuf, Vec<u8>)]) -> Result<Option<Vec<u8>>, AppError> {
    let Some((first_path, first_bytes)) = files.first() else {
        return Ok(None);
    };
    let expected: WavFormat = wav::parse_header(first_bytes, first_path)?;

    let mut total: u64 = 0;
    for (path, bytes) in files {
        let format = wav::parse_header(bytes, path)?;
        if format != expected {
            return Err(AppError::wav_format(
                path,
                format!(
                    "sample format {}ch/{}Hz/{}bit differs from {} ({}ch/{}Hz/{}bit)",
                    format.channels,
                    format.sample_rate,
                    format.bits_per_sample,
                    first_path.display(),
                    expected.channels,
                    expected.sample_rate,
                    expected.bits_per_sample
                ),
            ));
        }
        total += (bytes.len() - HEADER_LEN) as u64;
    }

    let payload_len = u32::try_from(total)
        .ok()
        .filter(|len| len.checked_add(RIFF_SIZE_OVERHEAD).is_some())
        .ok_or_else(|| {
            AppError::wav_format(first_path, format!("{} payload bytes exceed the WAV size limit", total))
        })?;

    let mut out = Vec::with_capacity(HEADER_LEN + total as usize);
    out.extend_from_slice(&first_bytes[..HEADER_LEN]);
    wav::write_sizes(&mut out[..HEADER_LEN], payload_len);
    for (_, bytes) in files {
        out.extend_from_slice(&bytes[HEADER_LEN..]);
    }
    Ok(Some(out))
}

/// Splice the WAV files in `inputs` (in order) into `output`.
///
/// `None` entries and paths that do not exist are skipped. Returns `Ok(None)`
/// when nothing is left to splice; the caller decides whether that is fatal.
pub fn splice_wav_files(
    inputs: &[Option<PathBuf>],
    output: &Path,
) -> Result<Option<SpliceReport>, AppError> {
    let mut skipped = Vec::new();
    let mut files = Vec::with_capacity(inputs.len());
    for input in inputs.iter().flatten() {
        if !input.is_file() {
            log::warn!(
                target: "signcast::audio::splice",
                "Skipping missing audio part: {}",
                input.display()
            );
            skipped.push(input.clone());
            continue;
        }
        let bytes = fs::read(input)?;
        files.push((input.clone(), bytes));
    }

    let Some(spliced) = splice_wav_bytes(&files)? else {
        log::warn!(
            target: "signcast::audio::splice",
            "No audio parts to splice into {}",
            output.display()
        );
        return Ok(None);
    };

    if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    fs::write(output, &spliced)?;

    let payload_bytes = (spliced.len() - HEADER_LEN) as u64;
    log::info!(
        target: "signcast::audio::splice",
        "Spliced {} parts ({} payload bytes) into {}",
        files.len(),
        payload_bytes,
        output.display()
    );
    Ok(Some(SpliceReport {
        output: output.to_path_buf(),
        parts: files.len(),
        payload_bytes,
        skipped,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::wav::{declared_sizes, pcm_header};

    fn wav_bytes(format: WavFormat, payload: &[u8]) -> Vec<u8> {
        let mut bytes = pcm_header(format, payload.len() as u32).to_vec();
        bytes.extend_from_slice(payload);
        bytes
    }

    #[test]
    fn splice_rewrites_sizes_and_appends_payloads() {
        let a = wav_bytes(WavFormat::PCM_16_MONO_16K, &[1; 10]);
        let b = wav_bytes(WavFormat::PCM_16_MONO_16K, &[2; 6]);
        let out = splice_wav_bytes(&[("a.wav".into(), a), ("b.wav".into(), b)])
            .unwrap()
            .unwrap();
        assert_eq!(out.len(), HEADER_LEN + 16);
        assert_eq!(declared_sizes(&out), (16 + 36, 16));
        assert_eq!(&out[HEADER_LEN..HEADER_LEN + 10], &[1; 10]);
        assert_eq!(&out[HEADER_LEN + 10..], &[2; 6]);
    }

    #[test]
    fn first_header_is_reused_verbatim_apart_from_sizes() {
        let a = wav_bytes(WavFormat::PCM_16_MONO_16K, &[0; 4]);
        let out = splice_wav_bytes(&[("a.wav".into(), a.clone())]).unwrap().unwrap();
        assert_eq!(&out[..4], &a[..4]);
        assert_eq!(&out[8..40], &a[8..40]);
    }

    #[test]
    fn nothing_to_splice_is_none() {
        assert_eq!(splice_wav_bytes(&[]).unwrap(), None);
    }

    #[test]
    fn mismatched_sample_rates_are_rejected() {
        let a = wav_bytes(WavFormat::PCM_16_MONO_16K, &[0; 4]);
        let b = wav_bytes(
            WavFormat {
                sample_rate: 44_100,
                ..WavFormat::PCM_16_MONO_16K
            },
            &[0; 4],
        );
        let err = splice_wav_bytes(&[("a.wav".into(), a), ("b.wav".into(), b)]).unwrap_err();
        assert!(matches!(err, AppError::WavFormat { ref path, .. } if path == Path::new("b.wav")));
    }

    #[test]
    fn files_skip_none_and_missing_entries() {
        let dir = tempfile::tempdir().unwrap();
        let a = dir.path().join("a.wav");
        fs::write(&a, wav_bytes(WavFormat::PCM_16_MONO_16K, &[7; 8])).unwrap();
        let missing = dir.path().join("missing.wav");
        let output = dir.path().join("out/en.wav");

        let report = splice_wav_files(&[None, Some(a), Some(missing.clone())], &output)
            .unwrap()
            .unwrap();
        assert_eq!(report.parts, 1);
        assert_eq!(report.payload_bytes, 8);
        assert_eq!(report.skipped, [missing]);
        assert_eq!(fs::read(&output).unwrap().len(), HEADER_LEN + 8);
    }

    #[test]
    fn files_all_missing_returns_none_and_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("out.wav");
        let result = splice_wav_files(&[None, Some(dir.path().join("nope.wav"))], &output).unwrap();
        assert!(result.is_none());
        assert!(!output.exists());
    }
}
