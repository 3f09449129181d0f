//! Canonical 44-byte PCM WAV header: RIFF, one 16-byte `fmt ` chunk, then `data`.

use std::path::Path;

use crate::error::AppError;

pub const HEADER_LEN: usize = 44;
/// RIFF size counts everything after the 8-byte RIFF preamble: 36 header bytes + payload.
pub const RIFF_SIZE_OVERHEAD: u32 = 36;
const RIFF_SIZE_OFFSET: usize = 4;
const DATA_SIZE_OFFSET: usize = 40;

/// Sample layout from the `fmt ` chunk. Files can only be spliced when these match.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WavFormat {
    pub audio_format: u16,
    pub channels: u16,
    pub sample_rate: u32,
    pub bits_per_sample: u16,
}

fn u16_at(bytes: &[u8], offset: usize) -> u16 {
    u16::from_le_bytes([bytes[offset], bytes[offset + 1]])
}

fn u32_at(bytes: &[u8], offset: usize) -> u32 {
    u32::from_le_bytes([
        bytes[offset],
        bytes[offset + 1],
        bytes[offset + 2],
        bytes[offset + 3],
    ])
}

/// Checks the canonical layout and returns the sample format.
/// `path` is only used in error messages.
pub fn parse_header(bytes: &[u8], path: &Path) -> Result<WavFormat, AppError> {
    if bytes.len() < HEADER_LEN {
        return Err(AppError::wav_format(
            path,
            format!("{} bytes is shorter than a WAV header", bytes.len()),
        ));
    }
    if &bytes[0..4] != b"RIFF" || &bytes[8..12] != b"WAVE" {
        return Err(AppError::wav_format(path, "missing RIFF/WAVE signature"));
    }
    if &bytes[12..16] != b"fmt " || u32_at(bytes, 16) != 16 {
        return Err(AppError::wav_format(
            path,
            "fmt chunk is not the 16-byte PCM layout",
        ));
    }
    if &bytes[36..40] != b"data" {
        return Err(AppError::wav_format(
            path,
            "data chunk does not follow fmt chunk at byte 36",
        ));
    }
    Ok(WavFormat {
        audio_format: u16_at(bytes, 20),
        channels: u16_at(bytes, 22),
        sample_rate: u32_at(bytes, 24),
        bits_per_sample: u16_at(bytes, 34),
    })
}

/// Rewrite the RIFF and data size fields for a payload of `payload_len` bytes.
pub fn write_sizes(header: &mut [u8], payload_len: u32) {
    header[RIFF_SIZE_OFFSET..RIFF_SIZE_OFFSET + 4]
        .copy_from_slice(&(payload_len + RIFF_SIZE_OVERHEAD).to_le_bytes());
    header[DATA_SIZE_OFFSET..DATA_SIZE_OFFSET + 4].copy_from_slice(&payload_len.to_le_bytes());
}

/// (RIFF size, data size) as declared in a header.
pub fn declared_sizes(header: &[u8]) -> (u32, u32) {
    (u32_at(header, RIFF_SIZE_OFFSET), u32_at(header, DATA_SIZE_OFFSET))
}

/// Builds a canonical PCM header for `payload_len` bytes of samples.
pub fn pcm_header(format: WavFormat, payload_len: u32) -> [u8; HEADER_LEN] {
    let block_align = u32::from(format.channels) * u32::from(format.bits_per_sample) / 8;
    let byte_rate = format.sample_rate.wrapping_mul(block_align);
    let mut h = [0u8; HEADER_LEN];
    h[0..4].copy_from_slice(b"RIFF");
    h[8..12].copy_from_slice(b"WAVE");
    h[12..16].copy_from_slice(b"fmt ");
    h[16..20].copy_from_slice(&16u32.to_le_bytes());
    h[20..22].copy_from_slice(&format.audio_format.to_le_bytes());
    h[22..24].copy_from_slice(&format.channels.to_le_bytes());
    h[24..28].copy_from_slice(&format.sample_rate.to_le_bytes());
    h[28..32].copy_from_slice(&byte_rate.to_le_bytes());
    h[32..34].copy_from_slice(&(block_align as u16).to_le_bytes());
    h[34..36].copy_from_slice(&format.bits_per_sample.to_le_bytes());
    h[36..40].copy_from_slice(b"data");
    write_sizes(&mut h, payload_len);
    h
}

impl WavFormat {
    pub const PCM_16_MONO_16K: WavFormat = WavFormat {
        audio_format: 1,
        channels: 1,
        sample_rate: 16_000,
        bits_per_sample: 16,
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_header_round_trips_format() {
        let header = pcm_header(WavFormat::PCM_16_MONO_16K, 320);
        let format = parse_header(&header, Path::new("a.wav")).unwrap();
        assert_eq!(format, WavFormat::PCM_16_MONO_16K);
        assert_eq!(declared_sizes(&header), (356, 320));
    }

    #[test]
    fn wide_formats_do_not_overflow_block_align() {
        let format = WavFormat {
            audio_format: 1,
            channels: 2048,
            sample_rate: 48_000,
            bits_per_sample: 64,
        };
        let header = pcm_header(format, 0);
        assert_eq!(u16::from_le_bytes([header[32], header[33]]), 16_384);
        assert_eq!(u32_at(&header, 28), 48_000 * 16_384);
    }

    #[test]
    fn rejects_short_and_foreign_files() {
        let err = parse_header(b"RIFF", Path::new("short.wav")).unwrap_err();
        assert!(err.to_string().contains("short.wav"));

        let mut header = pcm_header(WavFormat::PCM_16_MONO_16K, 0);
        header[8..12].copy_from_slice(b"AVI ");
        assert!(parse_header(&header, Path::new("x.wav")).is_err());
    }

    #[test]
    fn rejects_extended_fmt_chunk() {
        let mut header = pcm_header(WavFormat::PCM_16_MONO_16K, 0);
        header[16..20].copy_from_slice(&18u32.to_le_bytes());
        assert!(parse_header(&header, Path::new("x.wav")).is_err());
    }

    #[test]
    fn rejects_list_chunk_before_data() {
        let mut header = pcm_header(WavFormat::PCM_16_MONO_16K, 0);
        header[36..40].copy_from_slice(b"LIST");
        let err = parse_header(&header, Path::new("x.wav")).unwrap_err();
        assert!(matches!(err, AppError::WavFormat { .. }));
    }
}
