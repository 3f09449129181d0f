//! Per-language announcement audio: asset lookup and WAV splicing.

mod assets;
pub mod splice;
pub mod wav;

pub use assets::{
    AudioAssetSource, DirectoryAudioAssets, collect_audio_parts, validate_language,
};
pub use splice::{SpliceReport, splice_wav_bytes, splice_wav_files};
pub use wav::WavFormat;
