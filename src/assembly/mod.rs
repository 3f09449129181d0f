//! Video side of the pipeline: validate, normalize, concatenate, merge.

pub mod concat;
mod manifest;
pub mod merge;
pub mod normalizer;
pub mod validator;

pub use concat::{ConcatOutcome, ConcatStrategy, concat_videos, fallback_ceiling_secs};
pub use manifest::ConcatManifest;
pub use merge::{AudioTrack, merge_audio_video};
pub use normalizer::{ClipFailure, NormalizedBatch, normalize_batch, normalize_clip};
pub use validator::{MediaDescriptor, validate_media};
