pub mod announcement;
pub mod assembly;
pub mod audio;
pub mod error;
pub mod ffmpeg;
pub mod pool;
pub mod sidecar_api;
#[cfg(feature = "integration-test-api")]
pub mod test_support;
pub mod text;

pub use announcement::{AnnouncementOutcome, AnnouncementRequest, AnnouncementStatus, assemble_announcement};
pub use error::AppError;
