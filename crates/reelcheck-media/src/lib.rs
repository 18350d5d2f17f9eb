//! Media helpers for the ReelCheck backend.
//!
//! This crate provides:
//! - Duration probing through the `ffprobe` CLI behind the [`DurationProber`] trait
//! - Streaming storage of uploaded files under generated names

pub mod error;
pub mod probe;
pub mod upload_store;

pub use error::{MediaError, MediaResult};
pub use probe::{parse_duration, DurationProber, FfprobeDurationProber, MockDurationProber};
pub use upload_store::{PendingUpload, StoredFile, UploadStore};
