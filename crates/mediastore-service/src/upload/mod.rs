//! Upload pipeline and progress tracking.

pub mod pipeline;
pub mod tracker;

pub use pipeline::{RawFile, UploadOutcome, UploadPipeline};
pub use tracker::{UploadEntry, UploadStatus, UploadTracker};
