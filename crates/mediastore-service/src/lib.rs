//! # mediastore-service
//!
//! Application services for MediaStore. Gateways put the cache in front of
//! the collection backend and announce mutations on the change bus; the
//! media tree and upload pipeline are built on top of the media gateway.
//!
//! Services take their dependencies at construction time and are cheap to
//! clone.

pub mod context;
pub mod gateway;
pub mod tree;
pub mod upload;

pub use context::ServiceContext;
pub use gateway::{DocumentGateway, PersistenceGateway};
pub use tree::{BatchReport, MediaTree, MoveOutcome};
pub use upload::{RawFile, UploadOutcome, UploadPipeline, UploadStatus, UploadTracker};
