//! Core traits defined in `mediastore-core` and implemented by other crates.

pub mod backend;
pub mod cache;
pub mod storage;

pub use backend::CollectionBackend;
pub use cache::KeyValueStore;
pub use storage::{BlobStore, UploadOptions};
