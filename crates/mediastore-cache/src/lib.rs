//! # mediastore-cache
//!
//! The cache layer in front of the remote backend. A [`CacheStore`] keeps
//! serialized collection snapshots with freshness timestamps in a durable
//! [`KeyValueStore`](mediastore_core::traits::KeyValueStore), mirrors them in
//! an in-process [moka](https://crates.io/crates/moka) hot tier, and retains
//! a last-known-good copy for offline fallback.
//!
//! Durable stores:
//!
//! - **memory**: process-lifetime map (dashmap)
//! - **file**: one JSON file per key under a directory

pub mod file;
pub mod keys;
pub mod memory;
pub mod store;

pub use file::FileKeyValueStore;
pub use memory::MemoryKeyValueStore;
pub use store::{CacheRead, CacheStats, CacheStore, FillTicket};
