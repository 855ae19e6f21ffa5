//! # mediastore-core
//!
//! Core crate for MediaStore. Contains the seam traits (durable key-value
//! store, collection backend, blob store), configuration schemas, typed
//! identifiers, change events, sorting types, and the unified error system.
//!
//! This crate has **no** internal dependencies on other MediaStore crates.

pub mod config;
pub mod error;
pub mod events;
pub mod result;
pub mod traits;
pub mod types;

pub use error::AppError;
pub use result::AppResult;
