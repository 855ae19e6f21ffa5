//! Shared value types used across MediaStore crates.

pub mod id;
pub mod row;
pub mod sorting;

pub use id::{ItemId, ProjectId};
pub use row::Row;
pub use sorting::SortDirection;
