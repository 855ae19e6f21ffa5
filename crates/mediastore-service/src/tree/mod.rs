//! Hierarchical media tree over the `media` collection.

pub mod batch;
pub mod service;

pub use batch::{BatchReport, MoveOutcome};
pub use service::MediaTree;
