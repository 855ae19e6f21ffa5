//! Convenience result type alias for MediaStore.

use crate::error::AppError;

/// A specialized `Result` type for MediaStore operations.
pub type AppResult<T> = Result<T, AppError>;
