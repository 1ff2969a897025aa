//! Convenience result type alias for SalesDesk.

use crate::error::AppError;

/// A specialized `Result` type for SalesDesk operations.
pub type AppResult<T> = Result<T, AppError>;
