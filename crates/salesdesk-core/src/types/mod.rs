//! Shared value types.

pub mod pagination;
pub mod response;

pub use pagination::{PageRequest, PageResponse};
pub use response::{ApiErrorResponse, ApiResponse};
