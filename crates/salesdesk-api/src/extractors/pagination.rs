//! Pagination query parameters.

use serde::Deserialize;

use salesdesk_core::types::pagination::{DEFAULT_PAGE_SIZE, PageRequest};

/// `?page=&limit=`; out-of-range values are clamped.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct PaginationParams {
    #[serde(default = "default_page")]
    pub page: u64,
    #[serde(default = "default_limit")]
    pub limit: u64,
}

fn default_page() -> u64 {
    1
}

fn default_limit() -> u64 {
    DEFAULT_PAGE_SIZE
}

impl PaginationParams {
    pub fn into_page_request(self) -> PageRequest {
        PageRequest::new(self.page, self.limit)
    }
}
