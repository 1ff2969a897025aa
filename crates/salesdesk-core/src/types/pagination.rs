//! Pagination types for list endpoints.

use serde::{Deserialize, Serialize};

/// Default page size.
pub const DEFAULT_PAGE_SIZE: u64 = 20;
/// Maximum page size.
pub const MAX_PAGE_SIZE: u64 = 100;

/// Request parameters for paginated queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRequest {
    /// Page number (1-based).
    #[serde(default = "default_page")]
    pub page: u64,
    /// Number of items per page.
    #[serde(default = "default_page_size", alias = "limit")]
    pub page_size: u64,
}

impl PageRequest {
    /// Create a new page request, clamping out-of-range values.
    pub fn new(page: u64, page_size: u64) -> Self {
        Self {
            page: page.max(1),
            page_size: page_size.clamp(1, MAX_PAGE_SIZE),
        }
    }

    /// Calculate the SQL `OFFSET` value.
    pub fn offset(&self) -> u64 {
        (self.page.saturating_sub(1)) * self.page_size
    }

    /// Return the SQL `LIMIT` value.
    pub fn limit(&self) -> u64 {
        self.page_size
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: 1,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

/// Paginated response wrapper.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageResponse<T> {
    /// The items on this page.
    pub items: Vec<T>,
    /// Current page number (1-based).
    pub page: u64,
    /// Number of items per page.
    pub page_size: u64,
    /// Total number of items across all pages.
    pub total_items: u64,
    /// Total number of pages.
    pub total_pages: u64,
}

impl<T> PageResponse<T> {
    /// Create a new paginated response.
    pub fn new(items: Vec<T>, page: u64, page_size: u64, total_items: u64) -> Self {
        let total_pages = if total_items == 0 || page_size == 0 {
            1
        } else {
            total_items.div_ceil(page_size)
        };
        Self {
            items,
            page,
            page_size,
            total_items,
            total_pages,
        }
    }

    /// Slice an already-filtered, already-ordered list into one page.
    pub fn from_sorted(all: Vec<T>, request: &PageRequest) -> Self {
        let total = all.len() as u64;
        let items = all
            .into_iter()
            .skip(request.offset() as usize)
            .take(request.limit() as usize)
            .collect();
        Self::new(items, request.page, request.page_size, total)
    }
}

fn default_page() -> u64 {
    1
}

fn default_page_size() -> u64 {
    DEFAULT_PAGE_SIZE
}
