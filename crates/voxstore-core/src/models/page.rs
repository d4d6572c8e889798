//! Offset pagination for listing queries

use serde::{Deserialize, Serialize};

/// Upper bound on a single page, keeps one query from scanning the table.
pub const MAX_PAGE_SIZE: u64 = 500;

/// A 1-based page request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageQuery {
    /// Page number, 1-based
    pub page: u64,
    /// Items per page
    pub page_size: u64,
}

impl Default for PageQuery {
    fn default() -> Self {
        Self {
            page: 1,
            page_size: 10,
        }
    }
}

impl PageQuery {
    pub fn new(page: u64, page_size: u64) -> Self {
        Self { page, page_size }
    }

    /// Clamp out-of-range values instead of erroring.
    ///
    /// Page 0 reads as page 1, size 0 as 1, oversized pages as
    /// [`MAX_PAGE_SIZE`].
    pub fn normalized(self) -> Self {
        Self {
            page: self.page.max(1),
            page_size: self.page_size.clamp(1, MAX_PAGE_SIZE),
        }
    }

    /// Row offset of the first item, after normalization.
    ///
    /// Saturates instead of overflowing, so an absurdly large page number
    /// resolves to an offset past every row rather than wrapping around.
    pub fn offset(self) -> u64 {
        let norm = self.normalized();
        (norm.page - 1).saturating_mul(norm.page_size)
    }
}

/// One page of results plus the total count across all pages.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page<T> {
    /// Items on this page, possibly empty
    pub items: Vec<T>,
    /// Total matching items in the store
    pub total: u64,
    /// Page number actually served, after normalization
    pub page: u64,
    /// Page size actually served, after normalization
    pub page_size: u64,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, total: u64, query: PageQuery) -> Self {
        let norm = query.normalized();
        Self {
            items,
            total,
            page: norm.page,
            page_size: norm.page_size,
        }
    }

    /// Number of pages needed to cover `total`.
    pub fn total_pages(&self) -> u64 {
        self.total.div_ceil(self.page_size)
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
