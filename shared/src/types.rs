//! Common types used across the platform

use serde::{Deserialize, Serialize};

/// Pagination parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Pagination {
    pub page: u32,
    pub per_page: u32,
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            page: 1,
            per_page: 20,
        }
    }
}

impl Pagination {
    /// Row offset for the current page
    pub fn offset(&self) -> u64 {
        u64::from(self.page.saturating_sub(1)) * u64::from(self.per_page)
    }
}

/// Paginated response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaginatedResponse<T> {
    pub data: Vec<T>,
    pub pagination: PaginationMeta,
}

/// Pagination metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaginationMeta {
    pub page: u32,
    pub per_page: u32,
    pub total_items: u64,
    pub total_pages: u32,
}

impl PaginationMeta {
    pub fn new(pagination: &Pagination, total_items: u64) -> Self {
        let per_page = pagination.per_page.max(1);
        let total_pages = total_items.div_ceil(u64::from(per_page)) as u32;
        Self {
            page: pagination.page,
            per_page,
            total_items,
            total_pages,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pagination_offset() {
        assert_eq!(Pagination::default().offset(), 0);
        assert_eq!(Pagination { page: 3, per_page: 20 }.offset(), 40);
        assert_eq!(Pagination { page: 0, per_page: 20 }.offset(), 0);
    }

    #[test]
    fn test_pagination_meta() {
        let meta = PaginationMeta::new(&Pagination { page: 2, per_page: 10 }, 25);
        assert_eq!(meta.total_pages, 3);
        assert_eq!(meta.total_items, 25);
    }
}
