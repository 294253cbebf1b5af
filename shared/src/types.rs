//! Common types used across the platform

use serde::{Deserialize, Serialize};

/// Pagination parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Pagination {
    pub page: u32,
    pub limit: u32,
}

impl Default for Pagination {
    fn default() -> Self {
        Self { page: 1, limit: 20 }
    }
}

impl Pagination {
    /// Row offset for SQL queries
    pub fn offset(&self) -> i64 {
        (self.page.max(1) as i64 - 1) * self.limit as i64
    }

    /// Number of result pages for a total row count
    pub fn pages(&self, total: i64) -> i64 {
        if self.limit == 0 {
            return 0;
        }
        (total + self.limit as i64 - 1) / self.limit as i64
    }
}

/// Paginated response envelope
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Paginated<T> {
    pub data: Vec<T>,
    pub page: u32,
    pub limit: u32,
    pub total: i64,
    pub pages: i64,
}

impl<T> Paginated<T> {
    pub fn new(data: Vec<T>, pagination: &Pagination, total: i64) -> Self {
        Self {
            data,
            page: pagination.page,
            limit: pagination.limit,
            total,
            pages: pagination.pages(total),
        }
    }
}

/// Convert a Gregorian year to the Thai Buddhist Era year used on
/// government-issued document numbers
pub fn buddhist_year(gregorian_year: i32) -> i32 {
    gregorian_year + 543
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pagination_offset() {
        let p = Pagination { page: 1, limit: 20 };
        assert_eq!(p.offset(), 0);

        let p = Pagination { page: 3, limit: 20 };
        assert_eq!(p.offset(), 40);

        // Page 0 is clamped to page 1
        let p = Pagination { page: 0, limit: 20 };
        assert_eq!(p.offset(), 0);
    }

    #[test]
    fn test_pagination_pages() {
        let p = Pagination { page: 1, limit: 20 };
        assert_eq!(p.pages(0), 0);
        assert_eq!(p.pages(1), 1);
        assert_eq!(p.pages(20), 1);
        assert_eq!(p.pages(21), 2);
    }

    #[test]
    fn test_buddhist_year() {
        assert_eq!(buddhist_year(2026), 2569);
        assert_eq!(buddhist_year(2024), 2567);
    }
}
