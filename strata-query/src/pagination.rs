//! Offset-based pagination.
//!
//! ```rust
//! use strata_query::Pagination;
//!
//! // Skip 10, take 20
//! let pagination = Pagination::new().skip(10).take(20);
//! assert_eq!(pagination.skip, Some(10));
//! assert_eq!(pagination.take, Some(20));
//!
//! // Page-based pagination (1-indexed)
//! let page_3 = Pagination::page(3, 25);
//! assert_eq!(page_3.skip, Some(50));
//! assert_eq!(page_3.take, Some(25));
//! ```
//!
//! With includes, a non-empty pagination forces the two-pass plan: the joined
//! select fans out one row per child, so LIMIT cannot be applied to it.

use crate::dialect::Dialect;

/// Pagination configuration for queries.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Pagination {
    /// Number of records to skip.
    pub skip: Option<u64>,
    /// Maximum number of records to take.
    pub take: Option<u64>,
}

impl Pagination {
    /// Create a new pagination with no limits.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the number of records to skip.
    pub fn skip(mut self, skip: u64) -> Self {
        self.skip = Some(skip);
        self
    }

    /// Set the maximum number of records to take.
    pub fn take(mut self, take: u64) -> Self {
        self.take = Some(take);
        self
    }

    /// The first `n` records.
    pub fn first(n: u64) -> Self {
        Self::new().take(n)
    }

    /// Page `page` (1-indexed) of `page_size` records.
    pub fn page(page: u64, page_size: u64) -> Self {
        let skip = page.saturating_sub(1).saturating_mul(page_size);
        Self::new().skip(skip).take(page_size)
    }

    /// Check if pagination is specified.
    pub fn is_empty(&self) -> bool {
        self.skip.is_none() && self.take.is_none()
    }

    /// Write the LIMIT/OFFSET tail for `dialect` to a buffer.
    #[inline]
    pub fn write_sql(&self, dialect: Dialect, buffer: &mut String, has_order: bool) {
        dialect.write_limit_offset(buffer, self.take, self.skip, has_order);
    }

    /// Render the LIMIT/OFFSET tail for `dialect`.
    pub fn to_sql(&self, dialect: Dialect) -> String {
        let mut sql = String::new();
        self.write_sql(dialect, &mut sql, true);
        sql.trim_start().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_pagination_empty() {
        assert!(Pagination::new().is_empty());
        assert!(!Pagination::first(10).is_empty());
        assert_eq!(Pagination::new().to_sql(Dialect::PostgreSql), "");
    }

    #[test]
    fn test_pagination_to_sql() {
        let p = Pagination::new().skip(10).take(20);
        assert_eq!(p.to_sql(Dialect::PostgreSql), "LIMIT 20 OFFSET 10");
        assert_eq!(p.to_sql(Dialect::MsSql), "OFFSET 10 ROWS FETCH NEXT 20 ROWS ONLY");
        assert_eq!(Pagination::first(5).to_sql(Dialect::Sqlite), "LIMIT 5");
    }

    #[test]
    fn test_page() {
        assert_eq!(Pagination::page(1, 10), Pagination::new().skip(0).take(10));
        assert_eq!(Pagination::page(0, 10).skip, Some(0));
    }
}
