//! Pagination metadata returned alongside list payloads.

use serde::{Deserialize, Serialize};

const fn default_page() -> u32 {
    1
}

const fn default_limit() -> u32 {
    10
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    #[serde(default = "default_page")]
    pub page: u32,
    #[serde(default = "default_limit")]
    pub limit: u32,
    #[serde(default)]
    pub total: u64,
    #[serde(default, alias = "pages")]
    pub total_pages: u32,
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            page: default_page(),
            limit: default_limit(),
            total: 0,
            total_pages: 0,
        }
    }
}

impl Pagination {
    /// Pagination for a list the backend returned without metadata.
    #[must_use]
    pub fn single_page(len: usize) -> Self {
        let total = u64::try_from(len).unwrap_or(u64::MAX);
        Self {
            page: 1,
            limit: u32::try_from(len).unwrap_or(u32::MAX).max(default_limit()),
            total,
            total_pages: u32::from(len > 0),
        }
    }

    #[must_use]
    pub const fn has_next(&self) -> bool {
        self.page < self.total_pages
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_fields_take_defaults() {
        let pagination: Pagination = serde_json::from_str(r#"{"total": 42, "pages": 5}"#).unwrap();
        assert_eq!(pagination.page, 1);
        assert_eq!(pagination.limit, 10);
        assert_eq!(pagination.total, 42);
        assert_eq!(pagination.total_pages, 5);
        assert!(pagination.has_next());
    }

    #[test]
    fn single_page_for_bare_lists() {
        let pagination = Pagination::single_page(3);
        assert_eq!(pagination.total, 3);
        assert_eq!(pagination.total_pages, 1);
        assert!(!pagination.has_next());
        assert_eq!(Pagination::single_page(0).total_pages, 0);
    }
}
