//! Pagination and sorting contract shared by the API and the admin pages.
//!
//! Clients send `page` (0-based), `rowsPerPage`, `order` and `orderBy`;
//! list endpoints answer with a [`Page`] carrying `rows` and `totalItems`.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Page sizes offered by the pagination control.
pub const DEFAULT_PAGE_SIZES: [u64; 4] = [10, 25, 50, 100];
pub const DEFAULT_ROWS_PER_PAGE: u64 = 10;
pub const MAX_ROWS_PER_PAGE: u64 = 100;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PaginationError {
    #[error("unknown sort column: {0}")]
    UnknownSortKey(String),
    #[error("page {0} is out of range")]
    PageOutOfRange(u64),
}

/// Sort direction.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

impl SortOrder {
    pub fn as_str(self) -> &'static str {
        match self {
            SortOrder::Asc => "asc",
            SortOrder::Desc => "desc",
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            SortOrder::Asc => SortOrder::Desc,
            SortOrder::Desc => SortOrder::Asc,
        }
    }
}

/// Query parameters of a paginated, sortable list request.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PageQuery {
    /// 0-based page index
    pub page: u64,
    pub rows_per_page: u64,
    pub order: SortOrder,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order_by: Option<String>,
}

impl Default for PageQuery {
    fn default() -> Self {
        Self { page: 0, rows_per_page: DEFAULT_ROWS_PER_PAGE, order: SortOrder::Asc, order_by: None }
    }
}

impl PageQuery {
    /// Clamp `rows_per_page` into `1..=MAX_ROWS_PER_PAGE`; returns `(page_idx, per_page)`.
    pub fn normalize(&self) -> (u64, u64) {
        (self.page, self.rows_per_page.clamp(1, MAX_ROWS_PER_PAGE))
    }

    /// Row offset of the requested page. Offsets past `i64::MAX` cannot be sent
    /// to the database and are rejected.
    pub fn offset(&self) -> Result<u64, PaginationError> {
        let (page, per_page) = self.normalize();
        page.checked_mul(per_page)
            .filter(|offset| i64::try_from(*offset).is_ok())
            .ok_or(PaginationError::PageOutOfRange(page))
    }

    /// Sort key with blank values treated as absent.
    pub fn order_by(&self) -> Option<&str> {
        self.order_by.as_deref().map(str::trim).filter(|s| !s.is_empty())
    }

    /// Resolve `order_by` against a whitelist of `(key, column)` pairs.
    pub fn resolve_sort<C: Copy>(&self, allowed: &[(&str, C)], default: C) -> Result<C, PaginationError> {
        match self.order_by() {
            None => Ok(default),
            Some(key) => allowed
                .iter()
                .find(|(k, _)| *k == key)
                .map(|(_, c)| *c)
                .ok_or_else(|| PaginationError::UnknownSortKey(key.to_string())),
        }
    }
}

/// One page of results plus the total number of matching records.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub rows: Vec<T>,
    pub total_items: u64,
    pub page: u64,
    pub rows_per_page: u64,
}

impl<T> Page<T> {
    pub fn new(rows: Vec<T>, total_items: u64, query: &PageQuery) -> Self {
        let (page, rows_per_page) = query.normalize();
        Self { rows, total_items, page, rows_per_page }
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            rows: self.rows.into_iter().map(f).collect(),
            total_items: self.total_items,
            page: self.page,
            rows_per_page: self.rows_per_page,
        }
    }

    pub fn page_count(&self) -> u64 {
        if self.rows_per_page == 0 { return 0; }
        self.total_items.div_ceil(self.rows_per_page)
    }
}
