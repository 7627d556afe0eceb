use serde::{Deserialize, Serialize};

pub const DEFAULT_PAGE_SIZE: i64 = 10;
pub const MAX_PAGE_SIZE: i64 = 100;

/// Selects a page of orders. Pages are numbered from 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SalesFilter {
    pub recurring: bool,
    pub page_size: i64,
    pub page: i64,
}

impl SalesFilter {
    /// Creates a filter, clamping the page size to `1..=MAX_PAGE_SIZE` and the page number to at least 1.
    pub fn new(recurring: bool, page_size: i64, page: i64) -> Self {
        let page_size = if page_size < 1 { DEFAULT_PAGE_SIZE } else { page_size.min(MAX_PAGE_SIZE) };
        Self { recurring, page_size, page: page.max(1) }
    }

    pub fn offset(&self) -> i64 {
        (self.page - 1).saturating_mul(self.page_size)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub current_page: i64,
    pub page_size: i64,
    pub last_page: i64,
    pub total_records: i64,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, filter: &SalesFilter, total_records: i64) -> Self {
        let last_page = if total_records == 0 { 1 } else { (total_records + filter.page_size - 1) / filter.page_size };
        Self { items, current_page: filter.page, page_size: filter.page_size, last_page, total_records }
    }
}
