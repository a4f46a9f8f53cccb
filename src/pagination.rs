//! Offset/limit paging shared by every listing page.

use serde::Deserialize;

/// Defaults applied when a request carries no usable `limit`/`page`.
#[derive(Debug, Clone, Copy)]
pub struct PaginationDefaults {
    pub limit: u32,
    pub page: u32,
    /// Upper bound on the page count shown by the collection view.
    pub max_pages: u32,
}

impl Default for PaginationDefaults {
    fn default() -> Self {
        Self {
            limit: 20,
            page: 1,
            max_pages: 100,
        }
    }
}

/// Raw `limit`/`page` query parameters. Kept as strings so that garbage
/// falls back to the defaults instead of failing the request.
#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    pub limit: Option<String>,
    pub page: Option<String>,
}

/// Resolved paging of one request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageParams {
    pub limit: u32,
    pub page: u32,
}

impl PageParams {
    pub fn resolve(query: &PageQuery, defaults: &PaginationDefaults) -> Self {
        Self {
            limit: positive(query.limit.as_deref()).unwrap_or(defaults.limit),
            page: positive(query.page.as_deref()).unwrap_or(defaults.page),
        }
    }

    pub fn offset(&self) -> u32 {
        (self.page - 1).saturating_mul(self.limit)
    }
}

fn positive(raw: Option<&str>) -> Option<u32> {
    raw.and_then(|v| v.trim().parse::<u32>().ok()).filter(|v| *v > 0)
}

/// Navigation data handed to the views.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pagination {
    pub current_page: u32,
    pub total_pages: u32,
    pub total_items: u32,
    pub limit: u32,
    pub has_prev: bool,
    pub has_next: bool,
}

impl Pagination {
    pub fn new(params: PageParams, total_items: u32) -> Self {
        let PageParams { page, limit } = params;
        Self {
            current_page: page,
            total_pages: total_items.div_ceil(limit),
            total_items,
            limit,
            has_prev: page > 1,
            has_next: u64::from(page) * u64::from(limit) < u64::from(total_items),
        }
    }

    /// Like [`Pagination::new`] but the page count is clamped to
    /// `1..=max_pages` and "next" is bounded by that count.
    pub fn capped(params: PageParams, total_items: u32, max_pages: u32) -> Self {
        let total_pages = total_items.div_ceil(params.limit).clamp(1, max_pages.max(1));
        Self::with_total_pages(params, total_items, total_pages)
    }

    pub fn with_total_pages(params: PageParams, total_items: u32, total_pages: u32) -> Self {
        Self {
            current_page: params.page,
            total_pages,
            total_items,
            limit: params.limit,
            has_prev: params.page > 1,
            has_next: params.page < total_pages,
        }
    }

    pub fn prev_page(&self) -> u32 {
        self.current_page.saturating_sub(1).max(1)
    }

    pub fn next_page(&self) -> u32 {
        self.current_page + 1
    }
}
