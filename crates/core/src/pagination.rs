//! Paging parameters, windowing and page metadata.

use serde::{Deserialize, Serialize};
use validator::Validate;
use vidtube_common::{AppError, AppResult, PaginationConfig};
use vidtube_db::{SortDirection, SortKey, document};

/// Caller-supplied paging, sorting and search parameters.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct PageRequest {
    /// 1-based page number.
    #[serde(default = "first_page")]
    #[validate(range(min = 1, message = "page must be a positive integer"))]
    pub page: u64,

    /// Page size; the configured default when absent.
    #[validate(range(min = 1, message = "limit must be a positive integer"))]
    pub limit: Option<u64>,

    /// Requested sort field; replaced by the listing's fallback when not allowed.
    pub sort_by: Option<String>,

    /// Sort direction, descending when absent.
    pub sort_type: Option<SortDirection>,

    /// Case-insensitive substring search over the listing's text fields.
    #[validate(length(max = 200))]
    pub query: Option<String>,
}

const fn first_page() -> u64 {
    1
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: first_page(),
            limit: None,
            sort_by: None,
            sort_type: None,
            query: None,
        }
    }
}

impl PageRequest {
    /// Request page `page` of size `limit`.
    #[must_use]
    pub fn new(page: u64, limit: u64) -> Self {
        Self {
            page,
            limit: Some(limit),
            ..Self::default()
        }
    }

    /// Sort by `field` in `direction`.
    #[must_use]
    pub fn sorted_by(mut self, field: &str, direction: SortDirection) -> Self {
        self.sort_by = Some(field.to_string());
        self.sort_type = Some(direction);
        self
    }

    /// Search for `query`.
    #[must_use]
    pub fn searching(mut self, query: &str) -> Self {
        self.query = Some(query.to_string());
        self
    }

    /// The trimmed search text, if any.
    #[must_use]
    pub fn search_text(&self) -> Option<&str> {
        self.query
            .as_deref()
            .map(str::trim)
            .filter(|q| !q.is_empty())
    }
}

/// A validated skip/limit window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window {
    pub page: u64,
    pub limit: u64,
    pub skip: u64,
}

/// Turns page requests into windows and sort keys.
#[derive(Debug, Clone)]
pub struct PageComposer {
    config: PaginationConfig,
}

impl PageComposer {
    #[must_use]
    pub const fn new(config: PaginationConfig) -> Self {
        Self { config }
    }

    /// Validate `request` and compute its window.
    ///
    /// Out-of-range values are rejected, never clamped.
    pub fn window(&self, request: &PageRequest) -> AppResult<Window> {
        request.validate()?;

        let limit = request.limit.unwrap_or(self.config.default_limit);
        if limit > self.config.max_limit {
            return Err(AppError::Validation(format!(
                "limit must not exceed {}",
                self.config.max_limit
            )));
        }

        let skip = (request.page - 1)
            .checked_mul(limit)
            .ok_or_else(|| AppError::Validation("page is out of range".to_string()))?;

        Ok(Window {
            page: request.page,
            limit,
            skip,
        })
    }

    /// Sort keys for `request`: an allowed field (or `fallback`), then the id
    /// in the same direction so equal keys page deterministically.
    #[must_use]
    pub fn sort_keys(&self, request: &PageRequest, allowed: &[&str], fallback: &str) -> Vec<SortKey> {
        let field = request
            .sort_by
            .as_deref()
            .filter(|field| allowed.contains(field))
            .unwrap_or(fallback);
        let direction = request.sort_type.unwrap_or_default();

        vec![
            SortKey {
                field: field.to_string(),
                direction,
            },
            SortKey {
                field: document::ID.to_string(),
                direction,
            },
        ]
    }
}

/// One page of results plus metadata.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub docs: Vec<T>,
    pub total_docs: u64,
    pub limit: u64,
    pub page: u64,
    pub total_pages: u64,
    pub has_prev_page: bool,
    pub has_next_page: bool,
    pub prev_page: Option<u64>,
    pub next_page: Option<u64>,
}

impl<T> Page<T> {
    /// Assemble a page from a windowed result and the unwindowed total.
    #[must_use]
    pub fn new(docs: Vec<T>, total_docs: u64, window: Window) -> Self {
        let total_pages = total_docs.div_ceil(window.limit).max(1);
        let has_prev_page = window.page > 1;
        let has_next_page = window.page < total_pages;

        Self {
            docs,
            total_docs,
            limit: window.limit,
            page: window.page,
            total_pages,
            has_prev_page,
            has_next_page,
            prev_page: has_prev_page.then(|| window.page - 1),
            next_page: has_next_page.then(|| window.page + 1),
        }
    }

    /// Convert every record, keeping the metadata.
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            docs: self.docs.into_iter().map(f).collect(),
            total_docs: self.total_docs,
            limit: self.limit,
            page: self.page,
            total_pages: self.total_pages,
            has_prev_page: self.has_prev_page,
            has_next_page: self.has_next_page,
            prev_page: self.prev_page,
            next_page: self.next_page,
        }
    }
}
