//! Pagination hooks, consulted after every page of an inbound record.
//!
//! Pagination state is local to one inbound record: the query calls
//! [`Paginator::reset`] before the first page of every inbound record.

use serde_json::Value;
use url::Url;

use crate::json_path::JsonPathExpr;

pub const DEFAULT_PAGE_SIZE: usize = 100;
pub const DEFAULT_TOTAL_AVAILABLE_PATH: &str = "pagination.totalAvailable";

pub trait Paginator: Send {
    /// Back to the first page.
    fn reset(&mut self);

    /// Add the current page to `url`.
    fn page_url(&self, _url: &mut Url) {}

    /// Inspect a page (`rows` records were matched) and advance.
    /// Returns `true` when another page must be fetched.
    fn advance(&mut self, response: &Value, rows: usize) -> bool;
}

/// Every inbound record maps to a single request.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoPagination;

impl Paginator for NoPagination {
    fn reset(&mut self) {}

    fn advance(&mut self, _response: &Value, _rows: usize) -> bool {
        false
    }
}

/// `pageSize` / `pageNumber` query parameters, driven by a total count the
/// first response reports (`pagination.totalAvailable` by default).
///
/// Another page is requested while the last page matched something and
/// `current_page * page_size < total_available`. What counts as "matched" is
/// the record count of the query's own JSONPath unless a separate
/// pagination path is set with [`PageNumberPagination::with_pagination_path`].
#[derive(Debug, Clone)]
pub struct PageNumberPagination {
    page_size: usize,
    current_page: usize,
    total_available: Option<u64>,
    total_path: JsonPathExpr,
    pagination_path: Option<JsonPathExpr>,
}

impl PageNumberPagination {
    pub fn new(page_size: usize, total_path: JsonPathExpr) -> Self {
        Self {
            page_size: page_size.max(1),
            current_page: 1,
            total_available: None,
            total_path,
            pagination_path: None,
        }
    }

    /// Decide on the next page from the matches of `path` in the raw page.
    pub fn with_pagination_path(mut self, path: JsonPathExpr) -> Self {
        self.pagination_path = Some(path);
        self
    }

    pub fn current_page(&self) -> usize {
        self.current_page
    }

    fn read_total(&self, response: &Value) -> Option<u64> {
        match self.total_path.find(response).first()? {
            Value::Number(n) => n.as_u64(),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }
}

impl Paginator for PageNumberPagination {
    fn reset(&mut self) {
        self.current_page = 1;
        self.total_available = None;
    }

    fn page_url(&self, url: &mut Url) {
        url.query_pairs_mut()
            .append_pair("pageSize", &self.page_size.to_string())
            .append_pair("pageNumber", &self.current_page.to_string());
    }

    fn advance(&mut self, response: &Value, rows: usize) -> bool {
        if self.total_available.is_none() {
            self.total_available = self.read_total(response);
        }
        let rows = match &self.pagination_path {
            Some(path) => path.find(response).len(),
            None => rows,
        };
        let total = self.total_available.unwrap_or(0);
        if rows > 0 && ((self.current_page * self.page_size) as u64) < total {
            self.current_page += 1;
            return true;
        }
        self.reset();
        false
    }
}

/// Page number parameter only; another page is requested while pages come
/// back full.
#[derive(Debug, Clone)]
pub struct FullPagePagination {
    page_size: usize,
    page_param: String,
    current_page: usize,
}

impl FullPagePagination {
    pub fn new(page_size: usize, page_param: impl Into<String>) -> Self {
        Self {
            page_size: page_size.max(1),
            page_param: page_param.into(),
            current_page: 1,
        }
    }
}

impl Paginator for FullPagePagination {
    fn reset(&mut self) {
        self.current_page = 1;
    }

    fn page_url(&self, url: &mut Url) {
        url.query_pairs_mut()
            .append_pair(&self.page_param, &self.current_page.to_string());
    }

    fn advance(&mut self, _response: &Value, rows: usize) -> bool {
        if rows >= self.page_size {
            self.current_page += 1;
            return true;
        }
        self.reset();
        false
    }
}
