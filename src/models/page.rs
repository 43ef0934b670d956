//! Pagination types shared by the catalog and loan listings

use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use super::{book::BookDto, loan::LoanDto};

pub const DEFAULT_PAGE_SIZE: i64 = 20;
pub const MAX_PAGE_SIZE: i64 = 100;
/// Highest page number whose offset still fits in an i64
pub const MAX_PAGE_NUMBER: i64 = i64::MAX / MAX_PAGE_SIZE - 1;

/// Zero-based page request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: i64,
    pub size: i64,
}

impl PageRequest {
    pub fn new(page: i64, size: i64) -> Self {
        Self {
            page: page.clamp(0, MAX_PAGE_NUMBER),
            size: size.clamp(1, MAX_PAGE_SIZE),
        }
    }

    pub fn offset(&self) -> i64 {
        self.page * self.size
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self::new(0, DEFAULT_PAGE_SIZE)
    }
}

/// Pagination query parameters (`?page=0&size=20`)
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PageParams {
    /// Page number, starting at 0
    pub page: Option<i64>,
    /// Page size (default 20, max 100)
    pub size: Option<i64>,
}

impl From<PageParams> for PageRequest {
    fn from(params: PageParams) -> Self {
        PageRequest::new(
            params.page.unwrap_or(0),
            params.size.unwrap_or(DEFAULT_PAGE_SIZE),
        )
    }
}

/// One page of results plus the total number of matches
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page<T> {
    pub content: Vec<T>,
    pub request: PageRequest,
    pub total_elements: i64,
}

impl<T> Page<T> {
    pub fn new(content: Vec<T>, request: PageRequest, total_elements: i64) -> Self {
        Self {
            content,
            request,
            total_elements,
        }
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            content: self.content.into_iter().map(f).collect(),
            request: self.request,
            total_elements: self.total_elements,
        }
    }

    pub fn total_pages(&self) -> i64 {
        (self.total_elements + self.request.size - 1) / self.request.size
    }
}

/// Page position echoed back to clients
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Pageable {
    pub page_number: i64,
    pub page_size: i64,
}

/// Paginated response body
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
#[aliases(BookPage = PageResponse<BookDto>, LoanPage = PageResponse<LoanDto>)]
pub struct PageResponse<T> {
    pub content: Vec<T>,
    pub pageable: Pageable,
    pub total_elements: i64,
    pub total_pages: i64,
    pub number_of_elements: i64,
    pub first: bool,
    pub last: bool,
}

impl<T> From<Page<T>> for PageResponse<T> {
    fn from(page: Page<T>) -> Self {
        let total_pages = page.total_pages();
        let number = page.request.page;
        Self {
            number_of_elements: page.content.len() as i64,
            pageable: Pageable {
                page_number: number,
                page_size: page.request.size,
            },
            total_elements: page.total_elements,
            total_pages,
            first: number == 0,
            last: number + 1 >= total_pages,
            content: page.content,
        }
    }
}
