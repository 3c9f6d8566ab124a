//! Cursor-following collector over paginated listings

use std::future::Future;
use tracing::debug;

use super::error::{AnalysisError, AnalysisResult};

/// Page size for ordinary listings
pub const DEFAULT_PAGE_SIZE: u32 = 100;

/// Page size for rule listings in scan/classification workflows
pub const RULE_SCAN_PAGE_SIZE: u32 = 1000;

/// Hard cap on pages fetched for a single listing
pub const DEFAULT_MAX_PAGES: u32 = 10_000;

/// Page size and page cap for one listing walk
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageLimits {
    pub page_size: u32,
    pub max_pages: u32,
}

impl PageLimits {
    pub fn new(page_size: u32, max_pages: u32) -> Self {
        Self {
            page_size,
            max_pages,
        }
    }
}

impl Default for PageLimits {
    fn default() -> Self {
        Self::new(DEFAULT_PAGE_SIZE, DEFAULT_MAX_PAGES)
    }
}

/// One page of a listing
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    pub items: Vec<T>,
    /// `None` (or `Some(0)`) marks the last page
    pub next_page: Option<u32>,
}

impl<T> Page<T> {
    pub fn last(items: Vec<T>) -> Self {
        Self {
            items,
            next_page: None,
        }
    }

    pub fn with_next(items: Vec<T>, next_page: u32) -> Self {
        Self {
            items,
            next_page: Some(next_page),
        }
    }
}

/// Fetch every page of a listing and concatenate the items in page order.
///
/// The first call passes `None` as page number so the service uses its
/// default. The cursor is followed until `next_page` is absent or zero; an
/// empty page with a cursor does not stop the walk. A listing that still
/// reports a next page after `max_pages` fetches fails with
/// [`AnalysisError::ExhaustedPagination`]. Any page error aborts the walk.
pub async fn fetch_all_pages<T, E, F, Fut>(
    page_size: u32,
    max_pages: u32,
    mut fetch_page: F,
) -> AnalysisResult<Vec<T>>
where
    F: FnMut(Option<u32>, u32) -> Fut,
    Fut: Future<Output = Result<Page<T>, E>>,
    E: Into<AnalysisError>,
{
    let max_pages = max_pages.max(1);
    let mut items = Vec::new();
    let mut page_number: Option<u32> = None;
    let mut fetched = 0u32;

    loop {
        if fetched >= max_pages {
            return Err(AnalysisError::ExhaustedPagination { max_pages });
        }

        let page = fetch_page(page_number, page_size).await.map_err(Into::into)?;
        fetched += 1;
        items.extend(page.items);

        match page.next_page.filter(|n| *n != 0) {
            Some(next) => {
                debug!(next, fetched, "following pagination cursor");
                page_number = Some(next);
            }
            None => break,
        }
    }

    Ok(items)
}
