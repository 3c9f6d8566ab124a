//! JSON:API response envelopes

use serde::{Deserialize, Serialize};

use crate::analysis::pagination::Page;
use crate::entities::{Resource, SearchItem};

/// Paginated list response `{data: [...], meta: {pagination: {...}}}`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListResponse<A> {
    pub data: Vec<Resource<A>>,

    #[serde(default)]
    pub meta: ListMeta,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ListMeta {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pagination: Option<Pagination>,
}

/// Cursor block of a list response
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Pagination {
    pub current_page: Option<u32>,
    pub next_page: Option<u32>,
    pub prev_page: Option<u32>,
    pub total_pages: Option<u32>,
    pub total_count: Option<u64>,
}

impl<A> ListResponse<A> {
    /// The next page number, if the service reports one
    pub fn next_page(&self) -> Option<u32> {
        self.meta.pagination.as_ref().and_then(|p| p.next_page)
    }

    pub fn into_page(self) -> Page<Resource<A>> {
        let next_page = self.next_page();
        Page {
            items: self.data,
            next_page,
        }
    }
}

/// Single-resource response `{data: {...}}`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SingleResponse<A> {
    pub data: Resource<A>,
}

/// Search response `{data: [...], meta: {total_hits}}`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SearchResponse {
    #[serde(default)]
    pub data: Vec<SearchItem>,

    #[serde(default)]
    pub meta: SearchMeta,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchMeta {
    pub total_hits: u64,
}
