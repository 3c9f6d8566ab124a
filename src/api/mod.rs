//! Remote service seam
//!
//! The engine talks to the tag-management service (a JSON:API "Reactor"
//! endpoint) only through the [`ReactorService`] trait. [`ReactorClient`]
//! is the HTTP implementation; tests substitute in-memory fakes.

pub mod client;
pub mod error;
pub mod query;
pub mod service;
pub mod types;

pub use client::{ClientConfig, ReactorClient};
pub use error::{ApiError, ApiResult};
pub use query::{FieldFilter, SearchQuery};
pub use service::ReactorService;
pub use types::{ListMeta, ListResponse, Pagination, SearchMeta, SearchResponse, SingleResponse};
