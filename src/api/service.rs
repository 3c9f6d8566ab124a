//! Remote service abstraction trait.

use async_trait::async_trait;
use serde_json::Value;

use super::error::ApiResult;
use super::query::SearchQuery;
use super::types::{ListResponse, SearchResponse, SingleResponse};
use crate::entities::{Company, DataElement, Library, Property, Rule, RuleComponent};

/// Read-only view of the remote resource service.
///
/// Listing methods take an optional page number (`None` lets the service
/// pick its default, the first page) and a page size.
#[async_trait]
pub trait ReactorService: Send + Sync {
    /// Lists companies visible to the credentials.
    async fn list_companies(&self, page: Option<u32>, size: u32)
        -> ApiResult<ListResponse<Company>>;

    /// Lists the properties of a company.
    async fn list_properties(
        &self,
        company_id: &str,
        page: Option<u32>,
        size: u32,
    ) -> ApiResult<ListResponse<Property>>;

    /// Lists the rules of a property.
    async fn list_rules(
        &self,
        property_id: &str,
        page: Option<u32>,
        size: u32,
    ) -> ApiResult<ListResponse<Rule>>;

    /// Lists the components attached to a rule.
    async fn list_rule_components(
        &self,
        rule_id: &str,
        page: Option<u32>,
        size: u32,
    ) -> ApiResult<ListResponse<RuleComponent>>;

    /// Lists the data elements of a property.
    async fn list_data_elements(
        &self,
        property_id: &str,
        page: Option<u32>,
        size: u32,
    ) -> ApiResult<ListResponse<DataElement>>;

    /// Lists the libraries of a property.
    async fn list_libraries(
        &self,
        property_id: &str,
        page: Option<u32>,
        size: u32,
    ) -> ApiResult<ListResponse<Library>>;

    /// Runs a full-text search.
    async fn search(&self, query: &SearchQuery) -> ApiResult<SearchResponse>;

    /// Lists the rule(s) owning a rule component (one hop).
    async fn list_rules_for_rule_component(
        &self,
        component_id: &str,
    ) -> ApiResult<ListResponse<Value>>;

    /// Fetches a single rule.
    async fn get_rule(&self, rule_id: &str) -> ApiResult<SingleResponse<Rule>>;
}
