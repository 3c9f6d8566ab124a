//! Full listings of each resource kind, shaped

use super::error::AnalysisResult;
use super::pagination::{fetch_all_pages, PageLimits};
use super::shaper::truncate_all;
use crate::api::{ListResponse, ReactorService};
use crate::entities::{Company, DataElement, Library, Property, Rule, RuleComponent, TruncatedItem};

pub async fn all_companies<S: ReactorService + ?Sized>(
    service: &S,
    limits: PageLimits,
) -> AnalysisResult<Vec<TruncatedItem<Company>>> {
    fetch_all_pages(limits.page_size, limits.max_pages, move |page, size| async move {
        service
            .list_companies(page, size)
            .await
            .map(ListResponse::into_page)
    })
    .await
    .map(truncate_all)
}

pub async fn all_properties<S: ReactorService + ?Sized>(
    service: &S,
    company_id: &str,
    limits: PageLimits,
) -> AnalysisResult<Vec<TruncatedItem<Property>>> {
    fetch_all_pages(limits.page_size, limits.max_pages, move |page, size| async move {
        service
            .list_properties(company_id, page, size)
            .await
            .map(ListResponse::into_page)
    })
    .await
    .map(truncate_all)
}

pub async fn all_rules<S: ReactorService + ?Sized>(
    service: &S,
    property_id: &str,
    limits: PageLimits,
) -> AnalysisResult<Vec<TruncatedItem<Rule>>> {
    fetch_all_pages(limits.page_size, limits.max_pages, move |page, size| async move {
        service
            .list_rules(property_id, page, size)
            .await
            .map(ListResponse::into_page)
    })
    .await
    .map(truncate_all)
}

pub async fn all_rule_components<S: ReactorService + ?Sized>(
    service: &S,
    rule_id: &str,
    limits: PageLimits,
) -> AnalysisResult<Vec<TruncatedItem<RuleComponent>>> {
    fetch_all_pages(limits.page_size, limits.max_pages, move |page, size| async move {
        service
            .list_rule_components(rule_id, page, size)
            .await
            .map(ListResponse::into_page)
    })
    .await
    .map(truncate_all)
}

pub async fn all_data_elements<S: ReactorService + ?Sized>(
    service: &S,
    property_id: &str,
    limits: PageLimits,
) -> AnalysisResult<Vec<TruncatedItem<DataElement>>> {
    fetch_all_pages(limits.page_size, limits.max_pages, move |page, size| async move {
        service
            .list_data_elements(property_id, page, size)
            .await
            .map(ListResponse::into_page)
    })
    .await
    .map(truncate_all)
}

pub async fn all_libraries<S: ReactorService + ?Sized>(
    service: &S,
    property_id: &str,
    limits: PageLimits,
) -> AnalysisResult<Vec<TruncatedItem<Library>>> {
    fetch_all_pages(limits.page_size, limits.max_pages, move |page, size| async move {
        service
            .list_libraries(property_id, page, size)
            .await
            .map(ListResponse::into_page)
    })
    .await
    .map(truncate_all)
}
