//! Reverse resolution: which rules reference a data element?
//!
//! Runs as a two-phase pipeline:
//!
//! 1. **Search** - two full-text queries over current-revision rule
//!    components of the property (one per reference syntax), issued
//!    concurrently, each paged until its reported total is covered, then
//!    merged; soft-deleted hits are dropped.
//! 2. **Resolve** - each component hit is replaced by its owning rule. A
//!    lookup that fails keeps the component as a fallback and is recorded
//!    as a [`PartialFailure`].
//!
//! The merged list is deduplicated by id, first occurrence winning.

use serde::Serialize;
use std::collections::HashSet;
use std::future::Future;
use tracing::{debug, warn};

use super::error::{require, AnalysisResult, FailureStage, PartialFailure};
use super::shaper::truncate;
use crate::api::{ApiResult, ReactorService, SearchQuery};
use crate::entities::{SearchItem, ShapedItem, SoftDeletable};

/// Resource type of rule component search hits
pub const RULE_COMPONENTS: &str = "rule_components";

/// Upper bound on result windows fetched per query
pub const MAX_SEARCH_WINDOWS: u32 = 10;

/// Result of a reverse lookup
#[derive(Debug, Clone, Serialize)]
pub struct ReverseLookup {
    pub data_element_name: String,
    /// Owning rules, or component records whose owner could not be resolved
    pub items: Vec<ShapedItem>,
    /// Number of items after deduplication
    pub total_hits: usize,
    /// Sum of `total_hits` the search endpoint reported for both queries
    pub search_hits: u64,
    pub failures: Vec<PartialFailure>,
}

/// Output of the search phase
#[derive(Debug, Clone, Default)]
pub struct SearchPhase {
    pub hits: Vec<SearchItem>,
    pub total_hits: u64,
}

/// Output of the resolve phase
#[derive(Debug, Clone, Default)]
pub struct Resolution {
    pub items: Vec<ShapedItem>,
    pub failures: Vec<PartialFailure>,
}

fn scoped_query(property_id: &str, search_size: u32) -> SearchQuery {
    SearchQuery::new()
        .resource_type(RULE_COMPONENTS)
        .field("attributes.revision_number", 0)
        .field("relationships.property.data.id", property_id)
        .size(search_size)
}

/// The percent-syntax and satellite-call queries for a data element name
pub fn reference_queries(
    property_id: &str,
    data_element_name: &str,
    search_size: u32,
) -> [SearchQuery; 2] {
    [
        scoped_query(property_id, search_size)
            .field("attributes.settings", format!("%{data_element_name}%")),
        scoped_query(property_id, search_size).field(
            "attributes.settings",
            format!("_satellite.getVar(\"{data_element_name}\")"),
        ),
    ]
}

/// Walk a query's result windows until the reported total is covered, the
/// service returns an empty window or `MAX_SEARCH_WINDOWS` is reached.
pub async fn search_all<S: ReactorService + ?Sized>(
    service: &S,
    query: SearchQuery,
) -> ApiResult<SearchPhase> {
    let mut phase = SearchPhase::default();
    let mut query = query;

    for window in 0..MAX_SEARCH_WINDOWS {
        let response = service.search(&query).await?;
        if window == 0 {
            phase.total_hits = response.meta.total_hits;
        }
        if response.data.is_empty() {
            break;
        }

        let next = query.from.saturating_add(response.data.len() as u32);
        phase.hits.extend(response.data);
        if phase.hits.len() as u64 >= phase.total_hits {
            return Ok(phase);
        }
        query = query.offset(next);
    }

    if (phase.hits.len() as u64) < phase.total_hits {
        warn!(
            fetched = phase.hits.len(),
            total_hits = phase.total_hits,
            "search results truncated"
        );
    }
    Ok(phase)
}

/// Phase 1: run both queries concurrently, merge, drop soft-deleted hits.
pub async fn search_phase<S: ReactorService + ?Sized>(
    service: &S,
    property_id: &str,
    data_element_name: &str,
    search_size: u32,
) -> AnalysisResult<SearchPhase> {
    let [percent, satellite] = reference_queries(property_id, data_element_name, search_size);

    let (percent_hits, satellite_hits) = futures::try_join!(
        search_all(service, percent),
        search_all(service, satellite)
    )?;

    let total_hits = percent_hits.total_hits + satellite_hits.total_hits;
    let mut hits = percent_hits.hits;
    hits.extend(satellite_hits.hits);

    let before = hits.len();
    hits.retain(|hit| !hit.attributes.is_deleted());
    debug!(
        data_element = data_element_name,
        total_hits,
        dropped_deleted = before - hits.len(),
        "reference search complete"
    );

    Ok(SearchPhase { hits, total_hits })
}

/// Phase 2: replace each rule component hit with its owning rule.
///
/// Lookups run one at a time. `owner_of` yields `Ok(None)` when the service
/// returns no owner; both that and an error keep the original hit.
pub async fn resolve_phase<F, Fut>(hits: Vec<SearchItem>, mut owner_of: F) -> Resolution
where
    F: FnMut(String) -> Fut,
    Fut: Future<Output = ApiResult<Option<SearchItem>>>,
{
    let mut resolution = Resolution::default();

    for hit in hits {
        if hit.resource_type != RULE_COMPONENTS {
            resolution.items.push(truncate(hit));
            continue;
        }

        match owner_of(hit.id.clone()).await {
            Ok(Some(rule)) => resolution.items.push(truncate(rule)),
            Ok(None) => {
                warn!(component_id = %hit.id, "no owning rule returned for component");
                resolution.failures.push(PartialFailure::new(
                    &hit.id,
                    FailureStage::ResolveOwner,
                    "no owning rule returned",
                ));
                resolution.items.push(truncate(hit));
            }
            Err(e) => {
                warn!(component_id = %hit.id, error = %e, "failed to resolve owning rule");
                resolution.failures.push(PartialFailure::new(
                    &hit.id,
                    FailureStage::ResolveOwner,
                    e.to_string(),
                ));
                resolution.items.push(truncate(hit));
            }
        }
    }

    resolution
}

/// Keep the first record for each id
pub fn dedup_by_id(items: Vec<ShapedItem>) -> Vec<ShapedItem> {
    let mut seen = HashSet::new();
    items
        .into_iter()
        .filter(|item| seen.insert(item.id.clone()))
        .collect()
}

/// Find the rules whose components reference `data_element_name`.
pub async fn find_rules_referencing_data_element<S: ReactorService + ?Sized>(
    service: &S,
    property_id: &str,
    data_element_name: &str,
    search_size: u32,
) -> AnalysisResult<ReverseLookup> {
    require(property_id, "property id")?;
    require(data_element_name, "data element name")?;

    let search = search_phase(service, property_id, data_element_name, search_size).await?;

    let resolution = resolve_phase(search.hits, move |component_id| async move {
        service
            .list_rules_for_rule_component(&component_id)
            .await
            .map(|owners| owners.data.into_iter().next())
    })
    .await;

    let items = dedup_by_id(resolution.items);

    Ok(ReverseLookup {
        data_element_name: data_element_name.to_string(),
        total_hits: items.len(),
        items,
        search_hits: search.total_hits,
        failures: resolution.failures,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::testing::{component_hit, rule_hit, FakeService};
    use crate::api::ApiError;
    use crate::entities::Named;
    use serde_json::json;

    #[test]
    fn test_query_shapes() {
        let [percent, satellite] = reference_queries("PR1", "cartTotal", 100);

        let p = percent.to_body();
        assert_eq!(p["data"]["resource_types"], json!(["rule_components"]));
        assert_eq!(p["data"]["query"]["attributes.revision_number"], json!({"value": 0}));
        assert_eq!(
            p["data"]["query"]["relationships.property.data.id"],
            json!({"value": "PR1"})
        );
        assert_eq!(p["data"]["query"]["attributes.settings"], json!({"value": "%cartTotal%"}));

        let s = satellite.to_body();
        assert_eq!(
            s["data"]["query"]["attributes.settings"],
            json!({"value": "_satellite.getVar(\"cartTotal\")"})
        );
    }

    #[tokio::test]
    async fn test_resolve_phase_promotes_and_falls_back() {
        let hits = vec![component_hit("RC1", false), component_hit("RC2", false)];

        let resolution = resolve_phase(hits, |id| async move {
            match id.as_str() {
                "RC1" => Ok(Some(rule_hit("RL1", "Checkout"))),
                _ => Err(ApiError::Status {
                    status: 500,
                    endpoint: format!("/rule_components/{id}/rules"),
                }),
            }
        })
        .await;

        assert_eq!(resolution.items.len(), 2);
        assert_eq!(resolution.items[0].id, "RL1");
        assert_eq!(resolution.items[0].resource_type, "rules");
        assert_eq!(resolution.items[1].id, "RC2");
        assert_eq!(resolution.items[1].resource_type, "rule_components");

        assert_eq!(resolution.failures.len(), 1);
        assert_eq!(resolution.failures[0].item_id, "RC2");
        assert_eq!(resolution.failures[0].stage, FailureStage::ResolveOwner);
    }

    #[tokio::test]
    async fn test_resolve_phase_missing_owner_is_a_failure() {
        let resolution =
            resolve_phase(vec![component_hit("RC9", false)], |_| async { Ok(None) }).await;
        assert_eq!(resolution.items[0].id, "RC9");
        assert_eq!(resolution.failures[0].message, "no owning rule returned");
    }

    #[tokio::test]
    async fn test_overlapping_hits_yield_each_rule_once() {
        let service = FakeService::new()
            .with_search("%cartTotal%", vec![component_hit("RC1", false), component_hit("RC2", false)])
            .with_search(
                "_satellite.getVar(\"cartTotal\")",
                vec![component_hit("RC1", false), component_hit("RC3", false)],
            )
            .with_owner("RC1", rule_hit("RL1", "Checkout"))
            .with_owner("RC2", rule_hit("RL1", "Checkout"))
            .with_owner("RC3", rule_hit("RL2", "Cart View"));

        let lookup = find_rules_referencing_data_element(&service, "PR1", "cartTotal", 100)
            .await
            .unwrap();

        let ids: Vec<&str> = lookup.items.iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, vec!["RL1", "RL2"]);
        assert_eq!(lookup.total_hits, 2);
        assert_eq!(lookup.search_hits, 4);
        assert!(lookup.failures.is_empty());
        assert_eq!(lookup.items[1].attributes.name(), "Cart View");
    }

    #[tokio::test]
    async fn test_deleted_hits_are_never_resolved() {
        let service = FakeService::new()
            .with_search("%userId%", vec![component_hit("RC1", true), component_hit("RC2", false)])
            .with_owner("RC1", rule_hit("RL1", "Deleted Owner"))
            .with_owner("RC2", rule_hit("RL2", "Live Owner"));

        let lookup = find_rules_referencing_data_element(&service, "PR1", "userId", 100)
            .await
            .unwrap();

        assert_eq!(lookup.items.len(), 1);
        assert_eq!(lookup.items[0].id, "RL2");
        assert_eq!(service.owner_lookups(), vec!["RC2".to_string()]);
    }

    #[tokio::test]
    async fn test_owner_failure_keeps_component() {
        let service = FakeService::new()
            .with_search("%pageName%", vec![component_hit("RC1", false), component_hit("RC2", false)])
            .with_owner("RC1", rule_hit("RL1", "Pageview"));

        let lookup = find_rules_referencing_data_element(&service, "PR1", "pageName", 100)
            .await
            .unwrap();

        let ids: Vec<&str> = lookup.items.iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, vec!["RL1", "RC2"]);
        assert_eq!(lookup.failures.len(), 1);
    }

    #[tokio::test]
    async fn test_search_failure_propagates() {
        let service = FakeService::new().failing_search();
        let result = find_rules_referencing_data_element(&service, "PR1", "x", 100).await;
        assert!(matches!(result, Err(crate::analysis::AnalysisError::Upstream(_))));
    }

    #[tokio::test]
    async fn test_blank_input_is_rejected() {
        let service = FakeService::new();
        assert!(matches!(
            find_rules_referencing_data_element(&service, "", "x", 100).await,
            Err(crate::analysis::AnalysisError::Validation(_))
        ));
        assert!(matches!(
            find_rules_referencing_data_element(&service, "PR1", " ", 100).await,
            Err(crate::analysis::AnalysisError::Validation(_))
        ));
    }

    #[test]
    fn test_dedup_keeps_first() {
        let items = vec![
            truncate(rule_hit("RL1", "first")),
            truncate(rule_hit("RL2", "other")),
            truncate(rule_hit("RL1", "second")),
        ];
        let deduped = dedup_by_id(items);
        assert_eq!(deduped.len(), 2);
        assert_eq!(deduped[0].attributes.name(), "first");
    }

    #[tokio::test]
    async fn test_search_pages_past_first_window() {
        let hits: Vec<SearchItem> = (1..=5)
            .map(|n| component_hit(&format!("RC{n}"), false))
            .collect();
        let service = FakeService::new().with_search("%cartTotal%", hits);

        let query = reference_queries("PR1", "cartTotal", 2)[0].clone();
        let phase = search_all(&service, query).await.unwrap();

        let ids: Vec<&str> = phase.hits.iter().map(|h| h.id.as_str()).collect();
        assert_eq!(ids, vec!["RC1", "RC2", "RC3", "RC4", "RC5"]);
        assert_eq!(phase.total_hits, 5);
        assert_eq!(service.search_offsets(), vec![0, 2, 4]);
    }

    #[tokio::test]
    async fn test_search_stops_at_window_cap() {
        let hits: Vec<SearchItem> = (1..=30)
            .map(|n| component_hit(&format!("RC{n}"), false))
            .collect();
        let service = FakeService::new().with_search("%big%", hits);

        let query = reference_queries("PR1", "big", 1)[0].clone();
        let phase = search_all(&service, query).await.unwrap();

        assert_eq!(phase.hits.len(), MAX_SEARCH_WINDOWS as usize);
        assert_eq!(phase.total_hits, 30);
    }
}
