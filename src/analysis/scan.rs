//! Whole-property scan: rules, optionally their components and the
//! property's data elements, with the references found in component settings.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{debug, warn};

use super::error::{FailureStage, PartialFailure};
use super::exec_order::RuleWithComponents;
use super::listing::all_rule_components;
use super::pagination::PageLimits;
use super::references::{extract_references, Reference};
use crate::api::ReactorService;
use crate::entities::{DataElement, Rule, RuleComponent, TruncatedItem};

/// What to include in a property scan
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanRequest {
    pub property_id: String,
    #[serde(default)]
    pub include_data_elements: bool,
    #[serde(default)]
    pub include_rule_components: bool,
}

impl ScanRequest {
    pub fn new(property_id: impl Into<String>) -> Self {
        Self {
            property_id: property_id.into(),
            ..Default::default()
        }
    }

    pub fn with_data_elements(mut self) -> Self {
        self.include_data_elements = true;
        self
    }

    pub fn with_rule_components(mut self) -> Self {
        self.include_rule_components = true;
        self
    }
}

/// Counts over a scan result
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ScanSummary {
    pub rules: usize,
    pub rule_components: usize,
    pub data_elements: usize,
    pub references: usize,
    pub failures: usize,
}

/// Result of [`ScanRequest`]
#[derive(Debug, Clone, Serialize)]
pub struct PropertyScanResult {
    pub property_id: String,
    /// Live rules, sorted by name
    pub rules: Vec<TruncatedItem<Rule>>,
    /// Components keyed by rule id; present when requested
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rule_components: Option<BTreeMap<String, Vec<TruncatedItem<RuleComponent>>>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_elements: Option<Vec<TruncatedItem<DataElement>>>,
    /// References across all fetched components
    pub references: Vec<Reference>,
    pub failures: Vec<PartialFailure>,
    pub summary: ScanSummary,
}

impl PropertyScanResult {
    /// Assemble a result and compute its summary.
    pub fn new(
        property_id: impl Into<String>,
        rules: Vec<TruncatedItem<Rule>>,
        rule_components: Option<BTreeMap<String, Vec<TruncatedItem<RuleComponent>>>>,
        data_elements: Option<Vec<TruncatedItem<DataElement>>>,
        failures: Vec<PartialFailure>,
    ) -> Self {
        let references = match &rule_components {
            Some(by_rule) => {
                let all: Vec<TruncatedItem<RuleComponent>> =
                    by_rule.values().flatten().cloned().collect();
                extract_references(&all)
            }
            None => Vec::new(),
        };

        let summary = ScanSummary {
            rules: rules.len(),
            rule_components: rule_components
                .as_ref()
                .map_or(0, |by_rule| by_rule.values().map(Vec::len).sum()),
            data_elements: data_elements.as_ref().map_or(0, Vec::len),
            references: references.len(),
            failures: failures.len(),
        };

        Self {
            property_id: property_id.into(),
            rules,
            rule_components,
            data_elements,
            references,
            failures,
            summary,
        }
    }

    /// Rules paired with their components, in rule order.
    ///
    /// Rules whose components were not fetched get an empty list.
    pub fn rules_with_components(&self) -> Vec<RuleWithComponents> {
        self.rules
            .iter()
            .map(|rule| {
                let components = self
                    .rule_components
                    .as_ref()
                    .and_then(|by_rule| by_rule.get(&rule.id))
                    .cloned()
                    .unwrap_or_default();
                RuleWithComponents::new(rule.clone(), components)
            })
            .collect()
    }
}

/// Fetch the components of each rule, one rule at a time.
///
/// A rule whose listing fails is left out of the map and recorded as a
/// [`FailureStage::FetchComponents`] failure; the batch carries on.
pub async fn collect_rule_components<S: ReactorService + ?Sized>(
    service: &S,
    rules: &[TruncatedItem<Rule>],
    limits: PageLimits,
) -> (
    BTreeMap<String, Vec<TruncatedItem<RuleComponent>>>,
    Vec<PartialFailure>,
) {
    let mut by_rule = BTreeMap::new();
    let mut failures = Vec::new();

    for rule in rules {
        match all_rule_components(service, &rule.id, limits).await {
            Ok(components) => {
                debug!(rule_id = %rule.id, count = components.len(), "fetched rule components");
                by_rule.insert(rule.id.clone(), components);
            }
            Err(e) => {
                warn!(rule_id = %rule.id, error = %e, "failed to fetch rule components");
                failures.push(PartialFailure::new(
                    &rule.id,
                    FailureStage::FetchComponents,
                    e.to_string(),
                ));
            }
        }
    }

    (by_rule, failures)
}
