//! Entry points of the analysis engine

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::error::{require, AnalysisResult, PartialFailure};
use super::exec_order::{classify, ExecutionOrder};
use super::listing;
use super::pagination::{PageLimits, DEFAULT_MAX_PAGES, DEFAULT_PAGE_SIZE, RULE_SCAN_PAGE_SIZE};
use super::references::{extract_references, Reference};
use super::resolver::{find_rules_referencing_data_element, ReverseLookup};
use super::scan::{collect_rule_components, PropertyScanResult, ScanRequest};
use super::shaper::{sort_by_name, sort_by_published_desc, truncate, without_deleted};
use super::usage::{build_usage_report, UsageReport};
use crate::api::query::MAX_SEARCH_SIZE;
use crate::api::ReactorService;
use crate::entities::{
    Company, DataElement, Library, Property, Rule, RuleComponent, TruncatedItem,
};

/// Page sizes and caps applied to every listing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisSettings {
    pub page_size: u32,
    /// Page size for rule listings in scans and classification
    pub rule_page_size: u32,
    pub max_pages: u32,
}

impl Default for AnalysisSettings {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            rule_page_size: RULE_SCAN_PAGE_SIZE,
            max_pages: DEFAULT_MAX_PAGES,
        }
    }
}

impl AnalysisSettings {
    fn listing(&self) -> PageLimits {
        PageLimits::new(self.page_size, self.max_pages)
    }

    fn rule_scan(&self) -> PageLimits {
        PageLimits::new(self.rule_page_size, self.max_pages)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompanyLookup {
    pub company_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropertyLookup {
    pub property_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleLookup {
    pub rule_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataElementLookup {
    pub property_id: String,
    pub data_element_name: String,
}

impl CompanyLookup {
    pub fn new(company_id: impl Into<String>) -> Self {
        Self {
            company_id: company_id.into(),
        }
    }
}

impl PropertyLookup {
    pub fn new(property_id: impl Into<String>) -> Self {
        Self {
            property_id: property_id.into(),
        }
    }
}

impl RuleLookup {
    pub fn new(rule_id: impl Into<String>) -> Self {
        Self {
            rule_id: rule_id.into(),
        }
    }
}

impl DataElementLookup {
    pub fn new(property_id: impl Into<String>, data_element_name: impl Into<String>) -> Self {
        Self {
            property_id: property_id.into(),
            data_element_name: data_element_name.into(),
        }
    }
}

/// Data elements referenced by one rule
#[derive(Debug, Clone, Serialize)]
pub struct RuleReferences {
    pub rule: TruncatedItem<Rule>,
    pub references: Vec<Reference>,
    /// Distinct referenced names, sorted
    pub data_element_names: Vec<String>,
}

/// Execution order of a property's rules
#[derive(Debug, Clone, Serialize)]
pub struct ExecutionOrderReport {
    pub property_id: String,
    pub order: ExecutionOrder,
    /// Rules whose components could not be fetched; classified by the fallback
    pub failures: Vec<PartialFailure>,
}

/// Read-only analysis over a [`ReactorService`]
pub struct Inspector<S> {
    service: S,
    settings: AnalysisSettings,
}

impl<S: ReactorService> Inspector<S> {
    pub fn new(service: S) -> Self {
        Self::with_settings(service, AnalysisSettings::default())
    }

    pub fn with_settings(service: S, settings: AnalysisSettings) -> Self {
        Self { service, settings }
    }

    pub fn service(&self) -> &S {
        &self.service
    }

    pub fn settings(&self) -> &AnalysisSettings {
        &self.settings
    }

    pub async fn list_companies(&self) -> AnalysisResult<Vec<TruncatedItem<Company>>> {
        let mut companies = listing::all_companies(&self.service, self.settings.listing()).await?;
        sort_by_name(&mut companies);
        Ok(companies)
    }

    pub async fn list_properties(
        &self,
        lookup: &CompanyLookup,
    ) -> AnalysisResult<Vec<TruncatedItem<Property>>> {
        require(&lookup.company_id, "company id")?;
        let properties =
            listing::all_properties(&self.service, &lookup.company_id, self.settings.listing())
                .await?;
        let mut properties = without_deleted(properties);
        sort_by_name(&mut properties);
        Ok(properties)
    }

    pub async fn list_rules(&self, lookup: &PropertyLookup) -> AnalysisResult<Vec<TruncatedItem<Rule>>> {
        require(&lookup.property_id, "property id")?;
        self.live_rules(&lookup.property_id, self.settings.listing()).await
    }

    pub async fn get_rule(&self, lookup: &RuleLookup) -> AnalysisResult<TruncatedItem<Rule>> {
        require(&lookup.rule_id, "rule id")?;
        let response = self.service.get_rule(&lookup.rule_id).await?;
        Ok(truncate(response.data))
    }

    /// Components of a rule, in the order the service lists them
    pub async fn list_rule_components(
        &self,
        lookup: &RuleLookup,
    ) -> AnalysisResult<Vec<TruncatedItem<RuleComponent>>> {
        require(&lookup.rule_id, "rule id")?;
        let components =
            listing::all_rule_components(&self.service, &lookup.rule_id, self.settings.listing())
                .await?;
        Ok(without_deleted(components))
    }

    pub async fn list_data_elements(
        &self,
        lookup: &PropertyLookup,
    ) -> AnalysisResult<Vec<TruncatedItem<DataElement>>> {
        require(&lookup.property_id, "property id")?;
        self.live_data_elements(&lookup.property_id).await
    }

    /// Publish history, newest first
    pub async fn library_history(
        &self,
        lookup: &PropertyLookup,
    ) -> AnalysisResult<Vec<TruncatedItem<Library>>> {
        require(&lookup.property_id, "property id")?;
        let libraries =
            listing::all_libraries(&self.service, &lookup.property_id, self.settings.listing())
                .await?;
        let mut libraries = without_deleted(libraries);
        sort_by_published_desc(&mut libraries);
        Ok(libraries)
    }

    /// Data elements a rule references through its component settings.
    pub async fn find_data_elements_used_in_rule(
        &self,
        lookup: &RuleLookup,
    ) -> AnalysisResult<RuleReferences> {
        let rule = self.get_rule(lookup).await?;
        let components = self.list_rule_components(lookup).await?;
        let references = extract_references(&components);

        let mut data_element_names: Vec<String> =
            references.iter().map(|r| r.match_name.clone()).collect();
        data_element_names.sort_by(|a, b| super::shaper::compare_names(a, b));
        data_element_names.dedup();

        debug!(rule_id = %rule.id, references = references.len(), "extracted rule references");
        Ok(RuleReferences {
            rule,
            references,
            data_element_names,
        })
    }

    /// Rules whose components reference a data element by name.
    pub async fn find_rules_using_data_element(
        &self,
        lookup: &DataElementLookup,
    ) -> AnalysisResult<ReverseLookup> {
        find_rules_referencing_data_element(
            &self.service,
            &lookup.property_id,
            &lookup.data_element_name,
            MAX_SEARCH_SIZE,
        )
        .await
    }

    pub async fn scan_property(&self, request: &ScanRequest) -> AnalysisResult<PropertyScanResult> {
        require(&request.property_id, "property id")?;
        info!(property_id = %request.property_id, "scanning property");

        let rules = self
            .live_rules(&request.property_id, self.settings.rule_scan())
            .await?;

        let data_elements = if request.include_data_elements {
            Some(self.live_data_elements(&request.property_id).await?)
        } else {
            None
        };

        let (rule_components, failures) = if request.include_rule_components {
            let (by_rule, failures) =
                collect_rule_components(&self.service, &rules, self.settings.listing()).await;
            let by_rule = by_rule
                .into_iter()
                .map(|(rule_id, components)| (rule_id, without_deleted(components)))
                .collect();
            (Some(by_rule), failures)
        } else {
            (None, Vec::new())
        };

        Ok(PropertyScanResult::new(
            &request.property_id,
            rules,
            rule_components,
            data_elements,
            failures,
        ))
    }

    /// Bucket the property's rules by inferred trigger phase.
    pub async fn execution_order(
        &self,
        lookup: &PropertyLookup,
    ) -> AnalysisResult<ExecutionOrderReport> {
        let scan = self
            .scan_property(&ScanRequest::new(&lookup.property_id).with_rule_components())
            .await?;
        let order = classify(&scan.rules_with_components());

        Ok(ExecutionOrderReport {
            property_id: scan.property_id,
            order,
            failures: scan.failures,
        })
    }

    /// Reference counts, unused data elements and unresolved references.
    pub async fn data_element_usage(&self, lookup: &PropertyLookup) -> AnalysisResult<UsageReport> {
        let scan = self
            .scan_property(
                &ScanRequest::new(&lookup.property_id)
                    .with_rule_components()
                    .with_data_elements(),
            )
            .await?;
        Ok(build_usage_report(&scan))
    }

    async fn live_rules(
        &self,
        property_id: &str,
        limits: PageLimits,
    ) -> AnalysisResult<Vec<TruncatedItem<Rule>>> {
        let rules = listing::all_rules(&self.service, property_id, limits).await?;
        let mut rules = without_deleted(rules);
        sort_by_name(&mut rules);
        Ok(rules)
    }

    async fn live_data_elements(
        &self,
        property_id: &str,
    ) -> AnalysisResult<Vec<TruncatedItem<DataElement>>> {
        let data_elements =
            listing::all_data_elements(&self.service, property_id, self.settings.listing()).await?;
        let mut data_elements = without_deleted(data_elements);
        sort_by_name(&mut data_elements);
        Ok(data_elements)
    }
}
