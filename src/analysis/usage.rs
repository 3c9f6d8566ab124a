//! Data-element usage report built from a full property scan

use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet, HashMap};

use super::error::PartialFailure;
use super::references::settings_reference_names;
use super::scan::PropertyScanResult;
use super::shaper::compare_names;

/// References to one data element
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DataElementUsage {
    pub id: String,
    pub name: String,
    /// Number of components and other data elements referencing the element
    pub reference_count: usize,
    /// Rules owning the referencing components
    pub rule_ids: Vec<String>,
    /// Names of data elements whose settings reference this one
    pub referenced_by_data_elements: Vec<String>,
}

/// A referenced name that matches no data element of the property
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UnresolvedReference {
    pub name: String,
    pub component_ids: Vec<String>,
    pub rule_ids: Vec<String>,
    pub data_element_ids: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct UsageReport {
    pub property_id: String,
    pub usage: Vec<DataElementUsage>,
    /// Names of data elements nothing references
    pub unused: Vec<String>,
    pub unresolved: Vec<UnresolvedReference>,
    pub failures: Vec<PartialFailure>,
}

#[derive(Default)]
struct Hits {
    components: BTreeSet<String>,
    rules: BTreeSet<String>,
    data_elements: BTreeSet<(String, String)>,
}

impl Hits {
    fn count(&self) -> usize {
        self.components.len() + self.data_elements.len()
    }
}

/// Cross-reference a scan's data elements with the references found in its
/// components and in the settings of other data elements. Name matching is
/// exact and a data element referencing itself does not count. A scan
/// without data elements reports every reference as unresolved.
pub fn build_usage_report(scan: &PropertyScanResult) -> UsageReport {
    let owner_of: HashMap<&str, &str> = scan
        .rule_components
        .iter()
        .flatten()
        .flat_map(|(rule_id, components)| {
            components
                .iter()
                .map(move |c| (c.id.as_str(), rule_id.as_str()))
        })
        .collect();

    let mut hits: BTreeMap<String, Hits> = BTreeMap::new();
    for reference in &scan.references {
        let entry = hits.entry(reference.match_name.clone()).or_default();
        entry.components.insert(reference.component_id.clone());
        if let Some(rule_id) = owner_of.get(reference.component_id.as_str()) {
            entry.rules.insert((*rule_id).to_string());
        }
    }

    let data_elements = scan.data_elements.as_deref().unwrap_or_default();
    for de in data_elements {
        for name in settings_reference_names(de.attributes.settings.as_ref()) {
            if name == de.attributes.name {
                continue;
            }
            hits.entry(name)
                .or_default()
                .data_elements
                .insert((de.attributes.name.clone(), de.id.clone()));
        }
    }

    let mut usage: Vec<DataElementUsage> = data_elements
        .iter()
        .map(|de| {
            let found = hits.get(&de.attributes.name);
            DataElementUsage {
                id: de.id.clone(),
                name: de.attributes.name.clone(),
                reference_count: found.map_or(0, Hits::count),
                rule_ids: found
                    .map(|h| h.rules.iter().cloned().collect())
                    .unwrap_or_default(),
                referenced_by_data_elements: found
                    .map(|h| h.data_elements.iter().map(|(name, _)| name.clone()).collect())
                    .unwrap_or_default(),
            }
        })
        .collect();
    usage.sort_by(|a, b| compare_names(&a.name, &b.name));

    let unused = usage
        .iter()
        .filter(|u| u.reference_count == 0)
        .map(|u| u.name.clone())
        .collect();

    let known: BTreeSet<&str> = data_elements
        .iter()
        .map(|de| de.attributes.name.as_str())
        .collect();
    let mut unresolved: Vec<UnresolvedReference> = hits
        .iter()
        .filter(|(name, _)| !known.contains(name.as_str()))
        .map(|(name, h)| UnresolvedReference {
            name: name.clone(),
            component_ids: h.components.iter().cloned().collect(),
            rule_ids: h.rules.iter().cloned().collect(),
            data_element_ids: h.data_elements.iter().map(|(_, id)| id.clone()).collect(),
        })
        .collect();
    unresolved.sort_by(|a, b| compare_names(&a.name, &b.name));

    UsageReport {
        property_id: scan.property_id.clone(),
        usage,
        unused,
        unresolved,
        failures: scan.failures.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::testing::{component, data_element, rule};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn scan() -> PropertyScanResult {
        let mut by_rule = BTreeMap::new();
        by_rule.insert(
            "RL1".to_string(),
            vec![
                component("RC1", "core::actions::custom-code", "_satellite.getVar('cartTotal')"),
                component("RC2", "adobe-analytics::actions::set-variables", "%cartTotal% %cartTotl%"),
            ],
        );
        by_rule.insert(
            "RL2".to_string(),
            vec![component("RC3", "core::conditions::value-comparison", "%pageName%")],
        );

        PropertyScanResult::new(
            "PR1",
            vec![rule("RL1", "Checkout"), rule("RL2", "Pageview")],
            Some(by_rule),
            Some(vec![
                data_element("DE1", "cartTotal"),
                data_element("DE2", "pageName"),
                data_element("DE3", "legacyId"),
            ]),
            vec![],
        )
    }

    #[test]
    fn test_counts_per_data_element() {
        let report = build_usage_report(&scan());
        let cart = report.usage.iter().find(|u| u.name == "cartTotal").unwrap();
        assert_eq!(cart.reference_count, 2);
        assert_eq!(cart.rule_ids, vec!["RL1".to_string()]);

        let page = report.usage.iter().find(|u| u.name == "pageName").unwrap();
        assert_eq!(page.rule_ids, vec!["RL2".to_string()]);
    }

    #[test]
    fn test_unused_and_unresolved() {
        let report = build_usage_report(&scan());
        assert_eq!(report.unused, vec!["legacyId".to_string()]);
        assert_eq!(report.unresolved.len(), 1);
        assert_eq!(report.unresolved[0].name, "cartTotl");
        assert_eq!(report.unresolved[0].component_ids, vec!["RC2".to_string()]);
    }

    #[test]
    fn test_usage_sorted_by_name() {
        let report = build_usage_report(&scan());
        let names: Vec<&str> = report.usage.iter().map(|u| u.name.as_str()).collect();
        assert_eq!(names, vec!["cartTotal", "legacyId", "pageName"]);
    }

    #[test]
    fn test_reference_from_another_data_element_counts() {
        let mut wrapper = data_element("DE1", "cartWrapper");
        wrapper.attributes.settings =
            Some(json!({"source": "return _satellite.getVar('cartTotal') * 2;"}));
        let mut selfish = data_element("DE3", "loop");
        selfish.attributes.settings = Some(json!({"source": "%loop% %cartTax%"}));

        let scan = PropertyScanResult::new(
            "PR1",
            vec![],
            Some(BTreeMap::new()),
            Some(vec![wrapper, data_element("DE2", "cartTotal"), selfish]),
            vec![],
        );
        let report = build_usage_report(&scan);

        assert_eq!(report.unused, vec!["cartWrapper".to_string(), "loop".to_string()]);
        let total = report.usage.iter().find(|u| u.name == "cartTotal").unwrap();
        assert_eq!(total.reference_count, 1);
        assert!(total.rule_ids.is_empty());
        assert_eq!(total.referenced_by_data_elements, vec!["cartWrapper".to_string()]);

        assert_eq!(report.unresolved.len(), 1);
        assert_eq!(report.unresolved[0].name, "cartTax");
        assert!(report.unresolved[0].component_ids.is_empty());
        assert_eq!(report.unresolved[0].data_element_ids, vec!["DE3".to_string()]);
    }
}
