//! Static extraction of data-element references from rule component settings
//!
//! Two syntaxes embed a data element by name:
//!
//! - `_satellite.getVar('NAME')` / `_satellite.getVar("NAME")` in custom code
//! - `%NAME%` in form-field settings
//!
//! References are free text; nothing guarantees a data element with that
//! name exists.

use lazy_static::lazy_static;
use regex::Regex;
use serde::Serialize;
use serde_json::Value;
use std::collections::HashSet;

use crate::entities::{RuleComponent, TruncatedItem};

lazy_static! {
    // Group 1: getVar argument (quotes may be backslash-escaped inside JSON text).
    // Group 2: percent token; must not start with whitespace or CSS-ish punctuation.
    static ref REFERENCE_PATTERN: Regex = Regex::new(
        r#"_satellite\.getVar\(\s*\\?['"]([^'"\\]+)\\?['"]\s*\)|%([A-Za-z0-9_$][^%\r\n"'<>;{}]*)%"#
    )
    .unwrap();
}

/// One data-element reference found in a rule component
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Reference {
    pub component_id: String,
    /// The referenced data element name
    pub match_name: String,
    /// Name of the component the reference was found in
    pub type_name: String,
    pub delegate_descriptor_id: String,
}

/// All data-element names referenced in a piece of text, in order of appearance
pub fn referenced_names(text: &str) -> Vec<&str> {
    REFERENCE_PATTERN
        .captures_iter(text)
        .filter_map(|caps| caps.get(1).or_else(|| caps.get(2)))
        .map(|m| m.as_str())
        .collect()
}

/// Extract references from every component, deduplicated by value.
///
/// Order of first appearance is preserved. Components whose settings are
/// absent, non-string or unparseable contribute whatever the raw text
/// yields; none of them fail the batch.
pub fn extract_references(components: &[TruncatedItem<RuleComponent>]) -> Vec<Reference> {
    let mut seen = HashSet::new();
    let mut references = Vec::new();

    for component in components {
        for name in component_reference_names(&component.attributes) {
            let reference = Reference {
                component_id: component.id.clone(),
                match_name: name,
                type_name: component.attributes.name.clone(),
                delegate_descriptor_id: component.attributes.delegate_descriptor_id.clone(),
            };
            if seen.insert(reference.clone()) {
                references.push(reference);
            }
        }
    }

    references
}

/// Names referenced by a single component's settings.
fn component_reference_names(component: &RuleComponent) -> Vec<String> {
    settings_text_reference_names(component.settings_text())
}

/// Names referenced by a settings value that may be stored either as JSON
/// text or as an already-decoded object.
pub(crate) fn settings_reference_names(settings: Option<&Value>) -> Vec<String> {
    match settings {
        Some(Value::String(text)) => settings_text_reference_names(text),
        Some(value @ (Value::Object(_) | Value::Array(_))) => leaf_reference_names(value),
        _ => Vec::new(),
    }
}

/// Settings that decode as JSON are scanned leaf by leaf so that escaped
/// quotes inside string values do not hide a `getVar` call.
fn settings_text_reference_names(text: &str) -> Vec<String> {
    if text.is_empty() {
        return Vec::new();
    }

    match serde_json::from_str::<Value>(text) {
        Ok(value @ (Value::Object(_) | Value::Array(_))) => leaf_reference_names(&value),
        Ok(Value::String(inner)) => referenced_names(&inner)
            .into_iter()
            .map(str::to_string)
            .collect(),
        _ => referenced_names(text).into_iter().map(str::to_string).collect(),
    }
}

fn leaf_reference_names(value: &Value) -> Vec<String> {
    let mut leaves = Vec::new();
    collect_string_leaves(value, &mut leaves);
    leaves
        .iter()
        .flat_map(|leaf| referenced_names(leaf))
        .map(str::to_string)
        .collect()
}

fn collect_string_leaves<'a>(value: &'a Value, out: &mut Vec<&'a str>) {
    match value {
        Value::String(s) => out.push(s),
        Value::Array(items) => items.iter().for_each(|v| collect_string_leaves(v, out)),
        Value::Object(map) => map.values().for_each(|v| collect_string_leaves(v, out)),
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn component(id: &str, name: &str, descriptor: &str, settings: &str) -> TruncatedItem<RuleComponent> {
        TruncatedItem {
            id: id.to_string(),
            resource_type: "rule_components".to_string(),
            attributes: RuleComponent {
                name: name.to_string(),
                delegate_descriptor_id: descriptor.to_string(),
                settings: Some(json!(settings)),
                ..Default::default()
            },
        }
    }

    #[test]
    fn test_get_var_single_quotes() {
        let refs = extract_references(&[component(
            "RC1",
            "Custom Code",
            "core::actions::custom-code",
            "_satellite.getVar('cartTotal')",
        )]);
        assert_eq!(refs.len(), 1);
        assert_eq!(refs[0].match_name, "cartTotal");
        assert_eq!(refs[0].component_id, "RC1");
        assert_eq!(refs[0].type_name, "Custom Code");
        assert_eq!(refs[0].delegate_descriptor_id, "core::actions::custom-code");
    }

    #[test]
    fn test_percent_syntax() {
        let refs = extract_references(&[component(
            "RC2",
            "Set Variables",
            "adobe-analytics::actions::set-variables",
            "%userId%",
        )]);
        assert_eq!(refs.len(), 1);
        assert_eq!(refs[0].match_name, "userId");
    }

    #[test]
    fn test_all_matches_in_one_component() {
        let refs = extract_references(&[component(
            "RC3",
            "Custom Code",
            "core::actions::custom-code",
            "var a = _satellite.getVar(\"pageName\"); var b = '%Site Section%'; _satellite.getVar('pageName');",
        )]);
        let names: Vec<&str> = refs.iter().map(|r| r.match_name.as_str()).collect();
        assert_eq!(names, vec!["pageName", "Site Section"]);
    }

    #[test]
    fn test_json_encoded_settings_are_scanned_by_leaf() {
        let settings = json!({
            "source": "s.eVar1 = _satellite.getVar(\"visitorType\");",
            "trackerProperties": {"eVars": [{"value": "%pageName%"}]}
        })
        .to_string();
        let refs = extract_references(&[component("RC4", "AA", "core::actions::custom-code", &settings)]);
        let names: Vec<&str> = refs.iter().map(|r| r.match_name.as_str()).collect();
        assert_eq!(names.len(), 2);
        assert!(names.contains(&"visitorType"));
        assert!(names.contains(&"pageName"));
    }

    #[test]
    fn test_escaped_quotes_in_raw_text() {
        assert_eq!(
            referenced_names(r#"{"source":"_satellite.getVar(\"cart id\")"#),
            vec!["cart id"]
        );
    }

    #[test]
    fn test_percentages_are_not_references() {
        assert!(referenced_names("width: 100%; height: 50%").is_empty());
    }

    #[test]
    fn test_duplicates_collapse_across_components() {
        let c = component("RC1", "Code", "core::actions::custom-code", "%a% %a% %b%");
        let refs = extract_references(&[c.clone(), c]);
        assert_eq!(refs.len(), 2);

        let unique: HashSet<&Reference> = refs.iter().collect();
        assert_eq!(unique.len(), refs.len());
    }

    #[test]
    fn test_same_name_in_different_components_is_kept() {
        let refs = extract_references(&[
            component("RC1", "Code", "core::actions::custom-code", "%a%"),
            component("RC2", "Code", "core::actions::custom-code", "%a%"),
        ]);
        assert_eq!(refs.len(), 2);
    }

    #[test]
    fn test_missing_or_non_string_settings() {
        let mut absent = component("RC1", "X", "core::events::click", "");
        absent.attributes.settings = None;
        let mut object = component("RC2", "Y", "core::events::click", "");
        object.attributes.settings = Some(json!({"source": "%hidden%"}));

        assert!(extract_references(&[absent, object]).is_empty());
    }

    #[test]
    fn test_idempotent() {
        let components = vec![
            component("RC1", "Code", "core::actions::custom-code", "_satellite.getVar('x') %y%"),
            component("RC2", "Cond", "core::conditions::value-comparison", "{\"leftOperand\":\"%z%\"}"),
        ];
        assert_eq!(extract_references(&components), extract_references(&components));
    }

    #[test]
    fn test_settings_value_in_either_form() {
        let object = json!({"source": "return _satellite.getVar('cartTotal') * 2;"});
        assert_eq!(settings_reference_names(Some(&object)), vec!["cartTotal".to_string()]);

        let text = json!("{\"path\":\"%pageName%\"}");
        assert_eq!(settings_reference_names(Some(&text)), vec!["pageName".to_string()]);

        assert!(settings_reference_names(None).is_empty());
        assert!(settings_reference_names(Some(&json!(42))).is_empty());
    }
}
