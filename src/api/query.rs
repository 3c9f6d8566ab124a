//! Full-text search query builder
//!
//! The search endpoint takes a body of the form:
//!
//! ```json
//! {"data": {"from": 0, "size": 100,
//!           "query": {"attributes.settings": {"value": "%cartTotal%"}},
//!           "resource_types": ["rule_components"]}}
//! ```

use serde::Serialize;
use serde_json::{json, Value};
use std::collections::BTreeMap;

/// Maximum page size the search endpoint accepts
pub const MAX_SEARCH_SIZE: u32 = 100;

/// Constraint on a single field
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldFilter {
    pub value: Value,
}

impl FieldFilter {
    /// Match the field against a value
    pub fn value(value: impl Into<Value>) -> Self {
        Self {
            value: value.into(),
        }
    }
}

/// A search request
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchQuery {
    pub from: u32,
    pub size: u32,
    pub query: BTreeMap<String, FieldFilter>,
    pub resource_types: Vec<String>,
}

impl Default for SearchQuery {
    fn default() -> Self {
        Self {
            from: 0,
            size: MAX_SEARCH_SIZE,
            query: BTreeMap::new(),
            resource_types: Vec::new(),
        }
    }
}

impl SearchQuery {
    pub fn new() -> Self {
        Self::default()
    }

    /// Restrict results to a resource type (e.g. `rule_components`)
    pub fn resource_type(mut self, resource_type: impl Into<String>) -> Self {
        self.resource_types.push(resource_type.into());
        self
    }

    /// Add a field constraint
    pub fn filter(mut self, field: impl Into<String>, filter: FieldFilter) -> Self {
        self.query.insert(field.into(), filter);
        self
    }

    /// Shorthand for `filter(field, FieldFilter::value(value))`
    pub fn field(self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.filter(field, FieldFilter::value(value))
    }

    /// Set the result window size, clamped to what the endpoint accepts
    pub fn size(mut self, size: u32) -> Self {
        self.size = size.clamp(1, MAX_SEARCH_SIZE);
        self
    }

    /// Skip the first `from` hits
    pub fn offset(mut self, from: u32) -> Self {
        self.from = from;
        self
    }

    /// The value a field is matched against, if any
    pub fn value_of(&self, field: &str) -> Option<&Value> {
        self.query.get(field).map(|f| &f.value)
    }

    /// The request body, wrapped in the JSON:API `data` envelope
    pub fn to_body(&self) -> Value {
        json!({ "data": self })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_body_shape() {
        let query = SearchQuery::new()
            .resource_type("rule_components")
            .field("attributes.revision_number", 0)
            .field("attributes.settings", "%cartTotal%");

        assert_eq!(
            query.to_body(),
            json!({
                "data": {
                    "from": 0,
                    "size": 100,
                    "query": {
                        "attributes.revision_number": {"value": 0},
                        "attributes.settings": {"value": "%cartTotal%"}
                    },
                    "resource_types": ["rule_components"]
                }
            })
        );
    }

    #[test]
    fn test_size_is_clamped() {
        assert_eq!(SearchQuery::new().size(5000).size, MAX_SEARCH_SIZE);
        assert_eq!(SearchQuery::new().size(0).size, 1);
    }
}
