//! Rule entity - event-driven automation unit of a property

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{lenient, Named, SoftDeletable};

/// Rule attributes
///
/// Components are not embedded; they are listed per rule.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Rule {
    #[serde(deserialize_with = "lenient::or_default")]
    pub name: String,

    /// `None` when the service omits the flag; only an explicit `false`
    /// disables a rule.
    #[serde(deserialize_with = "lenient::or_default")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,

    #[serde(deserialize_with = "lenient::or_default")]
    pub revision_number: i64,

    #[serde(deserialize_with = "lenient::deletion")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deleted_at: Option<DateTime<Utc>>,

    #[serde(deserialize_with = "lenient::timestamp")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,

    #[serde(deserialize_with = "lenient::timestamp")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,

    #[serde(deserialize_with = "lenient::or_default")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub published: Option<bool>,

    #[serde(deserialize_with = "lenient::or_default")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dirty: Option<bool>,
}

impl Rule {
    /// A rule is disabled only when the flag is explicitly `false`
    pub fn is_disabled(&self) -> bool {
        self.enabled == Some(false)
    }
}

impl Named for Rule {
    fn name(&self) -> &str {
        &self.name
    }
}

impl SoftDeletable for Rule {
    fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_attributes_use_defaults() {
        let rule: Rule = serde_json::from_str(r#"{"name": "Click Tracking"}"#).unwrap();
        assert_eq!(rule.name, "Click Tracking");
        assert_eq!(rule.enabled, None);
        assert!(!rule.is_disabled());
        assert!(!rule.is_deleted());
    }

    #[test]
    fn test_explicit_false_disables() {
        let rule: Rule = serde_json::from_str(r#"{"name": "Old", "enabled": false}"#).unwrap();
        assert!(rule.is_disabled());
    }

    #[test]
    fn test_deleted_at_parses() {
        let rule: Rule = serde_json::from_str(
            r#"{"name": "Gone", "enabled": true, "deleted_at": "2024-03-01T12:00:00.000Z"}"#,
        )
        .unwrap();
        assert!(rule.is_deleted());
        assert!(!rule.is_disabled());
    }
}
