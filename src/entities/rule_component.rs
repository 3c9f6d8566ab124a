//! Rule component entity - one trigger, condition or action of a rule

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{lenient, Named, SoftDeletable};

/// Rule component attributes
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuleComponent {
    #[serde(deserialize_with = "lenient::or_default")]
    pub name: String,

    /// `{extension}::{category}::{action}`, e.g. `core::events::click`
    #[serde(deserialize_with = "lenient::or_default")]
    pub delegate_descriptor_id: String,

    /// Raw settings blob; usually a JSON-encoded string
    #[serde(skip_serializing_if = "Option::is_none")]
    pub settings: Option<Value>,

    #[serde(deserialize_with = "lenient::or_default")]
    pub order: i64,

    #[serde(deserialize_with = "lenient::or_default")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rule_order: Option<f64>,

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
}

impl RuleComponent {
    /// Settings as text; empty when absent or not a string
    pub fn settings_text(&self) -> &str {
        match &self.settings {
            Some(Value::String(s)) => s,
            _ => "",
        }
    }

    /// Whether this component is a rule trigger (`::events::` descriptor,
    /// any case)
    pub fn is_event(&self) -> bool {
        self.delegate_descriptor_id
            .to_ascii_lowercase()
            .contains("::events::")
    }

    pub fn descriptor(&self) -> Option<DelegateDescriptor> {
        DelegateDescriptor::parse(&self.delegate_descriptor_id)
    }
}

impl Named for RuleComponent {
    fn name(&self) -> &str {
        &self.name
    }
}

impl SoftDeletable for RuleComponent {
    fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }
}

/// Component category encoded in the delegate descriptor id
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DescriptorCategory {
    Events,
    Conditions,
    Actions,
    DataElements,
    Other,
}

impl std::str::FromStr for DescriptorCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "events" => Ok(DescriptorCategory::Events),
            "conditions" => Ok(DescriptorCategory::Conditions),
            "actions" => Ok(DescriptorCategory::Actions),
            "data-elements" | "data_elements" | "dataelements" => {
                Ok(DescriptorCategory::DataElements)
            }
            _ => Err(format!("Unknown descriptor category: {}", s)),
        }
    }
}

impl std::fmt::Display for DescriptorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DescriptorCategory::Events => write!(f, "events"),
            DescriptorCategory::Conditions => write!(f, "conditions"),
            DescriptorCategory::Actions => write!(f, "actions"),
            DescriptorCategory::DataElements => write!(f, "data-elements"),
            DescriptorCategory::Other => write!(f, "other"),
        }
    }
}

/// Parsed delegate descriptor id
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DelegateDescriptor {
    pub extension: String,
    pub category: DescriptorCategory,
    pub action: String,
}

impl DelegateDescriptor {
    /// Parse `{extension}::{category}::{action}`.
    ///
    /// Returns `None` when fewer than three segments are present. Extra
    /// segments are folded into `action`.
    pub fn parse(id: &str) -> Option<Self> {
        let mut parts = id.splitn(3, "::");
        let extension = parts.next().filter(|s| !s.is_empty())?;
        let category = parts.next()?;
        let action = parts.next().filter(|s| !s.is_empty())?;

        Some(Self {
            extension: extension.to_string(),
            category: category.parse().unwrap_or(DescriptorCategory::Other),
            action: action.to_string(),
        })
    }
}

impl std::fmt::Display for DelegateDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}::{}::{}", self.extension, self.category, self.action)
    }
}
