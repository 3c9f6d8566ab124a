//! Data element entity - named, reusable value referenced from settings

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{lenient, Named, SoftDeletable};

/// Data element attributes
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DataElement {
    #[serde(deserialize_with = "lenient::or_default")]
    pub name: String,

    #[serde(deserialize_with = "lenient::or_default")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delegate_descriptor_id: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub settings: Option<Value>,

    #[serde(deserialize_with = "lenient::or_default")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,

    #[serde(deserialize_with = "lenient::or_default")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_value: Option<String>,

    #[serde(deserialize_with = "lenient::or_default")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub storage_duration: Option<String>,

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

impl Named for DataElement {
    fn name(&self) -> &str {
        &self.name
    }
}

impl SoftDeletable for DataElement {
    fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }
}
