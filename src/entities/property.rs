//! Company and property entities - the scopes everything else lives under

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{lenient, Named, SoftDeletable};

/// Company attributes
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Company {
    #[serde(deserialize_with = "lenient::or_default")]
    pub name: String,

    #[serde(deserialize_with = "lenient::or_default")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub org_id: Option<String>,

    #[serde(deserialize_with = "lenient::timestamp")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

impl Named for Company {
    fn name(&self) -> &str {
        &self.name
    }
}

/// Property attributes
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Property {
    #[serde(deserialize_with = "lenient::or_default")]
    pub name: String,

    /// `web`, `mobile` or `edge`
    #[serde(deserialize_with = "lenient::or_default")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub platform: Option<String>,

    #[serde(deserialize_with = "lenient::or_default")]
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub domains: Vec<String>,

    #[serde(deserialize_with = "lenient::or_default")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,

    #[serde(deserialize_with = "lenient::timestamp")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,

    #[serde(deserialize_with = "lenient::timestamp")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,

    #[serde(deserialize_with = "lenient::deletion")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deleted_at: Option<DateTime<Utc>>,
}

impl Named for Property {
    fn name(&self) -> &str {
        &self.name
    }
}

impl SoftDeletable for Property {
    fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }
}
