//! Library entity - a build of a property moving through the publishing flow

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{lenient, Named, SoftDeletable};

/// Library publishing state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum LibraryState {
    #[default]
    Development,
    Submitted,
    Approved,
    Rejected,
    Published,
    #[serde(other)]
    Unknown,
}

impl std::fmt::Display for LibraryState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LibraryState::Development => write!(f, "development"),
            LibraryState::Submitted => write!(f, "submitted"),
            LibraryState::Approved => write!(f, "approved"),
            LibraryState::Rejected => write!(f, "rejected"),
            LibraryState::Published => write!(f, "published"),
            LibraryState::Unknown => write!(f, "unknown"),
        }
    }
}

/// Library attributes
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Library {
    #[serde(deserialize_with = "lenient::or_default")]
    pub name: String,

    #[serde(deserialize_with = "lenient::or_default")]
    pub state: LibraryState,

    #[serde(deserialize_with = "lenient::timestamp")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub published_at: Option<DateTime<Utc>>,

    #[serde(deserialize_with = "lenient::or_default")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub build_required: Option<bool>,

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

impl Named for Library {
    fn name(&self) -> &str {
        &self.name
    }
}

impl SoftDeletable for Library {
    fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_library_state_parsing() {
        let lib: Library =
            serde_json::from_str(r#"{"name": "Release 12", "state": "published"}"#).unwrap();
        assert_eq!(lib.state, LibraryState::Published);
        assert!(lib.published_at.is_none());
    }

    #[test]
    fn test_unknown_state_is_tolerated() {
        let lib: Library =
            serde_json::from_str(r#"{"name": "X", "state": "something_new"}"#).unwrap();
        assert_eq!(lib.state, LibraryState::Unknown);
    }
}
