//! Entity type definitions
//!
//! Every record the remote service returns is a JSON:API resource
//! (`{id, type, attributes, relationships, links, meta}`). The attribute
//! payloads are modelled per resource kind:
//!
//! **Scope:**
//! - [`Company`] - Organisation that owns properties
//! - [`Property`] - Root scope for everything below
//!
//! **Configuration graph:**
//! - [`Rule`] - Event-driven automation unit
//! - [`RuleComponent`] - Trigger, condition or action attached to a rule
//! - [`DataElement`] - Named, reusable value referenced from settings
//! - [`Library`] - Published build of a property
//!
//! Callers never see the raw resource: [`TruncatedItem`] is the shaped
//! `{id, type, attributes}` projection every list and search returns.

pub mod data_element;
pub mod lenient;
pub mod library;
pub mod property;
pub mod rule;
pub mod rule_component;

pub use data_element::DataElement;
pub use library::{Library, LibraryState};
pub use property::{Company, Property};
pub use rule::Rule;
pub use rule_component::{DelegateDescriptor, DescriptorCategory, RuleComponent};

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A JSON:API resource object as returned by the remote service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Resource<A> {
    pub id: String,

    #[serde(rename = "type")]
    pub resource_type: String,

    pub attributes: A,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relationships: Option<Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub links: Option<Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<Value>,
}

/// Shaped `{id, type, attributes}` projection of a [`Resource`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TruncatedItem<A> {
    pub id: String,

    #[serde(rename = "type")]
    pub resource_type: String,

    pub attributes: A,
}

/// A search hit or other record whose attribute shape depends on its type
pub type SearchItem = Resource<Value>;

/// Shaped search hit
pub type ShapedItem = TruncatedItem<Value>;

/// Attribute payloads that carry a display name
pub trait Named {
    fn name(&self) -> &str;
}

/// Attribute payloads that can be soft-deleted on the remote side
pub trait SoftDeletable {
    fn is_deleted(&self) -> bool;
}

impl Named for Value {
    fn name(&self) -> &str {
        self.get("name").and_then(Value::as_str).unwrap_or_default()
    }
}

impl SoftDeletable for Value {
    fn is_deleted(&self) -> bool {
        self.get("deleted_at").is_some_and(is_truthy)
    }
}

impl<A: Named> TruncatedItem<A> {
    pub fn name(&self) -> &str {
        self.attributes.name()
    }
}

/// JavaScript-style truthiness of a JSON value.
///
/// The remote service uses `null`, `""` and `false` interchangeably for
/// "not set", so flags such as `deleted_at` are tested this way.
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0 && !f.is_nan()),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}
