//! Relationship and execution-order analysis
//!
//! - [`pagination`] walks paginated listings to completion
//! - [`references`] extracts data-element references from component settings
//! - [`resolver`] maps a data element back to the rules that reference it
//! - [`exec_order`] buckets rules by inferred trigger phase
//! - [`shaper`] projects records to `{id, type, attributes}` and sorts them
//!
//! [`Inspector`] ties these together over a [`crate::api::ReactorService`].

pub mod error;
pub mod exec_order;
pub mod inspector;
pub mod listing;
pub mod pagination;
pub mod references;
pub mod resolver;
pub mod scan;
pub mod shaper;
pub mod usage;

#[cfg(test)]
pub(crate) mod testing;

pub use error::{require, AnalysisError, AnalysisResult, FailureStage, PartialFailure};
pub use exec_order::{
    classify, classify_with, ExecutionOrder, FallbackStrategy, PageLoadPhases, PageNameHeuristic,
    Placement, RuleWithComponents,
};
pub use inspector::{
    AnalysisSettings, CompanyLookup, DataElementLookup, ExecutionOrderReport, Inspector,
    PropertyLookup, RuleLookup, RuleReferences,
};
pub use pagination::{fetch_all_pages, Page, PageLimits};
pub use references::{extract_references, Reference};
pub use resolver::{find_rules_referencing_data_element, ReverseLookup};
pub use scan::{PropertyScanResult, ScanRequest, ScanSummary};
pub use usage::{DataElementUsage, UnresolvedReference, UsageReport};
