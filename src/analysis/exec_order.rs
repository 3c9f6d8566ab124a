//! Execution-order classification of a property's rules
//!
//! Each rule is bucketed by its trigger (`::events::`) components. Every
//! trigger is classified on its own, so a rule with several triggers can
//! land in several buckets. Classification reads the delegate descriptor id
//! only and never fails for a single rule.

use serde::Serialize;
use std::collections::{BTreeMap, HashSet};

use super::shaper::sort_by_name;
use crate::entities::{Rule, RuleComponent, TruncatedItem};

/// Custom-event category for rules without any trigger component
pub const UNCATEGORIZED: &str = "uncategorized";

/// A rule together with its components
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RuleWithComponents {
    pub rule: TruncatedItem<Rule>,
    pub components: Vec<TruncatedItem<RuleComponent>>,
}

impl RuleWithComponents {
    pub fn new(rule: TruncatedItem<Rule>, components: Vec<TruncatedItem<RuleComponent>>) -> Self {
        Self { rule, components }
    }

    /// Trigger components of the rule
    pub fn triggers(&self) -> impl Iterator<Item = &TruncatedItem<RuleComponent>> {
        self.components.iter().filter(|c| c.attributes.is_event())
    }
}

/// Bucket a rule is placed into
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Placement {
    LibraryLoaded,
    PageBottom,
    WindowLoaded,
    DomReady,
    DirectCall,
    CustomEvent(String),
}

/// Page-load phases in firing order
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PageLoadPhases {
    pub library_loaded: Vec<TruncatedItem<Rule>>,
    pub page_bottom: Vec<TruncatedItem<Rule>>,
    pub window_loaded: Vec<TruncatedItem<Rule>>,
    pub dom_ready: Vec<TruncatedItem<Rule>>,
}

/// Rules bucketed by inferred trigger phase or category
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ExecutionOrder {
    pub page_load: PageLoadPhases,
    pub direct_call: Vec<TruncatedItem<Rule>>,
    pub custom_events: BTreeMap<String, Vec<TruncatedItem<Rule>>>,
    /// Every rule passed in, disabled ones included, sorted by name
    pub all: Vec<TruncatedItem<Rule>>,
}

impl ExecutionOrder {
    fn bucket_mut(&mut self, placement: &Placement) -> &mut Vec<TruncatedItem<Rule>> {
        match placement {
            Placement::LibraryLoaded => &mut self.page_load.library_loaded,
            Placement::PageBottom => &mut self.page_load.page_bottom,
            Placement::WindowLoaded => &mut self.page_load.window_loaded,
            Placement::DomReady => &mut self.page_load.dom_ready,
            Placement::DirectCall => &mut self.direct_call,
            Placement::CustomEvent(category) => {
                self.custom_events.entry(category.clone()).or_default()
            }
        }
    }

    /// All buckets with a display label, in firing order
    pub fn buckets(&self) -> Vec<(String, &[TruncatedItem<Rule>])> {
        let mut buckets: Vec<(String, &[TruncatedItem<Rule>])> = vec![
            ("Library Loaded".to_string(), self.page_load.library_loaded.as_slice()),
            ("Page Bottom".to_string(), self.page_load.page_bottom.as_slice()),
            ("DOM Ready".to_string(), self.page_load.dom_ready.as_slice()),
            ("Window Loaded".to_string(), self.page_load.window_loaded.as_slice()),
            ("Direct Call".to_string(), self.direct_call.as_slice()),
        ];
        for (category, rules) in &self.custom_events {
            buckets.push((format!("Custom Event: {category}"), rules.as_slice()));
        }
        buckets
    }

    /// Number of distinct rules placed in any bucket
    pub fn classified_count(&self) -> usize {
        self.buckets()
            .iter()
            .flat_map(|(_, rules)| rules.iter().map(|r| r.id.as_str()))
            .collect::<HashSet<_>>()
            .len()
    }
}

/// Placement for a rule that has no trigger components
pub trait FallbackStrategy {
    fn place(&self, rule: &TruncatedItem<Rule>) -> Placement;
}

/// Rules named like a page view go to page bottom; the rest are uncategorized.
#[derive(Debug, Clone, Copy, Default)]
pub struct PageNameHeuristic;

impl FallbackStrategy for PageNameHeuristic {
    fn place(&self, rule: &TruncatedItem<Rule>) -> Placement {
        if rule.attributes.name.to_lowercase().contains("page") {
            Placement::PageBottom
        } else {
            Placement::CustomEvent(UNCATEGORIZED.to_string())
        }
    }
}

/// Descriptor substrings that pin a trigger to a fixed bucket, checked in order
const TRIGGER_RULES: &[(&[&str], Placement)] = &[
    (&["library-loaded", "library_loaded"], Placement::LibraryLoaded),
    (&["page-bottom", "page_bottom"], Placement::PageBottom),
    (
        &["window-loaded", "window_loaded", "window.loaded"],
        Placement::WindowLoaded,
    ),
    (&["dom-ready", "dom_ready", "domready"], Placement::DomReady),
    (&["direct-call", "direct_call"], Placement::DirectCall),
];

/// Keyword table for custom-event categories, checked in order
const EVENT_CATEGORIES: &[(&[&str], &str)] = &[
    (&["click"], "click"),
    (&["hover"], "hover"),
    (&["change"], "change"),
    (&["submit"], "submit"),
    (&["keypress", "keydown", "keyup"], "keyboard"),
    (&["focus", "blur"], "focus"),
    (&["scroll"], "scroll"),
    (&["media"], "media"),
    (&["custom"], "custom"),
    (&["time"], "time-based"),
    (&["enters-viewport", "element-exists"], "element-based"),
];

const OTHER_EVENTS: &str = "other";

fn contains_any(haystack: &str, needles: &[&str]) -> bool {
    needles.iter().any(|n| haystack.contains(n))
}

/// Custom-event category for a descriptor id
pub fn event_category(descriptor_id: &str) -> &'static str {
    let descriptor = descriptor_id.to_lowercase();
    EVENT_CATEGORIES
        .iter()
        .find(|(keywords, _)| contains_any(&descriptor, keywords))
        .map(|(_, category)| *category)
        .unwrap_or(OTHER_EVENTS)
}

/// Placement for one trigger component
pub fn classify_trigger(descriptor_id: &str) -> Placement {
    let descriptor = descriptor_id.to_lowercase();
    TRIGGER_RULES
        .iter()
        .find(|(keywords, _)| contains_any(&descriptor, keywords))
        .map(|(_, placement)| placement.clone())
        .unwrap_or_else(|| Placement::CustomEvent(event_category(&descriptor).to_string()))
}

/// Classify with the default [`PageNameHeuristic`] fallback.
pub fn classify(rules: &[RuleWithComponents]) -> ExecutionOrder {
    classify_with(rules, &PageNameHeuristic)
}

/// Classify rules into execution-order buckets.
///
/// Disabled rules are skipped, but still listed in `all`. A rule appears at
/// most once per bucket. Every bucket is sorted by rule name.
pub fn classify_with(rules: &[RuleWithComponents], fallback: &dyn FallbackStrategy) -> ExecutionOrder {
    let mut order = ExecutionOrder::default();

    for entry in rules {
        if entry.rule.attributes.is_disabled() {
            continue;
        }

        let mut placements: Vec<Placement> = entry
            .triggers()
            .map(|trigger| classify_trigger(&trigger.attributes.delegate_descriptor_id))
            .collect();
        if placements.is_empty() {
            placements.push(fallback.place(&entry.rule));
        }

        for placement in placements {
            let bucket = order.bucket_mut(&placement);
            if !bucket.iter().any(|r| r.id == entry.rule.id) {
                bucket.push(entry.rule.clone());
            }
        }
    }

    sort_by_name(&mut order.page_load.library_loaded);
    sort_by_name(&mut order.page_load.page_bottom);
    sort_by_name(&mut order.page_load.window_loaded);
    sort_by_name(&mut order.page_load.dom_ready);
    sort_by_name(&mut order.direct_call);
    for bucket in order.custom_events.values_mut() {
        sort_by_name(bucket);
    }

    order.all = rules.iter().map(|r| r.rule.clone()).collect();
    sort_by_name(&mut order.all);

    order
}
