//! Result shaping: truncation to `{id, type, attributes}` and deterministic sorts

use std::cmp::Ordering;

use crate::entities::{Library, Named, Resource, SoftDeletable, TruncatedItem};

/// Drop relationship/link/meta blocks from a resource
pub fn truncate<A>(resource: Resource<A>) -> TruncatedItem<A> {
    TruncatedItem {
        id: resource.id,
        resource_type: resource.resource_type,
        attributes: resource.attributes,
    }
}

pub fn truncate_all<A>(resources: Vec<Resource<A>>) -> Vec<TruncatedItem<A>> {
    resources.into_iter().map(truncate).collect()
}

/// Remove soft-deleted records; the service returns them in listings and search
pub fn without_deleted<A: SoftDeletable>(items: Vec<TruncatedItem<A>>) -> Vec<TruncatedItem<A>> {
    items
        .into_iter()
        .filter(|item| !item.attributes.is_deleted())
        .collect()
}

/// Name ordering used for every sorted listing.
///
/// Approximates a locale-aware comparison: names compare case-insensitively
/// first; on a case-only difference, lowercase sorts before uppercase.
pub fn compare_names(a: &str, b: &str) -> Ordering {
    let folded = a.to_lowercase().cmp(&b.to_lowercase());
    if folded != Ordering::Equal {
        return folded;
    }
    // 'a' (0x61) > 'A' (0x41) in code points; reverse to put lowercase first
    b.cmp(a)
}

/// Sort ascending by name
pub fn sort_by_name<A: Named>(items: &mut [TruncatedItem<A>]) {
    items.sort_by(|a, b| compare_names(a.name(), b.name()));
}

/// Sort publish history newest first; unpublished libraries go last
pub fn sort_by_published_desc(items: &mut [TruncatedItem<Library>]) {
    items.sort_by(
        |a, b| match (a.attributes.published_at, b.attributes.published_at) {
            (Some(x), Some(y)) => y.cmp(&x),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        },
    );
}
