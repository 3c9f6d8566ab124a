//! In-memory `ReactorService` used by the unit tests

use async_trait::async_trait;
use serde_json::{json, Value};
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use crate::api::{
    ApiError, ApiResult, ListMeta, ListResponse, Pagination, ReactorService, SearchMeta,
    SearchQuery, SearchResponse, SingleResponse,
};
use crate::entities::{
    Company, DataElement, Library, Property, Resource, Rule, RuleComponent, SearchItem,
    TruncatedItem,
};

pub fn rule(id: &str, name: &str) -> TruncatedItem<Rule> {
    TruncatedItem {
        id: id.to_string(),
        resource_type: "rules".to_string(),
        attributes: Rule {
            name: name.to_string(),
            ..Default::default()
        },
    }
}

pub fn component(id: &str, descriptor: &str, settings: &str) -> TruncatedItem<RuleComponent> {
    TruncatedItem {
        id: id.to_string(),
        resource_type: "rule_components".to_string(),
        attributes: RuleComponent {
            name: id.to_string(),
            delegate_descriptor_id: descriptor.to_string(),
            settings: Some(json!(settings)),
            ..Default::default()
        },
    }
}

pub fn data_element(id: &str, name: &str) -> TruncatedItem<DataElement> {
    TruncatedItem {
        id: id.to_string(),
        resource_type: "data_elements".to_string(),
        attributes: DataElement {
            name: name.to_string(),
            ..Default::default()
        },
    }
}

pub fn component_hit(id: &str, deleted: bool) -> SearchItem {
    let deleted_at = if deleted {
        json!("2024-01-01T00:00:00Z")
    } else {
        Value::Null
    };
    resource(
        id,
        "rule_components",
        json!({"name": id, "deleted_at": deleted_at}),
    )
}

pub fn rule_hit(id: &str, name: &str) -> SearchItem {
    resource(id, "rules", json!({"name": name, "enabled": true}))
}

fn resource<A>(id: &str, resource_type: &str, attributes: A) -> Resource<A> {
    Resource {
        id: id.to_string(),
        resource_type: resource_type.to_string(),
        attributes,
        relationships: None,
        links: None,
        meta: None,
    }
}

fn untruncate<A>(item: TruncatedItem<A>) -> Resource<A> {
    let TruncatedItem {
        id,
        resource_type,
        attributes,
    } = item;
    resource(&id, &resource_type, attributes)
}

fn single_page<A>(data: Vec<Resource<A>>) -> ListResponse<A> {
    ListResponse {
        data,
        meta: ListMeta::default(),
    }
}

fn not_found(endpoint: String) -> ApiError {
    ApiError::NotFound(endpoint)
}

/// Canned responses plus a log of the calls made
#[derive(Default)]
pub struct FakeService {
    rule_pages: Vec<Vec<Resource<Rule>>>,
    rules: HashMap<String, Resource<Rule>>,
    components: HashMap<String, Vec<Resource<RuleComponent>>>,
    failing_components: HashSet<String>,
    data_elements: Vec<Resource<DataElement>>,
    libraries: Vec<Resource<Library>>,
    searches: HashMap<String, Vec<SearchItem>>,
    search_fails: bool,
    owners: HashMap<String, SearchItem>,
    rule_page_calls: Mutex<Vec<(Option<u32>, u32)>>,
    owner_lookups: Mutex<Vec<String>>,
    search_offsets: Mutex<Vec<u32>>,
}

impl FakeService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rule listing pages; each entry is `(id, name)`
    pub fn with_rule_pages(mut self, pages: Vec<Vec<(&str, &str)>>) -> Self {
        for page in pages {
            let page: Vec<Resource<Rule>> = page
                .into_iter()
                .map(|(id, name)| untruncate(rule(id, name)))
                .collect();
            for r in &page {
                self.rules.insert(r.id.clone(), r.clone());
            }
            self.rule_pages.push(page);
        }
        self
    }

    pub fn with_deleted_rule(mut self, id: &str, name: &str) -> Self {
        let mut deleted = untruncate(rule(id, name));
        deleted.attributes.deleted_at = Some(chrono::Utc::now());
        match self.rule_pages.last_mut() {
            Some(page) => page.push(deleted),
            None => self.rule_pages.push(vec![deleted]),
        }
        self
    }

    /// A rule reachable through `get_rule` only
    pub fn with_rule(mut self, id: &str, name: &str) -> Self {
        self.rules.insert(id.to_string(), untruncate(rule(id, name)));
        self
    }

    pub fn with_components(mut self, rule_id: &str, components: Vec<TruncatedItem<RuleComponent>>) -> Self {
        self.components.insert(
            rule_id.to_string(),
            components.into_iter().map(untruncate).collect(),
        );
        self
    }

    pub fn failing_components(mut self, rule_id: &str) -> Self {
        self.failing_components.insert(rule_id.to_string());
        self
    }

    pub fn with_data_elements(mut self, data_elements: Vec<TruncatedItem<DataElement>>) -> Self {
        self.data_elements = data_elements.into_iter().map(untruncate).collect();
        self
    }

    /// Libraries as `(id, published_at)`
    pub fn with_libraries(mut self, libraries: Vec<(&str, Option<&str>)>) -> Self {
        self.libraries = libraries
            .into_iter()
            .map(|(id, published_at)| {
                let attributes = Library {
                    name: id.to_string(),
                    published_at: published_at.and_then(|s| s.parse().ok()),
                    ..Default::default()
                };
                resource(id, "libraries", attributes)
            })
            .collect();
        self
    }

    /// Hits returned for a search whose `attributes.settings` equals `settings`
    pub fn with_search(mut self, settings: &str, hits: Vec<SearchItem>) -> Self {
        self.searches.insert(settings.to_string(), hits);
        self
    }

    pub fn failing_search(mut self) -> Self {
        self.search_fails = true;
        self
    }

    pub fn with_owner(mut self, component_id: &str, rule: SearchItem) -> Self {
        self.owners.insert(component_id.to_string(), rule);
        self
    }

    pub fn rule_page_calls(&self) -> Vec<(Option<u32>, u32)> {
        self.rule_page_calls.lock().unwrap().clone()
    }

    pub fn owner_lookups(&self) -> Vec<String> {
        self.owner_lookups.lock().unwrap().clone()
    }

    pub fn search_offsets(&self) -> Vec<u32> {
        self.search_offsets.lock().unwrap().clone()
    }
}

#[async_trait]
impl ReactorService for FakeService {
    async fn list_companies(&self, _page: Option<u32>, _size: u32) -> ApiResult<ListResponse<Company>> {
        Ok(single_page(vec![]))
    }

    async fn list_properties(
        &self,
        _company_id: &str,
        _page: Option<u32>,
        _size: u32,
    ) -> ApiResult<ListResponse<Property>> {
        Ok(single_page(vec![]))
    }

    async fn list_rules(
        &self,
        _property_id: &str,
        page: Option<u32>,
        size: u32,
    ) -> ApiResult<ListResponse<Rule>> {
        self.rule_page_calls.lock().unwrap().push((page, size));

        let number = page.unwrap_or(1);
        let index = number.saturating_sub(1) as usize;
        let data = self.rule_pages.get(index).cloned().unwrap_or_default();
        let next_page = (index + 1 < self.rule_pages.len()).then_some(number + 1);

        Ok(ListResponse {
            data,
            meta: ListMeta {
                pagination: Some(Pagination {
                    current_page: Some(number),
                    next_page,
                    ..Default::default()
                }),
            },
        })
    }

    async fn list_rule_components(
        &self,
        rule_id: &str,
        _page: Option<u32>,
        _size: u32,
    ) -> ApiResult<ListResponse<RuleComponent>> {
        if self.failing_components.contains(rule_id) {
            return Err(ApiError::Status {
                status: 503,
                endpoint: format!("/rules/{rule_id}/rule_components"),
            });
        }
        Ok(single_page(
            self.components.get(rule_id).cloned().unwrap_or_default(),
        ))
    }

    async fn list_data_elements(
        &self,
        _property_id: &str,
        _page: Option<u32>,
        _size: u32,
    ) -> ApiResult<ListResponse<DataElement>> {
        Ok(single_page(self.data_elements.clone()))
    }

    async fn list_libraries(
        &self,
        _property_id: &str,
        _page: Option<u32>,
        _size: u32,
    ) -> ApiResult<ListResponse<Library>> {
        Ok(single_page(self.libraries.clone()))
    }

    async fn search(&self, query: &SearchQuery) -> ApiResult<SearchResponse> {
        if self.search_fails {
            return Err(ApiError::Status {
                status: 500,
                endpoint: "/search".to_string(),
            });
        }
        self.search_offsets.lock().unwrap().push(query.from);

        let all = query
            .value_of("attributes.settings")
            .and_then(Value::as_str)
            .and_then(|settings| self.searches.get(settings))
            .cloned()
            .unwrap_or_default();
        let data = all
            .iter()
            .skip(query.from as usize)
            .take(query.size as usize)
            .cloned()
            .collect();
        Ok(SearchResponse {
            meta: SearchMeta {
                total_hits: all.len() as u64,
            },
            data,
        })
    }

    async fn list_rules_for_rule_component(
        &self,
        component_id: &str,
    ) -> ApiResult<ListResponse<Value>> {
        self.owner_lookups
            .lock()
            .unwrap()
            .push(component_id.to_string());
        match self.owners.get(component_id) {
            Some(owner) => Ok(single_page(vec![owner.clone()])),
            None => Err(not_found(format!("/rule_components/{component_id}/rules"))),
        }
    }

    async fn get_rule(&self, rule_id: &str) -> ApiResult<SingleResponse<Rule>> {
        self.rules
            .get(rule_id)
            .cloned()
            .map(|data| SingleResponse { data })
            .ok_or_else(|| not_found(format!("/rules/{rule_id}")))
    }
}
