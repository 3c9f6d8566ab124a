//! HTTP client and analysis tests against a mock remote service
//!
//! Each test starts a wiremock server and points a `ReactorClient` at it.

use serde_json::json;
use tagscope::analysis::{
    AnalysisError, AnalysisSettings, DataElementLookup, Inspector, PropertyLookup,
};
use tagscope::api::{ApiError, ClientConfig, ReactorClient, ReactorService};
use wiremock::matchers::{
    body_partial_json, header, method, path, query_param, query_param_is_missing,
};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client(server: &MockServer) -> ReactorClient {
    ReactorClient::new(ClientConfig {
        base_url: server.uri(),
        api_key: "test-key".to_string(),
        org_id: "ORG@AdobeOrg".to_string(),
        access_token: "secret-token".to_string(),
        timeout_secs: 5,
        max_retries: 2,
    })
    .unwrap()
}

fn rule(id: &str, name: &str) -> serde_json::Value {
    json!({"id": id, "type": "rules", "attributes": {"name": name, "revision_number": 0}})
}

fn list_page(data: Vec<serde_json::Value>, next_page: Option<u32>) -> serde_json::Value {
    json!({"data": data, "meta": {"pagination": {"next_page": next_page}}})
}

#[tokio::test]
async fn test_list_sends_credentials_and_page_size() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/properties/PR1/rules"))
        .and(header("x-api-key", "test-key"))
        .and(header("x-gw-ims-org-id", "ORG@AdobeOrg"))
        .and(header("authorization", "Bearer secret-token"))
        .and(query_param("page[size]", "25"))
        .and(query_param_is_missing("page[number]"))
        .respond_with(ResponseTemplate::new(200).set_body_json(list_page(
            vec![rule("RL1", "Pageview")],
            None,
        )))
        .expect(1)
        .mount(&server)
        .await;

    let response = client(&server)
        .list_rules("PR1", None, 25)
        .await
        .unwrap();
    assert_eq!(response.data.len(), 1);
    assert_eq!(response.data[0].attributes.name, "Pageview");
}

#[tokio::test]
async fn test_inspector_follows_cursor_and_sorts() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/properties/PR1/rules"))
        .and(query_param_is_missing("page[number]"))
        .respond_with(ResponseTemplate::new(200).set_body_json(list_page(
            vec![rule("RL2", "checkout"), rule("RL3", "Zed")],
            Some(2),
        )))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/properties/PR1/rules"))
        .and(query_param("page[number]", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(list_page(
            vec![rule("RL1", "Apple")],
            None,
        )))
        .mount(&server)
        .await;

    let inspector = Inspector::new(client(&server));
    let rules = inspector
        .list_rules(&PropertyLookup::new("PR1"))
        .await
        .unwrap();
    let names: Vec<&str> = rules.iter().map(|r| r.attributes.name.as_str()).collect();
    assert_eq!(names, vec!["Apple", "checkout", "Zed"]);
}

#[tokio::test]
async fn test_runaway_pagination_is_capped() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/properties/PR1/data_elements"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(list_page(Vec::new(), Some(2))),
        )
        .mount(&server)
        .await;

    let inspector = Inspector::with_settings(
        client(&server),
        AnalysisSettings {
            max_pages: 3,
            ..Default::default()
        },
    );
    let err = inspector
        .list_data_elements(&PropertyLookup::new("PR1"))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        AnalysisError::ExhaustedPagination { max_pages: 3 }
    ));
}

#[tokio::test]
async fn test_rate_limited_request_is_retried() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/rules/RL1"))
        .respond_with(ResponseTemplate::new(429).insert_header("Retry-After", "0"))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/rules/RL1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": rule("RL1", "Pageview")})))
        .mount(&server)
        .await;

    let response = client(&server).get_rule("RL1").await.unwrap();
    assert_eq!(response.data.id, "RL1");
}

#[tokio::test]
async fn test_rate_limit_retries_exhaust() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/rules/RL1"))
        .respond_with(ResponseTemplate::new(429).insert_header("Retry-After", "0"))
        .expect(3)
        .mount(&server)
        .await;

    let err = client(&server).get_rule("RL1").await.unwrap_err();
    assert!(err.is_rate_limited());
}

#[tokio::test]
async fn test_server_error_body_is_not_leaked() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/rules/RL1"))
        .respond_with(ResponseTemplate::new(500).set_body_string("Bearer secret-token echoed"))
        .mount(&server)
        .await;

    let err = client(&server).get_rule("RL1").await.unwrap_err();
    assert_eq!(
        err,
        ApiError::Status {
            status: 500,
            endpoint: "/rules/RL1".to_string()
        }
    );
    assert!(!err.to_string().contains("secret-token"));
}

#[tokio::test]
async fn test_unauthorized_and_not_found() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/rules/RL1"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/rules/RL2"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let client = client(&server);
    assert_eq!(
        client.get_rule("RL1").await.unwrap_err(),
        ApiError::Unauthorized { status: 401 }
    );
    assert!(matches!(
        client.get_rule("RL2").await.unwrap_err(),
        ApiError::NotFound(_)
    ));
}

#[tokio::test]
async fn test_malformed_payload_is_a_decode_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/rules/RL1"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
        .mount(&server)
        .await;

    assert!(matches!(
        client(&server).get_rule("RL1").await.unwrap_err(),
        ApiError::Decode { .. }
    ));
}

#[tokio::test]
async fn test_reverse_lookup_end_to_end() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/search"))
        .and(header("content-type", "application/vnd.api+json"))
        .and(body_partial_json(json!({
            "data": {"query": {"attributes.settings": {"value": "%Page Name%"}}}
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [
                {"id": "RC1", "type": "rule_components", "attributes": {"name": "Set vars"}},
                {"id": "RC9", "type": "rule_components",
                 "attributes": {"name": "Old", "deleted_at": "2024-01-01T00:00:00Z"}}
            ],
            "meta": {"total_hits": 2}
        })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/search"))
        .and(body_partial_json(json!({
            "data": {"query": {"attributes.settings": {"value": "_satellite.getVar(\"Page Name\")"}}}
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [
                {"id": "RC2", "type": "rule_components", "attributes": {"name": "Custom code"}}
            ],
            "meta": {"total_hits": 1}
        })))
        .mount(&server)
        .await;

    // RC1 and RC2 belong to the same rule; the duplicate collapses
    for component in ["RC1", "RC2"] {
        Mock::given(method("GET"))
            .and(path(format!("/rule_components/{component}/rules")))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": [rule("RL1", "Pageview")]
            })))
            .mount(&server)
            .await;
    }

    let inspector = Inspector::new(client(&server));
    let found = inspector
        .find_rules_using_data_element(&DataElementLookup::new("PR1", "Page Name"))
        .await
        .unwrap();

    assert_eq!(found.items.len(), 1);
    assert_eq!(found.items[0].id, "RL1");
    assert_eq!(found.items[0].resource_type, "rules");
    assert_eq!(found.total_hits, 1);
    assert_eq!(found.search_hits, 3);
    assert!(found.failures.is_empty());
}
