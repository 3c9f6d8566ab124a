//! HTTP implementation of [`ReactorService`]
//!
//! Every request carries the JSON:API `Accept` header plus the API key,
//! organisation id and bearer token. HTTP 429 responses are retried after
//! the server-supplied `Retry-After` delay, up to `max_retries` times.

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, CONTENT_TYPE, RETRY_AFTER};
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, warn};

use super::error::{ApiError, ApiResult};
use super::query::SearchQuery;
use super::service::ReactorService;
use super::types::{ListResponse, SearchResponse, SingleResponse};
use crate::entities::{Company, DataElement, Library, Property, Rule, RuleComponent};

/// JSON:API media type with the service's API revision
pub const JSONAPI_ACCEPT: &str = "application/vnd.api+json;revision=1";
pub const JSONAPI_CONTENT_TYPE: &str = "application/vnd.api+json";

/// Default public endpoint of the service
pub const DEFAULT_BASE_URL: &str = "https://reactor.adobe.io";

/// Fallback delay when a 429 carries no usable `Retry-After`
const DEFAULT_RETRY_AFTER_SECS: u64 = 5;

pub const DEFAULT_TIMEOUT_SECS: u64 = 60;
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// Connection settings for [`ReactorClient`].
#[derive(Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Base URL without trailing slash (e.g. `https://reactor.adobe.io`).
    pub base_url: String,
    /// API key (client id) sent as `x-api-key`.
    pub api_key: String,
    /// IMS organisation id sent as `x-gw-ims-org-id`.
    pub org_id: String,
    /// Bearer access token.
    pub access_token: String,
    /// Per-request timeout.
    pub timeout_secs: u64,
    /// How many times a rate-limited request is retried.
    pub max_retries: u32,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: String::new(),
            org_id: String::new(),
            access_token: String::new(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            max_retries: DEFAULT_MAX_RETRIES,
        }
    }
}

impl std::fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientConfig")
            .field("base_url", &self.base_url)
            .field("api_key", &"<redacted>")
            .field("org_id", &self.org_id)
            .field("access_token", &"<redacted>")
            .field("timeout_secs", &self.timeout_secs)
            .field("max_retries", &self.max_retries)
            .finish()
    }
}

/// Reactor API client
#[derive(Clone)]
pub struct ReactorClient {
    config: ClientConfig,
    client: Client,
}

impl ReactorClient {
    /// Creates a client with the credential headers preinstalled.
    pub fn new(config: ClientConfig) -> ApiResult<Self> {
        if config.access_token.trim().is_empty() {
            return Err(ApiError::Config("access token is not configured".to_string()));
        }
        if config.api_key.trim().is_empty() {
            return Err(ApiError::Config("API key is not configured".to_string()));
        }

        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static(JSONAPI_ACCEPT));
        headers.insert("x-api-key", header_value("x-api-key", &config.api_key)?);
        if !config.org_id.is_empty() {
            headers.insert(
                "x-gw-ims-org-id",
                header_value("x-gw-ims-org-id", &config.org_id)?,
            );
        }
        let mut bearer = header_value(
            "authorization",
            &format!("Bearer {}", config.access_token.trim()),
        )?;
        bearer.set_sensitive(true);
        headers.insert(AUTHORIZATION, bearer);

        let client = Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(config.timeout_secs.max(1)))
            .build()
            .map_err(|e| ApiError::Config(format!("failed to create HTTP client: {e}")))?;

        Ok(Self { config, client })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.base_url.trim_end_matches('/'), path)
    }

    async fn list<A: DeserializeOwned>(
        &self,
        path: String,
        page: Option<u32>,
        size: u32,
    ) -> ApiResult<ListResponse<A>> {
        let url = self.url(&path);
        let mut params = vec![("page[size]", size.to_string())];
        if let Some(number) = page {
            params.push(("page[number]", number.to_string()));
        }

        self.execute(&path, || self.client.get(&url).query(&params))
            .await
    }

    async fn get<T: DeserializeOwned>(&self, path: String) -> ApiResult<T> {
        let url = self.url(&path);
        self.execute(&path, || self.client.get(&url)).await
    }

    /// Sends a request, retrying rate-limited attempts, and decodes the body.
    async fn execute<T, F>(&self, endpoint: &str, build: F) -> ApiResult<T>
    where
        T: DeserializeOwned,
        F: Fn() -> RequestBuilder,
    {
        let mut attempt = 0u32;

        loop {
            let response = build().send().await.map_err(|e| {
                warn!(endpoint, error = %e, "request to remote service failed");
                ApiError::Transport {
                    endpoint: endpoint.to_string(),
                }
            })?;

            let status = response.status();

            if status == StatusCode::TOO_MANY_REQUESTS {
                let retry_after_secs = response
                    .headers()
                    .get(RETRY_AFTER)
                    .and_then(|v| v.to_str().ok())
                    .and_then(|v| v.trim().parse::<u64>().ok())
                    .unwrap_or(DEFAULT_RETRY_AFTER_SECS);

                if attempt < self.config.max_retries {
                    attempt += 1;
                    debug!(
                        endpoint,
                        attempt, retry_after_secs, "rate limited by remote service, retrying"
                    );
                    tokio::time::sleep(Duration::from_secs(retry_after_secs)).await;
                    continue;
                }

                warn!(endpoint, attempt, "rate limit retries exhausted");
                return Err(ApiError::RateLimited { retry_after_secs });
            }

            if status == StatusCode::NOT_FOUND {
                return Err(ApiError::NotFound(endpoint.to_string()));
            }

            if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
                warn!(endpoint, status = %status, "remote service rejected credentials");
                return Err(ApiError::Unauthorized {
                    status: status.as_u16(),
                });
            }

            if !status.is_success() {
                let body = response.text().await.unwrap_or_default();
                debug!(body = %body, status = %status, endpoint, "error body from remote service");
                warn!(status = %status, endpoint, "unexpected response from remote service");
                return Err(ApiError::Status {
                    status: status.as_u16(),
                    endpoint: endpoint.to_string(),
                });
            }

            let bytes = response.bytes().await.map_err(|e| {
                warn!(endpoint, error = %e, "failed to read response body");
                ApiError::Transport {
                    endpoint: endpoint.to_string(),
                }
            })?;

            return serde_json::from_slice(&bytes).map_err(|e| {
                warn!(endpoint, error = %e, "malformed payload from remote service");
                ApiError::Decode {
                    endpoint: endpoint.to_string(),
                }
            });
        }
    }
}

fn header_value(name: &str, value: &str) -> ApiResult<HeaderValue> {
    HeaderValue::from_str(value)
        .map_err(|_| ApiError::Config(format!("invalid characters in {name} header")))
}

#[async_trait]
impl ReactorService for ReactorClient {
    #[tracing::instrument(level = "debug", skip(self))]
    async fn list_companies(
        &self,
        page: Option<u32>,
        size: u32,
    ) -> ApiResult<ListResponse<Company>> {
        self.list("/companies".to_string(), page, size).await
    }

    #[tracing::instrument(level = "debug", skip(self))]
    async fn list_properties(
        &self,
        company_id: &str,
        page: Option<u32>,
        size: u32,
    ) -> ApiResult<ListResponse<Property>> {
        self.list(format!("/companies/{company_id}/properties"), page, size)
            .await
    }

    #[tracing::instrument(level = "debug", skip(self))]
    async fn list_rules(
        &self,
        property_id: &str,
        page: Option<u32>,
        size: u32,
    ) -> ApiResult<ListResponse<Rule>> {
        self.list(format!("/properties/{property_id}/rules"), page, size)
            .await
    }

    #[tracing::instrument(level = "debug", skip(self))]
    async fn list_rule_components(
        &self,
        rule_id: &str,
        page: Option<u32>,
        size: u32,
    ) -> ApiResult<ListResponse<RuleComponent>> {
        self.list(format!("/rules/{rule_id}/rule_components"), page, size)
            .await
    }

    #[tracing::instrument(level = "debug", skip(self))]
    async fn list_data_elements(
        &self,
        property_id: &str,
        page: Option<u32>,
        size: u32,
    ) -> ApiResult<ListResponse<DataElement>> {
        self.list(format!("/properties/{property_id}/data_elements"), page, size)
            .await
    }

    #[tracing::instrument(level = "debug", skip(self))]
    async fn list_libraries(
        &self,
        property_id: &str,
        page: Option<u32>,
        size: u32,
    ) -> ApiResult<ListResponse<Library>> {
        self.list(format!("/properties/{property_id}/libraries"), page, size)
            .await
    }

    #[tracing::instrument(level = "debug", skip(self, query), fields(types = ?query.resource_types))]
    async fn search(&self, query: &SearchQuery) -> ApiResult<SearchResponse> {
        let url = self.url("/search");
        let body = query.to_body();
        self.execute("/search", || {
            self.client
                .post(&url)
                .header(CONTENT_TYPE, JSONAPI_CONTENT_TYPE)
                .json(&body)
        })
        .await
    }

    #[tracing::instrument(level = "debug", skip(self))]
    async fn list_rules_for_rule_component(
        &self,
        component_id: &str,
    ) -> ApiResult<ListResponse<Value>> {
        self.get(format!("/rule_components/{component_id}/rules"))
            .await
    }

    #[tracing::instrument(level = "debug", skip(self))]
    async fn get_rule(&self, rule_id: &str) -> ApiResult<SingleResponse<Rule>> {
        self.get(format!("/rules/{rule_id}")).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> ClientConfig {
        ClientConfig {
            api_key: "key".to_string(),
            access_token: "token".to_string(),
            org_id: "ORG@AdobeOrg".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_new_requires_token() {
        let cfg = ClientConfig {
            access_token: String::new(),
            ..config()
        };
        assert!(matches!(ReactorClient::new(cfg), Err(ApiError::Config(_))));
    }

    #[test]
    fn test_new_requires_api_key() {
        let cfg = ClientConfig {
            api_key: "  ".to_string(),
            ..config()
        };
        assert!(matches!(ReactorClient::new(cfg), Err(ApiError::Config(_))));
    }

    #[test]
    fn test_url_joins_without_double_slash() {
        let cfg = ClientConfig {
            base_url: "http://localhost:1234/".to_string(),
            ..config()
        };
        let client = ReactorClient::new(cfg).unwrap();
        assert_eq!(client.url("/rules/RL1"), "http://localhost:1234/rules/RL1");
    }

    #[test]
    fn test_debug_redacts_credentials() {
        let debug = format!("{:?}", config());
        assert!(debug.contains("<redacted>"));
        assert!(!debug.contains("\"token\""));
        assert!(!debug.contains("\"key\""));
        assert!(debug.contains("ORG@AdobeOrg"));
    }
}
