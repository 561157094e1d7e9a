//! HTTP client for the Apollo people/company-data API.
//!
//! This module wraps all outbound calls to Apollo behind the dual-layer rate
//! limiter, retries throttled requests with exponential backoff, and maps
//! provider failures onto [`ApolloApiError`]. HTTP itself is synchronous
//! (`ureq`) and driven from async contexts via `tokio::task::spawn_blocking`.

mod rate_limiter;
pub use rate_limiter::{RateLimiter, RatePermit};

use crate::config::Config;
use crate::error::{ApolloApiError, ApolloResult, UNKNOWN_ERROR_CODE};
use crate::models::apollo::{
    ApiUsage, Organization, OrganizationSearchResponse, PeopleSearchParams, PeopleSearchResponse,
    Person, MAX_PER_PAGE,
};
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;

/// Response wrapper for the single-person endpoint.
#[derive(Debug, Deserialize)]
struct PersonResponse {
    person: Person,
}

/// Response wrapper for the single-organization endpoint.
#[derive(Debug, Deserialize)]
struct OrganizationResponse {
    organization: Organization,
}

/// HTTP client for the Apollo API.
///
/// The API key is merged into JSON bodies for POST requests and into query
/// parameters for GET requests; it is never sent as a header.
#[derive(Clone)]
pub struct ApolloClient {
    /// Base URL for the Apollo API
    base_url: String,

    /// API key for authentication
    api_key: String,

    /// HTTP client agent
    agent: Arc<ureq::Agent>,

    /// Dual-layer admission gate shared by every call through this client
    limiter: Arc<RateLimiter>,

    /// Retry budget for 429 responses
    max_retries: u32,

    /// Base delay for exponential retry backoff
    retry_base_delay: Duration,
}

impl ApolloClient {
    /// Create a new ApolloClient from configuration.
    pub fn new(config: &Config) -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build();

        Self {
            base_url: config.api_base_url.clone(),
            api_key: config.api_key.clone(),
            agent: Arc::new(agent),
            limiter: Arc::new(RateLimiter::new(
                config.rate_limit_max,
                Duration::from_millis(config.rate_limit_window_ms),
            )),
            max_retries: config.max_retries,
            retry_base_delay: Duration::from_millis(config.retry_base_delay_ms),
        }
    }

    /// Create an ApolloClient with a custom base URL and fast retry delays
    /// (useful for testing).
    #[doc(hidden)]
    pub fn with_base_url(base_url: String, api_key: String) -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout(Duration::from_secs(10))
            .build();

        Self {
            base_url,
            api_key,
            agent: Arc::new(agent),
            limiter: Arc::new(RateLimiter::new(10, Duration::from_millis(200))),
            max_retries: 3,
            retry_base_delay: Duration::from_millis(25),
        }
    }

    /// Build a full URL from a path.
    fn build_url(&self, path: &str) -> String {
        let base = self.base_url.trim_end_matches('/');
        let path = path.trim_start_matches('/');
        format!("{}/{}", base, path)
    }

    /// Execute one rate-limited request with the 429 retry ladder.
    ///
    /// The attempt counter is local to this logical call, so each call has an
    /// independent retry budget. Order per request: window wait, then
    /// concurrency slot, then the HTTP call.
    async fn request(
        &self,
        method: &'static str,
        path: &str,
        body: Option<serde_json::Value>,
    ) -> ApolloResult<serde_json::Value> {
        let url = self.build_url(path);
        let mut attempt: u32 = 0;

        loop {
            let permit = self.limiter.acquire().await;
            tracing::debug!(
                %url,
                method,
                in_flight = permit.in_flight(),
                retry = attempt,
                "dispatching Apollo request"
            );

            let result = self.dispatch(method, &url, body.clone()).await;
            drop(permit);

            match result {
                Ok(value) => {
                    tracing::debug!(%url, method, retry = attempt, "Apollo request succeeded");
                    return Ok(value);
                }
                Err(ApolloApiError::RateLimited { .. }) if attempt < self.max_retries => {
                    let delay = self.retry_base_delay * 2u32.pow(attempt);
                    tracing::warn!(
                        %url,
                        method,
                        retry = attempt,
                        delay_ms = delay.as_millis() as u64,
                        "Apollo rate limited, backing off before retry"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(ApolloApiError::RateLimited { .. }) => {
                    tracing::warn!(%url, method, retries = attempt, "Apollo retry budget exhausted");
                    return Err(ApolloApiError::RateLimited { retries: attempt });
                }
                Err(err @ ApolloApiError::Unauthorized { .. }) => {
                    tracing::error!(
                        %url,
                        method,
                        status = err.status(),
                        "Apollo authentication failed, check APOLLO_API_KEY"
                    );
                    return Err(err);
                }
                Err(err) => {
                    tracing::error!(
                        %url,
                        method,
                        status = err.status(),
                        code = err.code(),
                        retry = attempt,
                        "Apollo request failed: {}",
                        err
                    );
                    return Err(err);
                }
            }
        }
    }

    /// Perform a single HTTP exchange on the blocking pool.
    async fn dispatch(
        &self,
        method: &'static str,
        url: &str,
        body: Option<serde_json::Value>,
    ) -> ApolloResult<serde_json::Value> {
        let agent = self.agent.clone();
        let api_key = self.api_key.clone();
        let url = url.to_string();

        let text = tokio::task::spawn_blocking(move || -> ApolloResult<String> {
            let result = if method == "GET" {
                let separator = if url.contains('?') { '&' } else { '?' };
                let url = format!("{}{}api_key={}", url, separator, urlencoding::encode(&api_key));
                agent.get(&url).set("Content-Type", "application/json").call()
            } else {
                let mut payload = body.unwrap_or_else(|| serde_json::json!({}));
                if let Some(object) = payload.as_object_mut() {
                    object.insert("api_key".to_string(), serde_json::Value::String(api_key));
                }
                agent
                    .post(&url)
                    .set("Content-Type", "application/json")
                    .send_json(&payload)
            };

            match result {
                Ok(response) => response
                    .into_string()
                    .map_err(|e| ApolloApiError::Network(e.to_string())),
                Err(e) => Err(map_error(e)),
            }
        })
        .await
        .map_err(|e| ApolloApiError::RequestSetup(format!("task join error: {}", e)))??;

        if text.trim().is_empty() {
            Ok(serde_json::Value::Null)
        } else {
            serde_json::from_str(&text).map_err(ApolloApiError::Json)
        }
    }

    // ========================= Search Operations =========================

    /// Search people with structured predicates.
    ///
    /// Unrecognized filter keys pass through to the provider verbatim.
    pub async fn search_people(
        &self,
        params: &PeopleSearchParams,
    ) -> ApolloResult<PeopleSearchResponse> {
        if params.page < 1 {
            return Err(ApolloApiError::InvalidRequest(
                "page must be at least 1".to_string(),
            ));
        }

        let mut params = params.clone();
        params.per_page = params.per_page.clamp(1, MAX_PER_PAGE);

        let body = serde_json::to_value(&params)?;
        let value = self.request("POST", "/mixed_people/search", Some(body)).await?;
        serde_json::from_value(value).map_err(ApolloApiError::Json)
    }

    /// Search organizations by name.
    pub async fn search_organizations(
        &self,
        query: &str,
        page: u32,
        per_page: u32,
    ) -> ApolloResult<OrganizationSearchResponse> {
        if page < 1 {
            return Err(ApolloApiError::InvalidRequest(
                "page must be at least 1".to_string(),
            ));
        }

        let body = serde_json::json!({
            "q_organization_name": query,
            "page": page,
            "per_page": per_page.clamp(1, MAX_PER_PAGE),
        });
        let value = self
            .request("POST", "/mixed_companies/search", Some(body))
            .await?;
        serde_json::from_value(value).map_err(ApolloApiError::Json)
    }

    // ========================= Detail Operations =========================

    /// Get a single person by Apollo ID.
    ///
    /// A provider 404 surfaces as the generic typed API error.
    pub async fn get_person(&self, person_id: &str) -> ApolloResult<Person> {
        let path = format!("/people/{}", urlencoding::encode(person_id));
        let value = self.request("GET", &path, None).await?;
        let response: PersonResponse = serde_json::from_value(value)?;
        Ok(response.person)
    }

    /// Get a single organization by Apollo ID.
    pub async fn get_organization(&self, organization_id: &str) -> ApolloResult<Organization> {
        let path = format!("/organizations/{}", urlencoding::encode(organization_id));
        let value = self.request("GET", &path, None).await?;
        let response: OrganizationResponse = serde_json::from_value(value)?;
        Ok(response.organization)
    }

    // ========================= Diagnostics =========================

    /// Get the current provider quota snapshot.
    pub async fn get_api_usage(&self) -> ApolloResult<ApiUsage> {
        let value = self.request("GET", "/usage", None).await?;
        serde_json::from_value(value).map_err(ApolloApiError::Json)
    }
}

/// Map a ureq error to an ApolloApiError.
fn map_error(error: ureq::Error) -> ApolloApiError {
    match error {
        ureq::Error::Status(code, response) => {
            let body = response
                .into_string()
                .unwrap_or_else(|_| "Unknown error".to_string());
            let (provider_code, message) = parse_error_body(&body);

            match code {
                401 | 403 => ApolloApiError::Unauthorized {
                    status: code,
                    message,
                },
                429 => ApolloApiError::RateLimited { retries: 0 },
                _ => ApolloApiError::Api {
                    status: code,
                    code: provider_code,
                    message,
                },
            }
        }
        ureq::Error::Transport(transport) => match transport.kind() {
            ureq::ErrorKind::InvalidUrl
            | ureq::ErrorKind::UnknownScheme
            | ureq::ErrorKind::BadHeader => ApolloApiError::RequestSetup(transport.to_string()),
            _ => ApolloApiError::Network(transport.to_string()),
        },
    }
}

/// Extract the provider error code and message from a failure body.
fn parse_error_body(body: &str) -> (String, String) {
    if let Ok(value) = serde_json::from_str::<serde_json::Value>(body) {
        let code = value
            .get("error_code")
            .and_then(|v| v.as_str())
            .unwrap_or(UNKNOWN_ERROR_CODE)
            .to_string();
        let message = value
            .get("error")
            .or_else(|| value.get("message"))
            .and_then(|v| v.as_str())
            .unwrap_or(body)
            .to_string();
        (code, message)
    } else {
        (UNKNOWN_ERROR_CODE.to_string(), body.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_url() {
        let client = ApolloClient::with_base_url(
            "https://api.example.com/v1".to_string(),
            "test-key".to_string(),
        );

        assert_eq!(
            client.build_url("/people/abc"),
            "https://api.example.com/v1/people/abc"
        );

        assert_eq!(
            client.build_url("people/abc"),
            "https://api.example.com/v1/people/abc"
        );

        let client_with_slash = ApolloClient::with_base_url(
            "https://api.example.com/v1/".to_string(),
            "test-key".to_string(),
        );

        assert_eq!(
            client_with_slash.build_url("/usage"),
            "https://api.example.com/v1/usage"
        );
    }

    #[test]
    fn test_client_creation() {
        let config = Config {
            api_base_url: "https://api.apollo.io/v1".to_string(),
            api_key: "test-key-123".to_string(),
            ..Default::default()
        };

        let client = ApolloClient::new(&config);
        assert_eq!(client.base_url, "https://api.apollo.io/v1");
        assert_eq!(client.api_key, "test-key-123");
        assert_eq!(client.max_retries, 3);
    }

    #[test]
    fn test_parse_error_body_provider_code() {
        let (code, message) =
            parse_error_body(r#"{"error_code": "INSUFFICIENT_CREDITS", "error": "No credits left"}"#);
        assert_eq!(code, "INSUFFICIENT_CREDITS");
        assert_eq!(message, "No credits left");
    }

    #[test]
    fn test_parse_error_body_plain_text() {
        let (code, message) = parse_error_body("Internal server error");
        assert_eq!(code, UNKNOWN_ERROR_CODE);
        assert_eq!(message, "Internal server error");
    }

    #[test]
    fn test_parse_error_body_message_field() {
        let (code, message) = parse_error_body(r#"{"message": "bad request"}"#);
        assert_eq!(code, UNKNOWN_ERROR_CODE);
        assert_eq!(message, "bad request");
    }
}
