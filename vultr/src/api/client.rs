use serde::de::DeserializeOwned;
use std::sync::Arc;
use std::time::Duration;
use url::Url;

use super::common::{ApiQueryParams, FormParams, ListResponse};
use super::error::ApiError;
use super::pool::{build_http_client, ConnectionPoolConfig, RateLimiter};

pub const DEFAULT_ENDPOINT: &str = "https://api.vultr.com";
pub const DEFAULT_RATE_LIMIT: Duration = Duration::from_millis(500);

const API_KEY_HEADER: &str = "API-Key";

/// Vultr API client
#[derive(Clone)]
pub struct Client {
    inner: Arc<ClientInner>,
}

struct ClientInner {
    http_client: reqwest::Client,
    base_url: String,
    api_key: String,
    retry_config: RetryConfig,
    rate_limiter: RateLimiter,
}

#[derive(Clone)]
pub struct RetryConfig {
    pub max_retries: u32,
    pub initial_backoff_ms: u64,
    pub max_backoff_ms: u64,
    pub timeout_seconds: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_backoff_ms: 100,
            max_backoff_ms: 10000,
            timeout_seconds: 30,
        }
    }
}

/// Everything needed to build a [`Client`].
#[derive(Clone)]
pub struct ClientConfig {
    pub endpoint: String,
    pub api_key: String,
    pub rate_limit: Duration,
    pub retry: RetryConfig,
}

impl ClientConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            api_key: api_key.into(),
            rate_limit: DEFAULT_RATE_LIMIT,
            retry: RetryConfig::default(),
        }
    }

    pub fn endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    pub fn rate_limit(mut self, rate_limit: Duration) -> Self {
        self.rate_limit = rate_limit;
        self
    }

    pub fn retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }
}

impl Client {
    /// Create a new API client with the default endpoint and pacing
    pub fn new(api_key: &str) -> Result<Self, ApiError> {
        Self::with_config(ClientConfig::new(api_key))
    }

    pub fn with_config(config: ClientConfig) -> Result<Self, ApiError> {
        let base_url = Url::parse(config.endpoint.trim_end_matches('/'))?;

        let pool_config = ConnectionPoolConfig {
            request_timeout: Duration::from_secs(config.retry.timeout_seconds),
            ..Default::default()
        };
        let http_client = build_http_client(&pool_config)?;

        tracing::info!("Vultr client configured for URL: {}", base_url);

        Ok(Self {
            inner: Arc::new(ClientInner {
                http_client,
                base_url: base_url.as_str().trim_end_matches('/').to_string(),
                api_key: config.api_key,
                retry_config: config.retry,
                rate_limiter: RateLimiter::new(config.rate_limit),
            }),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.inner.base_url
    }

    /// Execute a GET request with retry logic
    pub async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        params: &ApiQueryParams,
    ) -> Result<T, ApiError> {
        let url = format!("{}{}{}", self.inner.base_url, path, params.to_query_string());
        self.execute_with_retry(
            || {
                tracing::debug!("GET request to: {}", url);
                self.inner
                    .http_client
                    .get(&url)
                    .header(API_KEY_HEADER, &self.inner.api_key)
                    .send()
            },
            path,
            Retry::Idempotent,
        )
        .await
    }

    /// GET a list endpoint; keyed objects and empty arrays both decode to a Vec
    pub async fn get_list<T: DeserializeOwned>(
        &self,
        path: &str,
        params: &ApiQueryParams,
    ) -> Result<Vec<T>, ApiError> {
        let list: ListResponse<T> = self.get(path, params).await?;
        Ok(list.items)
    }

    /// Execute a form-encoded POST request with retry logic
    pub async fn post<T: DeserializeOwned>(
        &self,
        path: &str,
        form: &FormParams,
    ) -> Result<T, ApiError> {
        let url = format!("{}{}", self.inner.base_url, path);
        self.execute_with_retry(
            || {
                tracing::debug!("POST request to: {} form: {:?}", url, redact(form));
                self.inner
                    .http_client
                    .post(&url)
                    .header(API_KEY_HEADER, &self.inner.api_key)
                    .form(form.as_pairs())
                    .send()
            },
            path,
            Retry::NotIdempotent,
        )
        .await
    }

    /// POST where the response body carries nothing of interest
    pub async fn post_empty(&self, path: &str, form: &FormParams) -> Result<(), ApiError> {
        self.post::<serde_json::Value>(path, form).await.map(|_| ())
    }

    /// Execute request with retry logic.
    ///
    /// 429, 503 and connect failures never reached the API and are retried
    /// for every method. A transport timeout is retried only for idempotent
    /// requests.
    async fn execute_with_retry<F, Fut, T>(
        &self,
        request_fn: F,
        path: &str,
        retry: Retry,
    ) -> Result<T, ApiError>
    where
        F: Fn() -> Fut,
        Fut: std::future::Future<Output = Result<reqwest::Response, reqwest::Error>>,
        T: DeserializeOwned,
    {
        let mut attempt = 0;
        let mut last_error = None;

        while attempt <= self.inner.retry_config.max_retries {
            if attempt > 0 {
                let backoff = std::cmp::min(
                    self.inner.retry_config.initial_backoff_ms * (2_u64.pow(attempt - 1)),
                    self.inner.retry_config.max_backoff_ms,
                );
                tracing::debug!(
                    "Retrying request to {} after {}ms (attempt {})",
                    path,
                    backoff,
                    attempt
                );
                tokio::time::sleep(Duration::from_millis(backoff)).await;
            }

            if self.inner.rate_limiter.acquire().await {
                tracing::debug!("Request to {} delayed by rate limit", path);
            }

            match request_fn().await {
                Ok(response) => {
                    let status = response.status();

                    if status.is_success() {
                        return self.parse_success_response(response).await;
                    }

                    if status == reqwest::StatusCode::FORBIDDEN
                        || status == reqwest::StatusCode::UNAUTHORIZED
                    {
                        return Err(ApiError::AuthError);
                    }

                    if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
                        last_error = Some(ApiError::RateLimited);
                    } else if status == reqwest::StatusCode::SERVICE_UNAVAILABLE {
                        last_error = Some(ApiError::ServiceUnavailable);
                    } else {
                        return self.handle_error_response(response).await;
                    }
                }
                Err(e) => {
                    if e.is_connect() {
                        last_error = Some(ApiError::ServiceUnavailable);
                    } else if e.is_timeout() {
                        let timeout = ApiError::Timeout(self.inner.retry_config.timeout_seconds);
                        if retry == Retry::NotIdempotent {
                            return Err(timeout);
                        }
                        last_error = Some(timeout);
                    } else {
                        return Err(ApiError::Request(e));
                    }
                }
            }

            attempt += 1;
        }

        Err(last_error.unwrap_or(ApiError::ServiceUnavailable))
    }

    /// Parse successful response; an empty body decodes as JSON null
    async fn parse_success_response<T: DeserializeOwned>(
        &self,
        response: reqwest::Response,
    ) -> Result<T, ApiError> {
        let text = response.text().await?;
        tracing::debug!("API response body: {}", text);

        let body = if text.trim().is_empty() {
            "null"
        } else {
            text.as_str()
        };

        serde_json::from_str::<T>(body).map_err(|e| {
            tracing::error!("Failed to deserialize response: {}, body: {}", e, text);
            ApiError::Parse(e.to_string())
        })
    }

    /// Handle error response
    async fn handle_error_response<T>(&self, response: reqwest::Response) -> Result<T, ApiError> {
        let status = response.status().as_u16();
        let text = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());
        tracing::debug!("API error response (HTTP {}): {}", status, text);

        Err(ApiError::Api {
            status,
            message: text.trim().to_string(),
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Retry {
    Idempotent,
    NotIdempotent,
}

fn redact(form: &FormParams) -> Vec<(&str, &str)> {
    form.as_pairs()
        .iter()
        .map(|(k, v)| {
            if k == "userdata" || k == "script" {
                (k.as_str(), "<redacted>")
            } else {
                (k.as_str(), v.as_str())
            }
        })
        .collect()
}

#[cfg(test)]
#[allow(clippy::disallowed_methods)]
mod tests {
    use super::*;
    use mockito::{Matcher, Server};
    use serde::Deserialize;

    #[derive(Debug, Deserialize)]
    struct Created {
        #[serde(rename = "SUBID")]
        id: String,
    }

    fn test_client(url: &str) -> Client {
        Client::with_config(
            ClientConfig::new("secret")
                .endpoint(url)
                .rate_limit(Duration::ZERO)
                .retry(RetryConfig {
                    max_retries: 2,
                    initial_backoff_ms: 1,
                    max_backoff_ms: 5,
                    timeout_seconds: 5,
                }),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn get_sends_api_key_and_query() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/v1/server/list")
            .match_header("API-Key", "secret")
            .match_query(Matcher::UrlEncoded("SUBID".into(), "576965".into()))
            .with_body(r#"{"SUBID":"576965"}"#)
            .create_async()
            .await;

        let client = test_client(&server.url());
        let created: Created = client
            .get(
                "/v1/server/list",
                &ApiQueryParams::new().add("SUBID", "576965"),
            )
            .await
            .unwrap();

        assert_eq!(created.id, "576965");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn post_sends_form_body() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/v1/server/label_set")
            .match_header("content-type", "application/x-www-form-urlencoded")
            .match_body(Matcher::AllOf(vec![
                Matcher::UrlEncoded("SUBID".into(), "1".into()),
                Matcher::UrlEncoded("label".into(), "web 1".into()),
            ]))
            .with_body("")
            .create_async()
            .await;

        let client = test_client(&server.url());
        client
            .post_empty(
                "/v1/server/label_set",
                &FormParams::new().add("SUBID", "1").add("label", "web 1"),
            )
            .await
            .unwrap();

        mock.assert_async().await;
    }

    #[tokio::test]
    async fn error_body_becomes_api_error() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", "/v1/server/list")
            .match_query(Matcher::Any)
            .with_status(412)
            .with_body("Invalid server.\n")
            .create_async()
            .await;

        let client = test_client(&server.url());
        let err = client
            .get::<Created>("/v1/server/list", &ApiQueryParams::new().add("SUBID", "9"))
            .await
            .unwrap_err();

        assert_eq!(err.status(), Some(412));
        assert_eq!(err.message(), Some("Invalid server."));
    }

    #[tokio::test]
    async fn forbidden_is_auth_error() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/v1/account/info")
            .with_status(403)
            .with_body("Invalid API key.")
            .expect(1)
            .create_async()
            .await;

        let client = test_client(&server.url());
        let err = client
            .get::<serde_json::Value>("/v1/account/info", &ApiQueryParams::new())
            .await
            .unwrap_err();

        assert!(matches!(err, ApiError::AuthError));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn service_unavailable_is_retried() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/v1/regions/list")
            .with_status(503)
            .expect(3)
            .create_async()
            .await;

        let client = test_client(&server.url());
        let err = client
            .get::<serde_json::Value>("/v1/regions/list", &ApiQueryParams::new())
            .await
            .unwrap_err();

        assert!(matches!(err, ApiError::ServiceUnavailable));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn internal_error_on_create_is_sent_once() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/v1/server/create")
            .with_status(500)
            .with_body("Unable to create server: internal error\n")
            .expect(1)
            .create_async()
            .await;

        let client = test_client(&server.url());
        let err = client
            .post::<Created>("/v1/server/create", &FormParams::new().add("DCID", 1))
            .await
            .unwrap_err();

        mock.assert_async().await;
        assert_eq!(err.status(), Some(500));
        assert_eq!(err.message(), Some("Unable to create server: internal error"));
    }

    #[tokio::test]
    async fn internal_error_on_get_is_not_retried() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/v1/plans/list")
            .with_status(502)
            .with_body("Bad gateway")
            .expect(1)
            .create_async()
            .await;

        let client = test_client(&server.url());
        let err = client
            .get::<serde_json::Value>("/v1/plans/list", &ApiQueryParams::new())
            .await
            .unwrap_err();

        mock.assert_async().await;
        assert_eq!(err.status(), Some(502));
    }

    #[tokio::test]
    async fn service_unavailable_on_post_is_retried() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/v1/server/create_ipv4")
            .with_status(503)
            .expect(3)
            .create_async()
            .await;

        let client = test_client(&server.url());
        let err = client
            .post_empty("/v1/server/create_ipv4", &FormParams::new().add("SUBID", "1"))
            .await
            .unwrap_err();

        assert!(matches!(err, ApiError::ServiceUnavailable));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn rate_limited_is_retried() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/v1/os/list")
            .with_status(429)
            .expect(3)
            .create_async()
            .await;

        let client = test_client(&server.url());
        let err = client
            .get::<serde_json::Value>("/v1/os/list", &ApiQueryParams::new())
            .await
            .unwrap_err();

        assert!(matches!(err, ApiError::RateLimited));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn get_list_accepts_empty_array() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", "/v1/sshkey/list")
            .with_body("[]")
            .create_async()
            .await;

        let client = test_client(&server.url());
        let keys: Vec<Created> = client
            .get_list("/v1/sshkey/list", &ApiQueryParams::new())
            .await
            .unwrap();

        assert!(keys.is_empty());
    }

    #[tokio::test]
    async fn client_strips_trailing_slash_from_endpoint() {
        let client = test_client("http://localhost:8080/");
        assert_eq!(client.endpoint(), "http://localhost:8080");
    }

    #[test]
    fn invalid_endpoint_is_rejected() {
        let result = Client::with_config(ClientConfig::new("key").endpoint("not a url"));
        assert!(matches!(result, Err(ApiError::InvalidEndpoint(_))));
    }

    #[test]
    fn redact_hides_user_data() {
        let form = FormParams::new().add("label", "x").add("userdata", "c2VjcmV0");
        let shown = redact(&form);
        assert_eq!(shown[0], ("label", "x"));
        assert_eq!(shown[1], ("userdata", "<redacted>"));
    }
}
