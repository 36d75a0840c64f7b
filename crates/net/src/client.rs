//! HTTP client with connection pooling, token auth and retry logic

use migsweep_errors::{Error, HostingError};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, AUTHORIZATION};
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::Serialize;
use std::time::Duration;

/// Network client configuration
#[derive(Debug, Clone)]
pub struct NetConfig {
    pub timeout: Duration,
    pub connect_timeout: Duration,
    pub pool_idle_timeout: Duration,
    pub pool_max_idle_per_host: usize,
    pub retry_count: u32,
    pub retry_delay: Duration,
    pub user_agent: String,
    /// Sent as `Authorization: Bearer <token>` on every request
    pub bearer_token: Option<String>,
    /// Extra headers sent on every request
    pub default_headers: Vec<(String, String)>,
}

impl Default for NetConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(10),
            pool_idle_timeout: Duration::from_secs(90),
            pool_max_idle_per_host: 4,
            retry_count: 3,
            retry_delay: Duration::from_secs(1),
            user_agent: format!("migsweep/{}", env!("CARGO_PKG_VERSION")),
            bearer_token: None,
            default_headers: Vec::new(),
        }
    }
}

impl NetConfig {
    #[must_use]
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.bearer_token = Some(token.into());
        self
    }

    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.default_headers.push((name.into(), value.into()));
        self
    }

    fn header_map(&self) -> Result<HeaderMap, Error> {
        let mut headers = HeaderMap::new();
        if let Some(token) = &self.bearer_token {
            let mut value = HeaderValue::from_str(&format!("Bearer {token}"))
                .map_err(|e| Error::internal(format!("invalid token header: {e}")))?;
            value.set_sensitive(true);
            headers.insert(AUTHORIZATION, value);
        }
        for (name, value) in &self.default_headers {
            let name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|e| Error::internal(format!("invalid header name {name}: {e}")))?;
            let value = HeaderValue::from_str(value)
                .map_err(|e| Error::internal(format!("invalid header value: {e}")))?;
            headers.insert(name, value);
        }
        Ok(headers)
    }
}

/// HTTP client wrapper with retry logic
#[derive(Clone)]
pub struct NetClient {
    client: Client,
    config: NetConfig,
}

impl std::fmt::Debug for NetClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NetClient")
            .field("user_agent", &self.config.user_agent)
            .field("retry_count", &self.config.retry_count)
            .finish_non_exhaustive()
    }
}

impl NetClient {
    /// Create a new network client
    ///
    /// # Errors
    ///
    /// Returns an error if a configured header is malformed or if the
    /// underlying reqwest client fails to initialize.
    pub fn new(config: NetConfig) -> Result<Self, Error> {
        let client = Client::builder()
            .timeout(config.timeout)
            .connect_timeout(config.connect_timeout)
            .pool_idle_timeout(config.pool_idle_timeout)
            .pool_max_idle_per_host(config.pool_max_idle_per_host)
            .user_agent(&config.user_agent)
            .default_headers(config.header_map()?)
            .build()
            .map_err(|e| HostingError::ConnectionFailed(e.to_string()))?;

        Ok(Self { client, config })
    }

    /// Execute a GET request with retries
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails after all retry attempts.
    pub async fn get(&self, url: &str) -> Result<Response, Error> {
        self.retry_request(true, || self.client.get(url)).await
    }

    /// Execute a GET request with query parameters
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails after all retry attempts.
    pub async fn get_with_query<Q>(&self, url: &str, query: &Q) -> Result<Response, Error>
    where
        Q: Serialize + ?Sized,
    {
        self.retry_request(true, || self.client.get(url).query(query))
            .await
    }

    /// Execute a POST request with a JSON body, sent exactly once
    ///
    /// # Errors
    ///
    /// Returns an error if the request cannot be sent.
    pub async fn post_json<B>(&self, url: &str, body: &B) -> Result<Response, Error>
    where
        B: Serialize + ?Sized,
    {
        self.retry_request(false, || self.client.post(url).json(body))
            .await
    }

    /// Execute a DELETE request without a body, sent exactly once
    ///
    /// # Errors
    ///
    /// Returns an error if the request cannot be sent.
    pub async fn delete(&self, url: &str) -> Result<Response, Error> {
        self.retry_request(false, || self.client.delete(url)).await
    }

    /// Execute a DELETE request with a JSON body, sent exactly once
    ///
    /// # Errors
    ///
    /// Returns an error if the request cannot be sent.
    pub async fn delete_json<B>(&self, url: &str, body: &B) -> Result<Response, Error>
    where
        B: Serialize + ?Sized,
    {
        self.retry_request(false, || self.client.delete(url).json(body))
            .await
    }

    /// Execute a request with retries
    ///
    /// Transport failures and 5xx answers of idempotent requests are retried
    /// with a linearly growing pause. A request that is not idempotent gets a
    /// single attempt. Any other response is handed back to the caller untouched, except 429
    /// with a `retry-after` header, which becomes `RateLimited`.
    async fn retry_request<F>(&self, idempotent: bool, mut build: F) -> Result<Response, Error>
    where
        F: FnMut() -> RequestBuilder,
    {
        let retries = if idempotent { self.config.retry_count } else { 0 };
        let mut last_error = None;

        for attempt in 0..=retries {
            if attempt > 0 {
                tokio::time::sleep(self.config.retry_delay * attempt).await;
            }

            match build().send().await {
                Ok(response) => {
                    let status = response.status();
                    if status == StatusCode::TOO_MANY_REQUESTS {
                        if let Some(retry_after) = response
                            .headers()
                            .get("retry-after")
                            .and_then(|v| v.to_str().ok())
                            .and_then(|s| s.parse::<u64>().ok())
                        {
                            return Err(HostingError::RateLimited {
                                seconds: retry_after,
                            }
                            .into());
                        }
                    }

                    if status.is_server_error() && attempt < retries {
                        tracing::debug!(
                            url = %response.url(),
                            status = status.as_u16(),
                            attempt,
                            "server error, retrying"
                        );
                        continue;
                    }

                    return Ok(response);
                }
                Err(e) => {
                    let retry = Self::should_retry(&e);
                    tracing::debug!(error = %e, attempt, retry, "request failed");
                    last_error = Some(e);
                    if !retry {
                        break;
                    }
                }
            }
        }

        match last_error {
            Some(e) if e.is_timeout() => Err(HostingError::Timeout {
                url: e
                    .url()
                    .map(std::string::ToString::to_string)
                    .unwrap_or_default(),
            }
            .into()),
            Some(e) => Err(HostingError::ConnectionFailed(e.to_string()).into()),
            None => Err(HostingError::ConnectionFailed("no response".to_string()).into()),
        }
    }

    /// Determine if an error should be retried
    fn should_retry(error: &reqwest::Error) -> bool {
        error.is_timeout()
            || error.is_connect()
            || error.status().is_none_or(|s| s.is_server_error())
    }
}
