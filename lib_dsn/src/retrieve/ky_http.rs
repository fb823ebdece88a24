//! # HTTP Retrieval Utilities
//!
//! This module provides an asynchronous API client wrapper around `reqwest`
//! for feeds that publish text documents (XML in the case of DSN Now).
//! It supports an optional exponential backoff retry policy through
//! `reqwest-middleware` and standardized response metadata.

use std::time::Duration;

use reqwest::{header::HeaderMap, Url};
use reqwest_middleware::{ClientBuilder, ClientWithMiddleware};
use reqwest_retry::{policies::ExponentialBackoff, RetryTransientMiddleware};

use crate::error::DsnError;

/// Default request timeout applied when none is configured.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);
/// Default user agent sent with every request.
pub const DEFAULT_USER_AGENT: &str = concat!("lib_dsn/", env!("CARGO_PKG_VERSION"));

/// A standardized container for API responses.
///
/// This struct wraps the response body along with metadata about the
/// HTTP transaction, such as status codes and headers.
#[derive(Debug)]
pub struct ApiResponse {
    /// The response body, present when the status was 2xx.
    pub data: Option<String>,
    /// The raw error body returned by the server if the request failed.
    pub error_body: Option<String>,
    /// The numeric HTTP status code.
    pub status: u16,
    /// Indicates if the status code was in the 2xx range.
    pub success: bool,
    /// The headers returned by the server.
    pub headers: HeaderMap,
}

impl ApiResponse {
    /// Returns the body of a successful response, or a `Network` error
    /// describing the failed status.
    pub fn into_body(self, url: &str) -> Result<String, DsnError> {
        match (self.success, self.data) {
            (true, Some(body)) => Ok(body),
            _ => Err(DsnError::Network(format!(
                "HTTP request to {} failed with status {}{}",
                url,
                self.status,
                self.error_body
                    .filter(|b| !b.is_empty())
                    .map(|b| format!(": {}", b.chars().take(200).collect::<String>()))
                    .unwrap_or_default()
            ))),
        }
    }
}

/// Transport options shared by every request of an `ApiClient`.
#[derive(Debug, Clone)]
pub struct ClientOptions {
    /// Per-request timeout covering connect, send and body read.
    pub timeout: Duration,
    /// Number of retries on transient failures. Zero disables the retry middleware.
    pub max_retries: u32,
    /// Value of the `User-Agent` header.
    pub user_agent: String,
    /// Ignore system proxy settings (`HTTP_PROXY` and friends).
    pub no_proxy: bool,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
            max_retries: 0,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            no_proxy: false,
        }
    }
}

/// An asynchronous HTTP client bound to a base URL.
///
/// Built on top of `reqwest_middleware`; relative paths are joined onto the
/// base URL for each request.
pub struct ApiClient {
    /// The underlying middleware-enabled client.
    inner: ClientWithMiddleware,
    /// The base URL to which all relative paths are joined.
    base_url: Url,
}

impl ApiClient {
    /// Creates a new `ApiClient`.
    ///
    /// # Arguments
    /// * `base_url` - The absolute base URL (e.g., "https://eyes.nasa.gov/dsn/").
    /// * `options` - Timeout, retry and user agent settings.
    ///
    /// # Errors
    /// `InvalidUrl` if `base_url` is not absolute, `Network` if the TLS
    /// backend cannot be initialised.
    pub fn new(base_url: &str, options: &ClientOptions) -> Result<Self, DsnError> {
        let url = Url::parse(base_url)?;

        let mut client_builder = reqwest::Client::builder()
            .timeout(options.timeout)
            .user_agent(options.user_agent.as_str());
        if options.no_proxy {
            client_builder = client_builder.no_proxy();
        }
        let client = client_builder.build()?;

        let mut builder = ClientBuilder::new(client);
        if options.max_retries > 0 {
            let retry_policy =
                ExponentialBackoff::builder().build_with_max_retries(options.max_retries);
            builder = builder.with(RetryTransientMiddleware::new_with_policy(retry_policy));
        }

        Ok(Self {
            inner: builder.build(),
            base_url: url,
        })
    }

    /// Resolves `path` against the base URL.
    pub fn url_for(&self, path: &str) -> Result<Url, DsnError> {
        Ok(self.base_url.join(path)?)
    }

    /// Performs a GET request and returns the body as text.
    ///
    /// Non-2xx statuses are not errors at this level; they are reported in
    /// the returned `ApiResponse` so callers can decide how to react.
    ///
    /// # Errors
    /// `InvalidUrl` if the path cannot be joined, `Network` on transport failure.
    pub async fn get_text(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<ApiResponse, DsnError> {
        let full_url = self.url_for(path)?;
        let mut req = self.inner.get(full_url);
        if !query.is_empty() {
            req = req.query(query);
        }

        let response: reqwest::Response = req.send().await?;
        let status = response.status();
        let headers = response.headers().clone();

        if status.is_success() {
            let body = response.text().await?;
            Ok(ApiResponse {
                data: Some(body),
                error_body: None,
                status: status.as_u16(),
                success: true,
                headers,
            })
        } else {
            let error_text = response.text().await.ok();
            Ok(ApiResponse {
                data: None,
                error_body: error_text,
                status: status.as_u16(),
                success: false,
                headers,
            })
        }
    }
}
