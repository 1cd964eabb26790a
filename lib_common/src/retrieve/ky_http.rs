//! # HTTP Retrieval Utilities
//!
//! This module provides an asynchronous API client wrapper around `reqwest`.
//! Every call resolves to either a decoded body or a classified `FetchError`;
//! transport failures, non-2xx statuses and malformed JSON are all errors,
//! never panics. Retries through `reqwest-retry` are only installed when
//! `ApiClientOptions::max_retries` is non-zero.

use std::time::Duration;

use reqwest::{header::HeaderMap, Method, Url};
use reqwest_middleware::{ClientBuilder, ClientWithMiddleware};
use reqwest_retry::{policies::ExponentialBackoff, RetryTransientMiddleware};
use serde::de::DeserializeOwned;
use thiserror::Error;

/// Classification of a failed retrieval.
#[derive(Debug, Error)]
pub enum FetchError {
    /// The base URL or the joined request URL could not be parsed.
    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),

    /// The underlying `reqwest::Client` could not be constructed.
    #[error("Failed to build HTTP client: {0}")]
    Client(String),

    /// The request never produced a response (DNS, connect, timeout, reset).
    #[error("Network error: {0}")]
    Transport(String),

    /// The server answered with a non-success status code.
    #[error("HTTP error! status: {status}")]
    Status {
        /// The numeric HTTP status code.
        status: u16,
        /// The raw response body, when it could be read.
        body: Option<String>,
    },

    /// The body of a successful response was not valid JSON for the target type.
    #[error("Invalid JSON: {0}")]
    Decode(#[from] serde_json::Error),
}

impl FetchError {
    /// The HTTP status code carried by this error, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            FetchError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// A standardized container for API responses.
///
/// This struct wraps the deserialized data along with metadata about the
/// HTTP transaction, such as status codes and headers.
#[derive(Debug)]
pub struct ApiResponse<T> {
    /// The successfully deserialized response body, if any.
    pub data: Option<T>,
    /// The raw error body returned by the server if the request failed.
    pub error_body: Option<String>,
    /// The numeric HTTP status code.
    pub status: u16,
    /// Indicates if the status code was in the 2xx range.
    pub success: bool,
    /// The headers returned by the server.
    pub headers: HeaderMap,
}

/// Construction options for `ApiClient`.
#[derive(Debug, Clone)]
pub struct ApiClientOptions {
    /// Total per-request timeout. `None` waits indefinitely.
    pub timeout: Option<Duration>,
    /// Number of transient-failure retries. Zero means a single attempt.
    pub max_retries: u32,
    /// Value of the `User-Agent` header.
    pub user_agent: String,
}

impl Default for ApiClientOptions {
    fn default() -> Self {
        Self {
            timeout: Some(Duration::from_secs(10)),
            max_retries: 0,
            user_agent: format!("agent-dashboard/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

/// A flexible asynchronous HTTP client.
///
/// Built on top of `reqwest_middleware`, it handles base URL joining and the
/// optional retry layer.
pub struct ApiClient {
    /// The underlying middleware-enabled client.
    inner: ClientWithMiddleware,
    /// The base URL to which all relative paths are joined. Always ends in `/`.
    base_url: Url,
}

impl ApiClient {
    /// Creates a new `ApiClient`.
    ///
    /// A base URL without a trailing slash is treated as a directory, so
    /// `http://host/prefix` joined with `api/x` yields `http://host/prefix/api/x`.
    ///
    /// # Errors
    /// Returns `FetchError::Url` if `base_url` is not an absolute URL usable as
    /// a base, and `FetchError::Client` if the TLS backend fails to initialise.
    pub fn new(base_url: &str, options: ApiClientOptions) -> Result<Self, FetchError> {
        let mut url = Url::parse(base_url)?;
        if url.cannot_be_a_base() {
            return Err(FetchError::Url(url::ParseError::RelativeUrlWithCannotBeABaseBase));
        }
        if !url.path().ends_with('/') {
            let path = format!("{}/", url.path());
            url.set_path(&path);
        }

        let mut http = reqwest::Client::builder().user_agent(options.user_agent.as_str());
        if let Some(timeout) = options.timeout {
            http = http.timeout(timeout);
        }
        let http = http
            .build()
            .map_err(|e| FetchError::Client(e.to_string()))?;

        let mut builder = ClientBuilder::new(http);
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

    /// The normalized base URL.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Performs an HTTP request and captures the response.
    ///
    /// Non-2xx statuses are not errors at this level: they come back as an
    /// `ApiResponse` with `success == false` and the body text in `error_body`.
    ///
    /// # Errors
    /// `Url` if the path cannot be joined, `Transport` if no response arrives,
    /// `Decode` if a 2xx body does not deserialize into `T`.
    pub async fn request<T>(
        &self,
        method: Method,
        path: &str,
        headers: Option<HeaderMap>,
    ) -> Result<ApiResponse<T>, FetchError>
    where
        T: DeserializeOwned,
    {
        let full_url = self.base_url.join(path)?;
        let mut req = self.inner.request(method, full_url);

        if let Some(h) = headers {
            req = req.headers(h);
        }

        let response = req
            .send()
            .await
            .map_err(|e| FetchError::Transport(e.to_string()))?;
        let status = response.status();
        let resp_headers = response.headers().clone();

        if status.is_success() {
            let bytes = response
                .bytes()
                .await
                .map_err(|e| FetchError::Transport(e.to_string()))?;
            let data = serde_json::from_slice::<T>(&bytes)?;
            Ok(ApiResponse {
                data: Some(data),
                error_body: None,
                status: status.as_u16(),
                success: true,
                headers: resp_headers,
            })
        } else {
            let error_text = response.text().await.ok();
            Ok(ApiResponse {
                data: None,
                error_body: error_text,
                status: status.as_u16(),
                success: false,
                headers: resp_headers,
            })
        }
    }

    /// GETs `path` and decodes the body, folding non-2xx statuses into
    /// `FetchError::Status`.
    pub async fn get_json<T>(&self, path: &str) -> Result<T, FetchError>
    where
        T: DeserializeOwned,
    {
        let response = self.request::<T>(Method::GET, path, None).await?;
        match response.data {
            Some(data) if response.success => Ok(data),
            _ => Err(FetchError::Status {
                status: response.status,
                body: response.error_body,
            }),
        }
    }
}
