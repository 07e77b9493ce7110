//! Client bound to one service base URL.
//!
//! `ServiceClient` combines a base URL with the HTTP infrastructure and
//! resolves resource paths against it. It carries no credentials: callers
//! attach the session header to each request they build.

use serde::de::DeserializeOwned;

use crate::client::HttpClient;
use crate::config::ClientConfig;
use crate::error::Result;
use crate::request::RequestBuilder;
use crate::response::Response;

/// Normalize a service base URL.
///
/// Hosts given without a scheme (`api.prismacloud.io`) get `https://`;
/// explicit schemes are kept. Trailing slashes are trimmed.
pub fn normalize_base_url(base_url: &str) -> String {
    let trimmed = base_url.trim().trim_end_matches('/');
    if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
        trimmed.to_string()
    } else {
        format!("https://{}", trimmed)
    }
}

/// HTTP client bound to a single service base URL.
#[derive(Debug, Clone)]
pub struct ServiceClient {
    http: HttpClient,
    base_url: String,
}

impl ServiceClient {
    /// Create a client for `base_url` with custom configuration.
    pub fn with_config(base_url: impl AsRef<str>, config: ClientConfig) -> Result<Self> {
        Ok(Self {
            http: HttpClient::new(config)?,
            base_url: normalize_base_url(base_url.as_ref()),
        })
    }

    /// Bind an existing HTTP client to `base_url`.
    pub fn from_http(http: HttpClient, base_url: impl AsRef<str>) -> Self {
        Self {
            http,
            base_url: normalize_base_url(base_url.as_ref()),
        }
    }

    /// Get the normalized base URL.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Build the full URL for a resource path.
    ///
    /// Absolute URLs are returned unchanged; paths are joined to the base
    /// URL with exactly one slash.
    pub fn url(&self, path: &str) -> String {
        if path.starts_with("http://") || path.starts_with("https://") {
            path.to_string()
        } else {
            format!("{}/{}", self.base_url, path.trim_start_matches('/'))
        }
    }

    /// Create a GET request builder for a resource path.
    pub fn get(&self, path: &str) -> RequestBuilder {
        self.http.get(self.url(path))
    }

    /// Create a POST request builder for a resource path.
    pub fn post(&self, path: &str) -> RequestBuilder {
        self.http.post(self.url(path))
    }

    /// Create a PUT request builder for a resource path.
    pub fn put(&self, path: &str) -> RequestBuilder {
        self.http.put(self.url(path))
    }

    /// Execute a request and return the raw response.
    pub async fn execute(&self, request: &RequestBuilder) -> Result<Response> {
        self.http.execute(request).await
    }

    /// Execute a request and deserialize the JSON response.
    pub async fn send_json<T: DeserializeOwned>(&self, request: &RequestBuilder) -> Result<T> {
        self.http.send_json(request).await
    }
}
