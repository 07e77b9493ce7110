//! Core HTTP client with retry, timeouts, and platform error mapping.

use tracing::{debug, instrument, warn};

use crate::config::ClientConfig;
use crate::error::{Error, ErrorKind, Result};
use crate::request::{RequestBuilder, RequestMethod};
use crate::response::Response;
use crate::retry::{is_transient, RetryState};

/// HTTP client with built-in retry, timeouts, and error handling.
#[derive(Debug, Clone)]
pub struct HttpClient {
    inner: reqwest::Client,
    config: ClientConfig,
}

impl HttpClient {
    pub fn new(config: ClientConfig) -> Result<Self> {
        let inner = reqwest::Client::builder()
            .timeout(config.timeout)
            .connect_timeout(config.connect_timeout)
            .user_agent(&config.user_agent)
            .build()
            .map_err(|e| Error::with_source(ErrorKind::Setup(e.to_string()), e))?;

        Ok(Self { inner, config })
    }

    pub fn get(&self, url: impl Into<String>) -> RequestBuilder {
        RequestBuilder::new(RequestMethod::Get, url)
    }

    pub fn post(&self, url: impl Into<String>) -> RequestBuilder {
        RequestBuilder::new(RequestMethod::Post, url)
    }

    pub fn put(&self, url: impl Into<String>) -> RequestBuilder {
        RequestBuilder::new(RequestMethod::Put, url)
    }

    /// Send a request, replaying it while the failure is transient and the
    /// retry budget lasts.
    ///
    /// Any non-success answer that is not replayed comes back as an error
    /// carrying the status and the server's message.
    #[instrument(skip(self, request), fields(method = ?request.method, url = %request.url))]
    pub async fn execute(&self, request: &RequestBuilder) -> Result<Response> {
        let mut retry = self.config.retry.as_ref().map(RetryState::new);

        loop {
            let err = match self.execute_once(request).await {
                Ok(response) => return Ok(response),
                Err(err) => err,
            };
            if !is_transient(&err, request.replayable) {
                return Err(err);
            }
            let Some(state) = retry.as_mut() else {
                return Err(err);
            };
            let Some(delay) = state.next_delay(&err) else {
                let attempts = state.retries();
                return Err(Error::with_source(ErrorKind::RetriesExhausted { attempts }, err));
            };

            warn!(
                retry = state.retries(),
                delay_ms = delay.as_millis() as u64,
                error = %err,
                "request failed, retrying"
            );
            tokio::time::sleep(delay).await;
        }
    }

    async fn execute_once(&self, request: &RequestBuilder) -> Result<Response> {
        let mut req = self
            .inner
            .request(request.method.to_reqwest(), request.full_url()?);
        for (name, value) in &request.headers {
            req = req.header(name.as_str(), value.as_str());
        }
        if let Some(body) = &request.body {
            req = req.json(body);
        }

        debug!("sending request");
        let response = Response::new(req.send().await?);
        debug!(
            status = response.status(),
            content_length = response.content_length(),
            "response received"
        );

        if response.status() == 429 {
            return Err(Error::new(ErrorKind::RateLimited {
                retry_after: response.retry_after(),
            }));
        }
        response.error_for_status().await
    }

    /// Execute a request and deserialize the JSON response.
    pub async fn send_json<T: serde::de::DeserializeOwned>(
        &self,
        request: &RequestBuilder,
    ) -> Result<T> {
        let response = self.execute(request).await?;
        response.json().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::RetryConfig;
    use serde_json::json;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;
    use std::time::Duration;
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn no_retry_client() -> HttpClient {
        HttpClient::new(ClientConfig::default().without_retry()).unwrap()
    }

    fn fast_retry_client(retries: u32) -> HttpClient {
        HttpClient::new(
            ClientConfig::default().with_retry(
                RetryConfig::default()
                    .with_max_retries(retries)
                    .with_base_delay(Duration::from_millis(10)),
            ),
        )
        .unwrap()
    }

    /// Answers `first` for the first `times` calls, then 200.
    fn flaky(
        first: u16,
        times: u32,
        calls: Arc<AtomicU32>,
    ) -> impl Fn(&wiremock::Request) -> ResponseTemplate + Send + Sync + 'static {
        move |_| {
            if calls.fetch_add(1, Ordering::SeqCst) < times {
                ResponseTemplate::new(first)
            } else {
                ResponseTemplate::new(200).set_body_json(json!({"ok": true}))
            }
        }
    }

    #[tokio::test]
    async fn test_headers_and_query_are_sent() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/test"))
            .and(header("Authorization", "Bearer test-token"))
            .and(header("x-redlock-auth", "redlock-token"))
            .and(query_param("offset", "50"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true})))
            .expect(1)
            .mount(&mock_server)
            .await;

        let client = no_retry_client();
        let request = client
            .get(format!("{}/test", mock_server.uri()))
            .bearer_auth("test-token")
            .header("x-redlock-auth", "redlock-token")
            .query("offset", "50");

        let response = client.execute(&request).await.unwrap();
        assert!(response.is_success());
    }

    #[tokio::test]
    async fn test_client_error_is_not_retried() {
        let mock_server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/error"))
            .respond_with(ResponseTemplate::new(400).set_body_json(json!({"message": "invalid filter"})))
            .expect(1)
            .mount(&mock_server)
            .await;

        let client = fast_retry_client(3);
        let request = client
            .post(format!("{}/error", mock_server.uri()))
            .json_value(json!({}));

        let err = client.execute(&request).await.unwrap_err();
        assert_eq!(err.status(), Some(400));
        assert_eq!(err.to_string(), "HTTP 400: invalid filter");
    }

    #[tokio::test]
    async fn test_rate_limit_without_retry_reports_wait() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/limited"))
            .respond_with(ResponseTemplate::new(429).insert_header("Retry-After", "30"))
            .mount(&mock_server)
            .await;

        let client = no_retry_client();
        let err = client
            .execute(&client.get(format!("{}/limited", mock_server.uri())))
            .await
            .unwrap_err();

        assert_eq!(err.status(), Some(429));
        assert_eq!(err.retry_after(), Some(Duration::from_secs(30)));
    }

    #[tokio::test]
    async fn test_retry_on_503() {
        let mock_server = MockServer::start().await;
        let calls = Arc::new(AtomicU32::new(0));
        Mock::given(method("GET"))
            .and(path("/retry"))
            .respond_with(flaky(503, 2, calls.clone()))
            .mount(&mock_server)
            .await;

        let client = fast_retry_client(3);
        let response = client
            .execute(&client.get(format!("{}/retry", mock_server.uri())))
            .await
            .unwrap();

        assert!(response.is_success());
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_retries_exhausted_keeps_last_status() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/down"))
            .respond_with(ResponseTemplate::new(502))
            .expect(3)
            .mount(&mock_server)
            .await;

        let client = fast_retry_client(2);
        let err = client
            .execute(&client.get(format!("{}/down", mock_server.uri())))
            .await
            .unwrap_err();

        assert!(matches!(err.kind, ErrorKind::RetriesExhausted { attempts: 2 }));
        assert_eq!(err.status(), Some(502));
    }

    #[tokio::test]
    async fn test_at_most_once_post_is_not_replayed_on_5xx() {
        let mock_server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/accounts"))
            .respond_with(ResponseTemplate::new(500).set_body_json(json!({"message": "backend busy"})))
            .expect(1)
            .mount(&mock_server)
            .await;

        let client = fast_retry_client(3);
        let request = client
            .post(format!("{}/accounts", mock_server.uri()))
            .json_value(json!({"accountId": "sub-1"}))
            .at_most_once();

        let err = client.execute(&request).await.unwrap_err();
        assert_eq!(err.status(), Some(500));
        assert_eq!(err.to_string(), "HTTP 500: backend busy");
    }

    #[tokio::test]
    async fn test_at_most_once_post_is_replayed_after_429() {
        let mock_server = MockServer::start().await;
        let calls = Arc::new(AtomicU32::new(0));
        Mock::given(method("POST"))
            .and(path("/accounts"))
            .respond_with(flaky(429, 1, calls.clone()))
            .mount(&mock_server)
            .await;

        let client = fast_retry_client(3);
        let request = client
            .post(format!("{}/accounts", mock_server.uri()))
            .json_value(json!({}))
            .at_most_once();

        client.execute(&request).await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_send_json_reports_malformed_body() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/garbage"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>"))
            .mount(&mock_server)
            .await;

        let client = no_retry_client();
        let result: Result<serde_json::Value> = client
            .send_json(&client.get(format!("{}/garbage", mock_server.uri())))
            .await;

        assert!(matches!(result.unwrap_err().kind, ErrorKind::Json(_)));
    }
}
