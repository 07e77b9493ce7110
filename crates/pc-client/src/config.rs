//! HTTP client settings.

use std::time::Duration;

use crate::retry::RetryConfig;

/// Timeouts and retry behavior shared by every request of a client.
///
/// ```rust,ignore
/// let config = ClientConfig::default()
///     .with_timeout(Duration::from_secs(60))
///     .without_retry();
/// ```
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// `None` sends every request exactly once.
    pub retry: Option<RetryConfig>,
    /// Whole round trip, body included.
    pub timeout: Duration,
    pub connect_timeout: Duration,
    pub user_agent: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            retry: Some(RetryConfig::default()),
            timeout: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(10),
            user_agent: crate::USER_AGENT.to_string(),
        }
    }
}

impl ClientConfig {
    /// Export downloads can take minutes to generate and transfer.
    pub fn for_downloads() -> Self {
        Self::default().with_timeout(Duration::from_secs(600))
    }

    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = Some(retry);
        self
    }

    pub fn without_retry(mut self) -> Self {
        self.retry = None;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }
}
