//! When a failed request is replayed, and after how long.
//!
//! Rate limiting (429) and refused connections are always safe to replay:
//! the server never acted on the request. Timeouts and 500/502/503/504 are
//! replayed only for requests that may run twice; see
//! [`RequestBuilder::at_most_once`](crate::RequestBuilder::at_most_once).
//!
//! Waits double from `base_delay` with up to 100% random jitter, capped at
//! `max_delay`. A `Retry-After` on a 429 replaces the computed wait, capped
//! at `max_retry_after`.

use std::time::Duration;

use rand::Rng;

use crate::error::{Error, ErrorKind};

/// Server statuses treated as transient.
pub(crate) const TRANSIENT_STATUSES: [u16; 4] = [500, 502, 503, 504];

#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Replays after the first attempt.
    pub max_retries: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
    pub max_retry_after: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(30),
            max_retry_after: Duration::from_secs(60),
        }
    }
}

impl RetryConfig {
    pub fn with_max_retries(mut self, retries: u32) -> Self {
        self.max_retries = retries;
        self
    }

    pub fn with_base_delay(mut self, delay: Duration) -> Self {
        self.base_delay = delay;
        self
    }

    /// Jittered wait before replay number `retry` (0-based).
    pub fn backoff(&self, retry: u32) -> Duration {
        let base = self.base_delay.as_secs_f64() * 2f64.powi(retry.min(20) as i32);
        let jittered = base * (1.0 + rand::rng().random::<f64>());
        Duration::from_secs_f64(jittered.min(self.max_delay.as_secs_f64()))
    }
}

/// Retry budget of one `execute` call.
#[derive(Debug)]
pub(crate) struct RetryState<'a> {
    config: &'a RetryConfig,
    retries: u32,
}

impl<'a> RetryState<'a> {
    pub(crate) fn new(config: &'a RetryConfig) -> Self {
        Self { config, retries: 0 }
    }

    pub(crate) fn retries(&self) -> u32 {
        self.retries
    }

    /// Wait before replaying after `err`, or `None` once the budget is spent.
    pub(crate) fn next_delay(&mut self, err: &Error) -> Option<Duration> {
        if self.retries >= self.config.max_retries {
            return None;
        }
        let delay = match err.retry_after() {
            Some(wait) => wait.min(self.config.max_retry_after),
            None => self.config.backoff(self.retries),
        };
        self.retries += 1;
        Some(delay)
    }
}

/// Whether `err` may be answered by sending the request again.
///
/// `replayable` is false for requests marked at-most-once.
pub(crate) fn is_transient(err: &Error, replayable: bool) -> bool {
    match &err.kind {
        ErrorKind::RateLimited { .. } | ErrorKind::Connection(_) => true,
        ErrorKind::Timeout => replayable,
        ErrorKind::Status { status, .. } => replayable && TRANSIENT_STATUSES.contains(status),
        _ => false,
    }
}
