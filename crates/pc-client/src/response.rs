//! HTTP response handling with platform-specific extensions.

use serde::de::DeserializeOwned;
use std::sync::LazyLock;
use std::time::Duration;

use crate::error::{Error, ErrorKind, Result};

/// Wrapper around HTTP response with additional functionality.
#[derive(Debug)]
pub struct Response {
    inner: reqwest::Response,
}

impl Response {
    pub(crate) fn new(inner: reqwest::Response) -> Self {
        Self { inner }
    }

    /// Get the HTTP status code.
    pub fn status(&self) -> u16 {
        self.inner.status().as_u16()
    }

    /// Returns true if the response status is successful (2xx).
    pub fn is_success(&self) -> bool {
        self.inner.status().is_success()
    }

    /// Get a header value.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.inner.headers().get(name)?.to_str().ok()
    }

    /// Get the Retry-After header as a Duration.
    ///
    /// Only the delay-seconds form is understood.
    pub fn retry_after(&self) -> Option<Duration> {
        self.header("retry-after")?
            .trim()
            .parse::<u64>()
            .ok()
            .map(Duration::from_secs)
    }

    /// Get the `Total-count` header used by offset-paged endpoints.
    pub fn total_count(&self) -> Option<u64> {
        self.header("total-count")?.trim().parse().ok()
    }

    /// Get the Content-Type header.
    pub fn content_type(&self) -> Option<&str> {
        self.header("content-type")
    }

    /// Get the Content-Length, when the server announced one.
    pub fn content_length(&self) -> Option<u64> {
        self.inner.content_length()
    }

    /// Get the response body as text.
    pub async fn text(self) -> Result<String> {
        self.inner.text().await.map_err(Into::into)
    }

    /// Read the next chunk of the body, or `None` once the body is done.
    pub async fn chunk(&mut self) -> Result<Option<bytes::Bytes>> {
        self.inner.chunk().await.map_err(Into::into)
    }

    /// Deserialize the response body as JSON.
    ///
    /// The body is read as text first so that a parse failure reports a
    /// `Json` error rather than a transport error.
    pub async fn json<T: DeserializeOwned>(self) -> Result<T> {
        let body = self.text().await?;
        serde_json::from_str(&body).map_err(Into::into)
    }

    /// Turn a non-success answer into an error carrying the server's
    /// explanation.
    pub(crate) async fn error_for_status(self) -> Result<Response> {
        if self.is_success() {
            return Ok(self);
        }

        let status = self.status();
        let status_header = self.header("x-redlock-status").map(str::to_owned);
        let body = self.text().await.unwrap_or_default();
        Err(parse_error_response(status, &body, status_header.as_deref()))
    }
}

/// Platform error body format: `{"message": "..."}`.
#[derive(Debug, serde::Deserialize)]
struct ApiErrorBody {
    message: Option<String>,
    err: Option<String>,
}

/// Entry of the `x-redlock-status` header: a JSON array of i18n keys.
#[derive(Debug, serde::Deserialize)]
struct RedlockStatus {
    #[serde(rename = "i18nKey")]
    i18n_key: Option<String>,
    subject: Option<String>,
}

/// Build an error from a non-success status and its body.
fn parse_error_response(status: u16, body: &str, status_header: Option<&str>) -> Error {
    let message = serde_json::from_str::<ApiErrorBody>(body)
        .ok()
        .and_then(|b| b.message.or(b.err))
        .or_else(|| {
            let entries: Vec<RedlockStatus> = serde_json::from_str(status_header?).ok()?;
            let entry = entries.into_iter().next()?;
            match (entry.i18n_key, entry.subject) {
                (Some(key), Some(subject)) => Some(format!("{key} ({subject})")),
                (Some(key), None) => Some(key),
                _ => None,
            }
        })
        .unwrap_or_else(|| body.to_string());

    let message = sanitize_error_message(&message);
    match status {
        429 => Error::new(ErrorKind::RateLimited { retry_after: None }),
        _ => Error::new(ErrorKind::Status { status, message }),
    }
}

static JWT_PATTERN: LazyLock<regex_lite::Regex> = LazyLock::new(|| {
    regex_lite::Regex::new(r"eyJ[A-Za-z0-9_-]{5,}\.[A-Za-z0-9_-]+\.[A-Za-z0-9_-]*")
        .expect("JWT pattern is valid")
});

static BEARER_PATTERN: LazyLock<regex_lite::Regex> = LazyLock::new(|| {
    regex_lite::Regex::new(r"(?i)(bearer|x-redlock-auth[:=]?|authorization[:=])\s+[A-Za-z0-9._~+/=-]{8,}")
        .expect("bearer pattern is valid")
});

/// Sanitize an error message to prevent exposing sensitive data.
///
/// - Redacts JWT-shaped tokens and `Bearer`, `x-redlock-auth` and raw
///   `Authorization:` values
/// - Truncates messages longer than 500 bytes
pub fn sanitize_error_message(message: &str) -> String {
    const MAX_LENGTH: usize = 500;

    let sanitized = JWT_PATTERN.replace_all(message, "[REDACTED_TOKEN]");
    let mut sanitized = BEARER_PATTERN
        .replace_all(&sanitized, "$1 [REDACTED]")
        .into_owned();

    if sanitized.len() > MAX_LENGTH {
        let mut cut = MAX_LENGTH;
        while !sanitized.is_char_boundary(cut) {
            cut -= 1;
        }
        sanitized.truncate(cut);
        sanitized.push_str("...[truncated]");
    }

    sanitized
}
