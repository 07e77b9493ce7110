//! Error types for pcq-query.

use serde_json::Value;

/// Result type alias for pcq-query operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for pcq-query operations.
///
/// A failed paginated query keeps the records fetched before the failure;
/// see [`Error::partial_records`].
#[derive(Debug, thiserror::Error)]
#[error("{kind}")]
pub struct Error {
    /// The kind of error that occurred.
    pub kind: ErrorKind,
    /// Optional source error.
    #[source]
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
    partial: Vec<Value>,
}

impl Error {
    /// Create a new error with the given kind.
    pub fn new(kind: ErrorKind) -> Self {
        Self {
            kind,
            source: None,
            partial: Vec::new(),
        }
    }

    /// Create a new error with the given kind and source.
    pub fn with_source(
        kind: ErrorKind,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self {
            kind,
            source: Some(Box::new(source)),
            partial: Vec::new(),
        }
    }

    /// Attach the records fetched before the failure.
    pub(crate) fn with_partial(mut self, records: Vec<Value>) -> Self {
        self.partial = records;
        self
    }

    /// Records fetched before the query failed, in server order.
    pub fn partial_records(&self) -> &[Value] {
        &self.partial
    }

    /// Take ownership of the records fetched before the failure.
    pub fn into_partial_records(self) -> Vec<Value> {
        self.partial
    }

    /// HTTP status of the failed request, if any.
    pub fn status(&self) -> Option<u16> {
        match &self.kind {
            ErrorKind::QueryFailed { status, .. } => *status,
            _ => None,
        }
    }

    pub(crate) fn query_failed(
        status: Option<u16>,
        message: impl Into<String>,
        pages_fetched: usize,
    ) -> Self {
        Self::new(ErrorKind::QueryFailed {
            status,
            message: message.into(),
            pages_fetched,
        })
    }

    /// Wrap a client error as a failed query.
    pub(crate) fn from_client(err: pcq_client::Error, pages_fetched: usize) -> Self {
        let status = err.status();
        let message = err.to_string();
        Self::with_source(
            ErrorKind::QueryFailed {
                status,
                message,
                pages_fetched,
            },
            err,
        )
    }
}

/// The kind of error that occurred.
#[derive(Debug, thiserror::Error)]
pub enum ErrorKind {
    /// A query request failed or returned a malformed page.
    #[error("Query failed after {pages_fetched} page(s): {message}")]
    QueryFailed {
        status: Option<u16>,
        message: String,
        pages_fetched: usize,
    },

    /// The server kept reporting more pages past the configured bound.
    #[error("Page limit of {max_pages} exceeded")]
    PageLimitExceeded { max_pages: usize },

    /// Filesystem error while persisting or reading output.
    #[error("IO error: {0}")]
    Io(String),

    /// Gzip decompression failed.
    #[error("Decompression failed: {0}")]
    Decompress(String),

    /// CSV serialization failed.
    #[error("CSV error: {0}")]
    Csv(String),

    /// JSON serialization failed.
    #[error("JSON error: {0}")]
    Json(String),
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::with_source(ErrorKind::Io(err.to_string()), err)
    }
}

impl From<csv::Error> for Error {
    fn from(err: csv::Error) -> Self {
        Error::with_source(ErrorKind::Csv(err.to_string()), err)
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::with_source(ErrorKind::Json(err.to_string()), err)
    }
}

impl From<pcq_client::Error> for Error {
    fn from(err: pcq_client::Error) -> Self {
        Error::from_client(err, 0)
    }
}
