//! Error types for pcq-admin.

/// Result type alias for pcq-admin operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for pcq-admin operations.
#[derive(Debug, thiserror::Error)]
#[error("{kind}")]
pub struct Error {
    /// The kind of error that occurred.
    pub kind: ErrorKind,
    /// Optional source error.
    #[source]
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl Error {
    /// Create a new error with the given kind.
    pub fn new(kind: ErrorKind) -> Self {
        Self { kind, source: None }
    }

    /// Create a new error with the given kind and source.
    pub fn with_source(
        kind: ErrorKind,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self {
            kind,
            source: Some(Box::new(source)),
        }
    }

    /// HTTP status of the failed request, if any.
    pub fn status(&self) -> Option<u16> {
        match &self.kind {
            ErrorKind::RequestFailed { status, .. } => *status,
            _ => None,
        }
    }
}

/// The kind of error that occurred.
#[derive(Debug, thiserror::Error)]
pub enum ErrorKind {
    /// An administration request failed.
    #[error("Request failed{}: {message}", status.map(|s| format!(" ({s})")).unwrap_or_default())]
    RequestFailed {
        status: Option<u16>,
        message: String,
    },

    /// Input CSV could not be parsed.
    #[error("CSV error: {0}")]
    Csv(String),

    /// Input file could not be read.
    #[error("IO error: {0}")]
    Io(String),

    /// Input is missing required data.
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl From<pcq_client::Error> for Error {
    fn from(err: pcq_client::Error) -> Self {
        let status = err.status();
        let message = err.to_string();
        Error::with_source(ErrorKind::RequestFailed { status, message }, err)
    }
}

impl From<csv::Error> for Error {
    fn from(err: csv::Error) -> Self {
        if let csv::ErrorKind::Io(_) = err.kind() {
            return Error::with_source(ErrorKind::Io(err.to_string()), err);
        }
        Error::with_source(ErrorKind::Csv(err.to_string()), err)
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::with_source(ErrorKind::Io(err.to_string()), err)
    }
}
