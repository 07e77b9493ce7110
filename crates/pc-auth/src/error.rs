//! Error types for pcq-auth.
//!
//! Error messages are designed to avoid exposing credential data.

/// Result type alias for pcq-auth operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for pcq-auth operations.
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

    /// Returns true if a login was rejected or returned no token.
    pub fn is_authentication_failed(&self) -> bool {
        matches!(self.kind, ErrorKind::AuthenticationFailed { .. })
    }

    /// HTTP status of the failed call, when the server answered at all.
    pub fn status(&self) -> Option<u16> {
        match &self.kind {
            ErrorKind::AuthenticationFailed { status, .. } => *status,
            _ => None,
        }
    }
}

/// The kind of error that occurred.
#[derive(Debug, thiserror::Error)]
pub enum ErrorKind {
    /// Login rejected, unreachable, or answered without a token.
    ///
    /// `status` is `None` for transport failures and malformed bodies.
    #[error("Authentication failed{}: {message}", status.map(|s| format!(" ({s})")).unwrap_or_default())]
    AuthenticationFailed {
        status: Option<u16>,
        message: String,
    },

    /// The secondary service URL could not be discovered.
    #[error("Endpoint resolution failed: {0}")]
    EndpointResolutionFailed(String),

    /// Invalid credentials configuration.
    #[error("Invalid credentials: {0}")]
    InvalidCredentials(String),

    /// HTTP client could not be built.
    #[error("Client error: {0}")]
    Client(String),
}

impl From<pcq_client::Error> for Error {
    fn from(err: pcq_client::Error) -> Self {
        Error::with_source(ErrorKind::Client(err.to_string()), err)
    }
}
