//! Authenticated sessions.

use pcq_client::{normalize_base_url, RequestBuilder};

/// How a session token is presented on requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthScheme {
    /// `x-redlock-auth: <token>`, used by the primary service.
    RedlockHeader,
    /// `Authorization: Bearer <token>`, used by the secondary service.
    Bearer,
    /// `Authorization: <token>` with no prefix, accepted by the code
    /// security endpoints of the primary service.
    RawAuthorization,
}

/// An opaque token obtained from a login call, bound to the service that
/// issued it.
///
/// Sessions live for one run and are never persisted. The token is
/// redacted in Debug output.
#[derive(Clone)]
pub struct Session {
    token: String,
    service_url: String,
    scheme: AuthScheme,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("service_url", &self.service_url)
            .field("scheme", &self.scheme)
            .field("token", &"[REDACTED]")
            .finish()
    }
}

impl Session {
    /// Wrap an existing token.
    pub fn new(token: impl Into<String>, service_url: &str, scheme: AuthScheme) -> Self {
        Self {
            token: token.into(),
            service_url: normalize_base_url(service_url),
            scheme,
        }
    }

    /// The raw token.
    pub fn token(&self) -> &str {
        &self.token
    }

    /// Normalized base URL of the issuing service.
    pub fn service_url(&self) -> &str {
        &self.service_url
    }

    /// Header scheme used by [`Session::authorize`].
    pub fn scheme(&self) -> AuthScheme {
        self.scheme
    }

    /// Same token, presented with a different scheme.
    pub fn with_scheme(mut self, scheme: AuthScheme) -> Self {
        self.scheme = scheme;
        self
    }

    /// Attach this session's credentials to a request.
    pub fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match self.scheme {
            AuthScheme::RedlockHeader => request.header("x-redlock-auth", self.token.as_str()),
            AuthScheme::Bearer => request.bearer_auth(self.token.as_str()),
            AuthScheme::RawAuthorization => request.header("Authorization", self.token.as_str()),
        }
    }
}
