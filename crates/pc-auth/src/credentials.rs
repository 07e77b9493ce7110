//! Access key credentials.
//!
//! `Credentials` is injected configuration: this crate never reads the
//! environment or the filesystem to obtain it.

use crate::error::{Error, ErrorKind, Result};

/// Service URL plus access key / secret key pair.
///
/// The secret key is redacted in Debug output.
#[derive(Clone)]
pub struct Credentials {
    service_url: String,
    access_key: String,
    secret_key: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("service_url", &self.service_url)
            .field("access_key", &self.access_key)
            .field("secret_key", &"[REDACTED]")
            .finish()
    }
}

impl Credentials {
    /// Create credentials for the given service.
    pub fn new(
        service_url: impl Into<String>,
        access_key: impl Into<String>,
        secret_key: impl Into<String>,
    ) -> Self {
        Self {
            service_url: service_url.into(),
            access_key: access_key.into(),
            secret_key: secret_key.into(),
        }
    }

    /// Primary service base URL, as configured.
    pub fn service_url(&self) -> &str {
        &self.service_url
    }

    /// Access key (login username).
    pub fn access_key(&self) -> &str {
        &self.access_key
    }

    /// Secret key (login password).
    pub fn secret_key(&self) -> &str {
        &self.secret_key
    }

    /// Check that no field is blank.
    pub fn validate(&self) -> Result<()> {
        let missing: Vec<&str> = [
            ("service_url", &self.service_url),
            ("access_key", &self.access_key),
            ("secret_key", &self.secret_key),
        ]
        .into_iter()
        .filter(|(_, value)| value.trim().is_empty())
        .map(|(name, _)| name)
        .collect();

        if missing.is_empty() {
            Ok(())
        } else {
            Err(Error::new(ErrorKind::InvalidCredentials(format!(
                "empty {}",
                missing.join(", ")
            ))))
        }
    }
}
