//! Login calls against the primary and secondary services.

use serde::{Deserialize, Serialize};
use tracing::instrument;

use pcq_client::{normalize_base_url, ClientConfig, HttpClient};

use crate::credentials::Credentials;
use crate::error::{Error, ErrorKind, Result};
use crate::session::{AuthScheme, Session};

/// Primary service login path.
pub const PRIMARY_LOGIN_PATH: &str = "login";

/// Secondary service login path.
pub const SECONDARY_LOGIN_PATH: &str = "api/v1/authenticate";

/// Field of the `meta_info` response holding the secondary service URL.
pub const SECONDARY_URL_FIELD: &str = "twistlockUrl";

const META_INFO_PATH: &str = "meta_info";

/// Login request body. Never logged.
#[derive(Serialize)]
struct LoginRequest<'a> {
    username: &'a str,
    password: &'a str,
}

#[derive(Deserialize)]
struct LoginResponse {
    #[serde(default)]
    token: Option<String>,
}

/// Client for the login and discovery calls.
///
/// Login requests are not retried on 4xx; transient failures (5xx, 429,
/// connection errors) follow the configured [`ClientConfig`] retry policy.
#[derive(Debug, Clone)]
pub struct LoginClient {
    http: HttpClient,
}

impl LoginClient {
    /// Create a login client with default HTTP settings.
    pub fn new() -> Result<Self> {
        Self::with_config(ClientConfig::default())
    }

    /// Create a login client with custom HTTP settings.
    pub fn with_config(config: ClientConfig) -> Result<Self> {
        let http = HttpClient::new(config)?;
        Ok(Self { http })
    }

    /// Reuse an existing HTTP client (and its connection pool).
    pub fn from_http(http: HttpClient) -> Self {
        Self { http }
    }

    /// Exchange the access key / secret key for a primary session.
    ///
    /// The returned session presents its token in the `x-redlock-auth`
    /// header.
    #[instrument(skip(self, credentials), fields(service_url = %credentials.service_url()))]
    pub async fn authenticate(&self, credentials: &Credentials) -> Result<Session> {
        credentials.validate()?;
        let base = normalize_base_url(credentials.service_url());
        let token = self.login(&base, PRIMARY_LOGIN_PATH, credentials).await?;

        tracing::info!("authenticated with primary service");
        Ok(Session::new(token, &base, AuthScheme::RedlockHeader))
    }

    /// Ask the primary service for the secondary service URL.
    ///
    /// The primary token is presented as a Bearer token for this call.
    #[instrument(skip(self, session), fields(service_url = %session.service_url()))]
    pub async fn resolve_secondary_endpoint(&self, session: &Session) -> Result<String> {
        let url = format!("{}/{}", session.service_url(), META_INFO_PATH);
        let request = self
            .http
            .get(url)
            .bearer_auth(session.token())
            .accept("application/json");

        let body: serde_json::Value = self
            .http
            .send_json(&request)
            .await
            .map_err(|e| {
                let message = e.to_string();
                Error::with_source(ErrorKind::EndpointResolutionFailed(message), e)
            })?;

        let endpoint = body
            .get(SECONDARY_URL_FIELD)
            .and_then(|v| v.as_str())
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .ok_or_else(|| {
                Error::new(ErrorKind::EndpointResolutionFailed(format!(
                    "meta_info response has no {SECONDARY_URL_FIELD}"
                )))
            })?;

        let endpoint = normalize_base_url(endpoint);
        tracing::debug!(endpoint = %endpoint, "resolved secondary endpoint");
        Ok(endpoint)
    }

    /// Log in to the secondary service.
    ///
    /// Independent of the primary session; the same access key / secret key
    /// pair is used. The returned session presents its token as a Bearer
    /// token.
    #[instrument(skip(self, credentials))]
    pub async fn authenticate_secondary(
        &self,
        secondary_url: &str,
        credentials: &Credentials,
    ) -> Result<Session> {
        credentials.validate()?;
        if secondary_url.trim().is_empty() {
            return Err(Error::new(ErrorKind::InvalidCredentials(
                "empty secondary service URL".to_string(),
            )));
        }
        let base = normalize_base_url(secondary_url);
        let token = self.login(&base, SECONDARY_LOGIN_PATH, credentials).await?;

        tracing::info!("authenticated with secondary service");
        Ok(Session::new(token, &base, AuthScheme::Bearer))
    }

    async fn login(&self, base: &str, path: &str, credentials: &Credentials) -> Result<String> {
        let body = LoginRequest {
            username: credentials.access_key(),
            password: credentials.secret_key(),
        };
        let request = self
            .http
            .post(format!("{base}/{path}"))
            .accept("application/json")
            .json(&body)
            .map_err(login_failed)?;

        let response = self.http.execute(&request).await.map_err(login_failed)?;
        let status = response.status();
        let parsed: LoginResponse = response.json().await.map_err(login_failed)?;

        parsed
            .token
            .filter(|t| !t.is_empty())
            .ok_or_else(|| {
                Error::new(ErrorKind::AuthenticationFailed {
                    status: Some(status),
                    message: "login response has no token".to_string(),
                })
            })
    }
}

fn login_failed(err: pcq_client::Error) -> Error {
    let status = err.status();
    let message = err.to_string();
    Error::with_source(ErrorKind::AuthenticationFailed { status, message }, err)
}
