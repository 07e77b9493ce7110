//! # pcq-auth
//!
//! Authentication against the cloud security platform.
//!
//! ## Security
//!
//! - Secrets and session tokens are redacted in Debug output
//! - Tracing spans skip credential parameters
//! - Error messages are sanitized before they carry any response text
//!
//! ## Flow
//!
//! 1. [`LoginClient::authenticate`] exchanges an access key / secret key
//!    pair for a primary [`Session`] (`POST /login`).
//! 2. [`LoginClient::resolve_secondary_endpoint`] asks the primary service
//!    where the secondary (Compute) service lives (`GET /meta_info`).
//! 3. [`LoginClient::authenticate_secondary`] logs in to that service
//!    independently (`POST /api/v1/authenticate`).
//!
//! ```rust,ignore
//! use pcq_auth::{Credentials, LoginClient};
//!
//! let creds = Credentials::new("api.prismacloud.io", access_key, secret_key);
//! let login = LoginClient::new()?;
//!
//! let primary = login.authenticate(&creds).await?;
//! let compute_url = login.resolve_secondary_endpoint(&primary).await?;
//! let compute = login.authenticate_secondary(&compute_url, &creds).await?;
//! ```

mod credentials;
mod error;
mod login;
mod session;

pub use credentials::Credentials;
pub use error::{Error, ErrorKind, Result};
pub use login::{LoginClient, PRIMARY_LOGIN_PATH, SECONDARY_LOGIN_PATH, SECONDARY_URL_FIELD};
pub use session::{AuthScheme, Session};
