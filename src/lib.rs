//! # pcq
//!
//! Authenticated, paginated query client for the Prisma Cloud APIs, plus the
//! `pcq` command line built on it.
//!
//! ## Security
//!
//! - Secrets and session tokens are redacted in Debug output
//! - Tracing spans skip credential parameters
//! - Error messages are sanitized before they carry response text
//!
//! ## Crates
//!
//! - **pcq-client** - HTTP infrastructure: retry with backoff, timeouts, error taxonomy
//! - **pcq-auth** - Primary login, secondary (Compute) endpoint discovery and login
//! - **pcq-query** - Cursor, offset and streaming queries; CSV/JSON/gzip export
//! - **pcq-admin** - Org member features, Azure onboarding, policy labels
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use pcq::{AppConfig, LoginClient, QueryClient};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> anyhow::Result<()> {
//!     let config = AppConfig::from_env()?;
//!
//!     let login = LoginClient::new()?;
//!     let primary = login.authenticate(&config.credentials).await?;
//!     let compute_url = login.resolve_secondary_endpoint(&primary).await?;
//!     let compute = login
//!         .authenticate_secondary(&compute_url, &config.credentials)
//!         .await?;
//!
//!     let defenders = QueryClient::new(compute)?
//!         .run_offset_paged_query("api/v33.01/defenders", &[("type", "serverLinux")], 50)
//!         .await?;
//!     println!("{} defenders", defenders.len());
//!     Ok(())
//! }
//! ```

pub mod cli;
pub mod config;
pub mod logging;

// Re-export all crates for convenient access
pub use pcq_admin as admin;
pub use pcq_auth as auth;
pub use pcq_client as client;
pub use pcq_query as query;

// Re-export commonly used types at the top level
pub use config::AppConfig;
pub use logging::{LogSink, LoggingConfig};
pub use pcq_admin::AdminClient;
pub use pcq_auth::{Credentials, LoginClient, Session};
pub use pcq_client::{ClientConfig, RetryConfig};
pub use pcq_query::{QueryClient, QueryOptions};
