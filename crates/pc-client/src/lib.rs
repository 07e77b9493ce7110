//! # pcq-client
//!
//! Core HTTP client infrastructure for the cloud security platform APIs.
//!
//! This crate provides the foundational HTTP client with:
//! - Retry with exponential backoff and jitter for 429 and transient 5xx,
//!   honoring `Retry-After`; at-most-once requests are never replayed
//!   after they may have reached the server
//! - Request and connect timeouts on every call
//! - Transparent gzip/deflate response decoding
//! - Sanitized error messages (tokens never leak into logs)
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    Application Layer                        │
//! │  (pcq-auth, pcq-query, pcq-admin)                           │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     ServiceClient                           │
//! │  - Holds the service base URL + HTTP client                 │
//! │  - Resolves resource paths to full URLs                     │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      HttpClient                             │
//! │  - Raw HTTP with retry, timeouts, rate limiting             │
//! │  - Response error mapping                                   │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Example
//!
//! ```rust,ignore
//! use pcq_client::ServiceClient;
//!
//! let client = ServiceClient::new("api.prismacloud.io")?;
//! let request = client
//!     .get("meta_info")
//!     .bearer_auth(token);
//! let meta: serde_json::Value = client.send_json(&request).await?;
//! ```

mod client;
mod config;
mod error;
mod request;
mod response;
mod retry;
mod service;

pub use client::HttpClient;
pub use config::ClientConfig;
pub use error::{Error, ErrorKind, Result};
pub use request::{RequestBuilder, RequestMethod};
pub use response::{sanitize_error_message, Response};
pub use retry::RetryConfig;
pub use service::{normalize_base_url, ServiceClient};

/// User-Agent string for the client
pub const USER_AGENT: &str = concat!("pcq/", env!("CARGO_PKG_VERSION"));
