//! # pcq-query
//!
//! Query execution against the cloud security platform.
//!
//! Three pagination styles are supported, all strictly sequential:
//!
//! - **Cursor** ([`QueryClient::run_paginated_query`]): POST the query with
//!   `useSearchAfterPagination`, then resend it with the previous page's
//!   `searchAfter` cursor while `hasNext` is true.
//! - **Offset** ([`QueryClient::run_offset_paged_query`]): GET with
//!   `offset`/`limit`, using the `Total-count` header of the first response
//!   to plan the remaining pages.
//! - **Streaming** ([`QueryClient::run_streaming_query`]): a single POST
//!   whose body is returned as a [`ByteStream`], typically a gzip CSV.
//!
//! The [`export`] module writes results to disk as CSV, JSON or
//! decompressed gzip.
//!
//! ## Example
//!
//! ```rust,ignore
//! use pcq_query::{QueryClient, export};
//!
//! let client = QueryClient::new(session)?;
//! let records = client
//!     .run_paginated_query("code/api/v2/code-issues/branch_scan", &filters, 1000)
//!     .await?;
//! export::write_csv("appsec_licenses.csv", &records)?;
//! ```

mod client;
mod error;
pub mod export;
mod options;
mod page;
mod stream;

pub use client::QueryClient;
pub use error::{Error, ErrorKind, Result};
pub use options::QueryOptions;
pub use page::{OffsetResult, ResultPage};
pub use stream::ByteStream;
