//! Query client.

use serde_json::{Map, Value};
use tracing::{debug, info, instrument};

use pcq_auth::Session;
use pcq_client::{ClientConfig, HttpClient, ServiceClient};

use crate::error::{Error, ErrorKind, Result};
use crate::options::QueryOptions;
use crate::page::{parse_offset_page, OffsetResult, ResultPage};
use crate::stream::ByteStream;

/// Executes queries with one authenticated session.
///
/// The session decides both the base URL and how the token is presented:
/// primary sessions send `x-redlock-auth`, secondary sessions send a Bearer
/// token.
///
/// # Example
///
/// ```rust,ignore
/// use pcq_query::{QueryClient, QueryOptions};
///
/// let client = QueryClient::new(compute_session)?
///     .with_options(QueryOptions::default().with_max_pages(500));
///
/// let defenders = client
///     .run_offset_paged_query("api/v33.01/defenders", &[("type", "serverLinux")], 50)
///     .await?;
/// ```
#[derive(Debug, Clone)]
pub struct QueryClient {
    service: ServiceClient,
    session: Session,
    options: QueryOptions,
}

impl QueryClient {
    /// Create a query client with default HTTP settings.
    pub fn new(session: Session) -> Result<Self> {
        Self::with_config(session, ClientConfig::default())
    }

    /// Create a query client with custom HTTP settings.
    pub fn with_config(session: Session, config: ClientConfig) -> Result<Self> {
        let service = ServiceClient::with_config(session.service_url(), config)?;
        Ok(Self {
            service,
            session,
            options: QueryOptions::default(),
        })
    }

    /// Create a query client sharing an existing HTTP client.
    pub fn from_http(http: HttpClient, session: Session) -> Self {
        Self {
            service: ServiceClient::from_http(http, session.service_url()),
            session,
            options: QueryOptions::default(),
        }
    }

    /// Replace the execution options.
    pub fn with_options(mut self, options: QueryOptions) -> Self {
        self.options = options;
        self
    }

    /// The session used for every request.
    pub fn session(&self) -> &Session {
        &self.session
    }

    /// The execution options.
    pub fn options(&self) -> &QueryOptions {
        &self.options
    }

    /// Run a cursor-paginated query and return every record in server order.
    ///
    /// `query` must be a JSON object; it is sent with
    /// `useSearchAfterPagination: true` and `limit: page_size`. While a page
    /// reports `hasNext`, the query is resent with that page's `searchAfter`
    /// cursor.
    ///
    /// On failure the error carries the records fetched so far
    /// ([`Error::partial_records`]).
    #[instrument(skip(self, query), fields(service_url = %self.service.base_url()))]
    pub async fn run_paginated_query(
        &self,
        resource_path: &str,
        query: &Value,
        page_size: u32,
    ) -> Result<Vec<Value>> {
        check_page_size(page_size)?;
        let mut body = query_object(query)?;
        body.insert("useSearchAfterPagination".to_string(), Value::Bool(true));
        body.insert("limit".to_string(), Value::from(page_size));

        let mut records = Vec::new();
        let mut pages = 0usize;

        loop {
            if pages >= self.options.max_pages {
                return Err(Error::new(ErrorKind::PageLimitExceeded {
                    max_pages: self.options.max_pages,
                })
                .with_partial(records));
            }

            let request = self
                .session
                .authorize(self.service.post(resource_path))
                .accept("application/json")
                .json_value(Value::Object(body.clone()));

            let page: ResultPage = match self.service.send_json(&request).await {
                Ok(page) => page,
                Err(e) => return Err(Error::from_client(e, pages).with_partial(records)),
            };

            pages += 1;
            let has_next = page.has_next;
            let cursor = page.cursor().cloned();
            records.extend(page.data);
            debug!(page = pages, total_records = records.len(), has_next, "page fetched");

            if !has_next {
                break;
            }

            match cursor {
                Some(cursor) => {
                    body.insert("searchAfter".to_string(), cursor);
                }
                None => {
                    return Err(Error::query_failed(
                        None,
                        "page reports hasNext without a searchAfter cursor",
                        pages,
                    )
                    .with_partial(records));
                }
            }
        }

        info!(pages, records = records.len(), "paginated query complete");
        Ok(records)
    }

    /// Run a single request whose body is returned as a byte stream.
    ///
    /// The query is POSTed as JSON with `Accept: application/octet-stream`.
    /// No pagination is applied.
    #[instrument(skip(self, query), fields(service_url = %self.service.base_url()))]
    pub async fn run_streaming_query(&self, resource_path: &str, query: &Value) -> Result<ByteStream> {
        let request = self
            .session
            .authorize(self.service.post(resource_path))
            .accept("application/octet-stream")
            .json_value(query.clone());

        let response = self
            .service
            .execute(&request)
            .await
            .map_err(|e| Error::from_client(e, 0))?;

        let stream = ByteStream::new(response);
        info!(
            content_type = stream.content_type(),
            content_length = stream.content_length(),
            "streaming query started"
        );
        Ok(stream)
    }

    /// Run an offset-paged GET query and return every record in offset order.
    ///
    /// The first request (`offset=0`) must carry a `Total-count` header;
    /// its records form page 0. Remaining pages are requested at offsets
    /// `page_size, 2 * page_size, ...` while below the total.
    pub async fn run_offset_paged_query<K, V>(
        &self,
        resource_path: &str,
        params: &[(K, V)],
        page_size: u32,
    ) -> Result<Vec<Value>>
    where
        K: AsRef<str> + std::fmt::Debug,
        V: AsRef<str> + std::fmt::Debug,
    {
        self.run_offset_paged_query_with_total(resource_path, params, page_size)
            .await
            .map(|result| result.records)
    }

    /// Same as [`QueryClient::run_offset_paged_query`], also returning the
    /// `Total-count` the server reported.
    #[instrument(skip(self, params), fields(service_url = %self.service.base_url()))]
    pub async fn run_offset_paged_query_with_total<K, V>(
        &self,
        resource_path: &str,
        params: &[(K, V)],
        page_size: u32,
    ) -> Result<OffsetResult>
    where
        K: AsRef<str> + std::fmt::Debug,
        V: AsRef<str> + std::fmt::Debug,
    {
        check_page_size(page_size)?;
        let page_size = u64::from(page_size);

        let response = self
            .service
            .execute(&self.offset_request(resource_path, params, 0, page_size))
            .await
            .map_err(|e| Error::from_client(e, 0))?;

        let total = response.total_count().ok_or_else(|| {
            Error::query_failed(
                Some(response.status()),
                "response is missing a valid Total-count header",
                0,
            )
        })?;

        let mut records = self.read_offset_page(response, 0, Vec::new()).await?;
        let mut pages = 1usize;
        debug!(total, page_size, "first offset page fetched");

        let mut offset = page_size;
        while offset < total {
            if pages >= self.options.max_pages {
                return Err(Error::new(ErrorKind::PageLimitExceeded {
                    max_pages: self.options.max_pages,
                })
                .with_partial(records));
            }

            let request = self.offset_request(resource_path, params, offset, page_size);
            let response = match self.service.execute(&request).await {
                Ok(response) => response,
                Err(e) => return Err(Error::from_client(e, pages).with_partial(records)),
            };
            records = self.read_offset_page(response, pages, records).await?;
            pages += 1;
            debug!(offset, total_records = records.len(), "offset page fetched");
            offset += page_size;
        }

        info!(pages, total, records = records.len(), "offset query complete");
        Ok(OffsetResult { total, records })
    }

    fn offset_request<K, V>(
        &self,
        resource_path: &str,
        params: &[(K, V)],
        offset: u64,
        limit: u64,
    ) -> pcq_client::RequestBuilder
    where
        K: AsRef<str>,
        V: AsRef<str>,
    {
        self.session
            .authorize(self.service.get(resource_path))
            .accept("application/json")
            .query_pairs(params.iter().map(|(k, v)| (k.as_ref(), v.as_ref())))
            .query("offset", offset.to_string())
            .query("limit", limit.to_string())
    }

    async fn read_offset_page(
        &self,
        response: pcq_client::Response,
        pages: usize,
        mut records: Vec<Value>,
    ) -> Result<Vec<Value>> {
        let body = match response.text().await {
            Ok(body) => body,
            Err(e) => return Err(Error::from_client(e, pages).with_partial(records)),
        };
        match parse_offset_page(&body) {
            Ok(page) => {
                records.extend(page);
                Ok(records)
            }
            Err(e) => Err(Error::with_source(
                ErrorKind::QueryFailed {
                    status: None,
                    message: format!("malformed page: {e}"),
                    pages_fetched: pages,
                },
                e,
            )
            .with_partial(records)),
        }
    }
}

fn check_page_size(page_size: u32) -> Result<()> {
    if page_size == 0 {
        return Err(Error::query_failed(None, "page size must be positive", 0));
    }
    Ok(())
}

fn query_object(query: &Value) -> Result<Map<String, Value>> {
    match query {
        Value::Object(map) => Ok(map.clone()),
        Value::Null => Ok(Map::new()),
        _ => Err(Error::query_failed(None, "query must be a JSON object", 0)),
    }
}
