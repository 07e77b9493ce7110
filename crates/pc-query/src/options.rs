/// Default bound on the number of pages one query may fetch.
pub const DEFAULT_MAX_PAGES: usize = 10_000;

/// Query execution options.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueryOptions {
    /// Maximum number of pages fetched before the query is aborted with
    /// `PageLimitExceeded`.
    pub max_pages: usize,
}

impl Default for QueryOptions {
    fn default() -> Self {
        Self {
            max_pages: DEFAULT_MAX_PAGES,
        }
    }
}

impl QueryOptions {
    /// Set the page bound.
    pub fn with_max_pages(mut self, max_pages: usize) -> Self {
        self.max_pages = max_pages;
        self
    }
}
