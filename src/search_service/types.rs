use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::utils::constants::{DEFAULT_MAX_RESULTS, DEFAULT_REQUEST_TIMEOUT_SECS};
use crate::web_search::SearchResult;

/// One search-and-crawl request
///
/// Doubles as the query-string schema of `GET /search_and_crawl`, hence the
/// per-field defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchRequest {
    pub query: String,

    /// Results kept after searching (default: 3)
    #[serde(default = "default_max_results")]
    pub max_results: usize,

    /// Per-page load timeout in seconds (default: 10)
    #[serde(default = "default_timeout")]
    pub timeout: u64,

    /// Crawl every kept result and fill `raw_content` (default: false)
    #[serde(default)]
    pub include_raw_content: bool,
}

fn default_max_results() -> usize {
    DEFAULT_MAX_RESULTS
}

fn default_timeout() -> u64 {
    DEFAULT_REQUEST_TIMEOUT_SECS
}

impl SearchRequest {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            max_results: DEFAULT_MAX_RESULTS,
            timeout: DEFAULT_REQUEST_TIMEOUT_SECS,
            include_raw_content: false,
        }
    }

    #[must_use]
    pub fn max_results(mut self, max_results: usize) -> Self {
        self.max_results = max_results;
        self
    }

    #[must_use]
    pub fn timeout_secs(mut self, timeout: u64) -> Self {
        self.timeout = timeout;
        self
    }

    #[must_use]
    pub fn include_raw_content(mut self, include: bool) -> Self {
        self.include_raw_content = include;
        self
    }

    #[must_use]
    pub fn timeout_duration(&self) -> Duration {
        Duration::from_secs(self.timeout)
    }
}

/// Response body of `GET /search_and_crawl`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchResponse {
    pub results: Vec<SearchResult>,
}
