//! Search-and-crawl backends
//!
//! [`SearchBackend`] is the seam between the research pipeline (and the HTTP
//! endpoint) and whatever actually runs the browsers: in-process through
//! [`LocalSearchService`], or a remote service through
//! [`RemoteSearchBackend`].

mod local;
mod remote;
mod types;

pub use local::LocalSearchService;
pub use remote::{DEFAULT_REMOTE_TIMEOUT, RemoteSearchBackend};
pub use types::{SearchRequest, SearchResponse};

use anyhow::Result;
use async_trait::async_trait;

use crate::browser_pool::PoolStats;
use crate::web_search::SearchResult;

#[async_trait]
pub trait SearchBackend: Send + Sync {
    /// Search for `request.query`, keep at most `max_results` hits and
    /// optionally crawl them
    ///
    /// An engine that keeps returning nothing is not an error: the result is
    /// an empty list. Errors are reserved for the backend itself being
    /// unreachable.
    async fn search_and_crawl(&self, request: &SearchRequest) -> Result<Vec<SearchResult>>;

    /// Pool counters, when the backend owns a pool
    fn pool_stats(&self) -> Option<PoolStats> {
        None
    }
}
