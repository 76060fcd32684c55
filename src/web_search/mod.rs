//! Web search through pooled browser sessions
//!
//! Loads a Bing results page in a leased session and parses it into
//! structured [`SearchResult`]s. Search failures never propagate: the client
//! logs them and returns an empty list, leaving retry decisions to the
//! caller.

mod parser;
mod types;

pub use parser::{build_search_url, parse_results};
pub use types::{
    CAPTION_SELECTOR, MAX_QUERY_LENGTH, RecencyFilter, SEARCH_RESULT_SELECTOR, SearchResult,
    TITLE_LINK_SELECTOR,
};

use anyhow::Result;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::browser_pool::{BrowserSession, SessionFactory, SessionPool};
use crate::utils::constants::{BING_SEARCH_URL, PAGE_SOURCE_TIMEOUT_SECS};
use crate::utils::with_timeout;

/// Search client bound to a session pool
pub struct SearchClient<F: SessionFactory> {
    pool: Arc<SessionPool<F>>,
    engine_url: String,
    recency: RecencyFilter,
    page_source_timeout: Duration,
}

impl<F: SessionFactory> Clone for SearchClient<F> {
    fn clone(&self) -> Self {
        Self {
            pool: Arc::clone(&self.pool),
            engine_url: self.engine_url.clone(),
            recency: self.recency,
            page_source_timeout: self.page_source_timeout,
        }
    }
}

impl<F: SessionFactory> SearchClient<F> {
    pub fn new(pool: Arc<SessionPool<F>>) -> Self {
        Self {
            pool,
            engine_url: BING_SEARCH_URL.to_string(),
            recency: RecencyFilter::default(),
            page_source_timeout: Duration::from_secs(PAGE_SOURCE_TIMEOUT_SECS),
        }
    }

    /// Point the client at a different results-page endpoint
    #[must_use]
    pub fn with_engine_url(mut self, engine_url: impl Into<String>) -> Self {
        self.engine_url = engine_url.into();
        self
    }

    #[must_use]
    pub fn with_recency(mut self, recency: RecencyFilter) -> Self {
        self.recency = recency;
        self
    }

    #[must_use]
    pub fn with_page_source_timeout(mut self, timeout: Duration) -> Self {
        self.page_source_timeout = timeout;
        self
    }

    #[must_use]
    pub fn pool(&self) -> &Arc<SessionPool<F>> {
        &self.pool
    }

    /// Search for `query`, bounding the page load by `timeout`
    ///
    /// The session is always released, whether or not the load succeeded.
    /// Any failure (invalid query, pool shut down, navigation or page-source
    /// timeout) is logged and yields an empty list.
    pub async fn search(&self, query: &str, timeout: Duration) -> Vec<SearchResult> {
        let query = query.trim();
        if query.is_empty() {
            warn!("Ignoring empty search query");
            return Vec::new();
        }
        if query.chars().count() > MAX_QUERY_LENGTH {
            warn!(
                "Ignoring search query of {} characters (maximum {MAX_QUERY_LENGTH})",
                query.chars().count()
            );
            return Vec::new();
        }

        let url = match build_search_url(&self.engine_url, query, self.recency) {
            Ok(url) => url,
            Err(e) => {
                warn!("[Search Error] {e:#}");
                return Vec::new();
            }
        };

        let lease = match self.pool.acquire().await {
            Ok(lease) => lease,
            Err(e) => {
                warn!("[Search Error] {e}");
                return Vec::new();
            }
        };
        debug!(session_id = %lease.id(), "Searching '{query}' via {url}");

        let page_source = self.load_results_page(&*lease, url.as_str(), timeout).await;
        lease.release().await;

        match page_source {
            Ok(html) => {
                let results = parse_results(&html);
                info!("Search for '{query}' returned {} results", results.len());
                results
            }
            Err(e) => {
                warn!("[Search Error] {e:#}");
                Vec::new()
            }
        }
    }

    async fn load_results_page(
        &self,
        session: &F::Session,
        url: &str,
        timeout: Duration,
    ) -> Result<String> {
        with_timeout(session.navigate(url), timeout, "Search page load").await?;
        with_timeout(session.page_source(), self.page_source_timeout, "Search page source").await
    }
}
