use anyhow::Result;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{info, warn};

use super::{SearchBackend, SearchRequest};
use crate::browser_pool::{PoolStats, SessionFactory, SessionPool};
use crate::crawl_engine::CrawlCoordinator;
use crate::page_fetcher::PageFetcher;
use crate::utils::constants::EMPTY_RESULT_RETRIES;
use crate::web_search::{SearchClient, SearchResult};

/// Search and crawl in-process against a session pool
pub struct LocalSearchService<F: SessionFactory> {
    search: SearchClient<F>,
    crawler: CrawlCoordinator<F>,
    empty_result_retries: u32,
}

impl<F: SessionFactory> LocalSearchService<F> {
    /// Service with a default search client and crawler over `pool`
    pub fn new(pool: Arc<SessionPool<F>>) -> Self {
        let search = SearchClient::new(Arc::clone(&pool));
        let crawler = CrawlCoordinator::new(PageFetcher::new(pool));
        Self::from_parts(search, crawler)
    }

    pub fn from_parts(search: SearchClient<F>, crawler: CrawlCoordinator<F>) -> Self {
        Self {
            search,
            crawler,
            empty_result_retries: EMPTY_RESULT_RETRIES,
        }
    }

    /// Extra whole-search attempts made while the engine returns nothing
    #[must_use]
    pub fn with_empty_result_retries(mut self, retries: u32) -> Self {
        self.empty_result_retries = retries;
        self
    }

    #[must_use]
    pub fn pool(&self) -> &Arc<SessionPool<F>> {
        self.search.pool()
    }

    async fn search_with_retry(&self, request: &SearchRequest) -> Vec<SearchResult> {
        let timeout = request.timeout_duration();
        let attempts = self.empty_result_retries + 1;

        for attempt in 1..=attempts {
            let mut results = self.search.search(&request.query, timeout).await;
            results.truncate(request.max_results);

            if !results.is_empty() {
                if attempt > 1 {
                    info!("Search for '{}' succeeded on attempt {attempt}", request.query);
                }
                return results;
            }
            if attempt < attempts {
                warn!(
                    "Search for '{}' returned no results (attempt {attempt}/{attempts}); retrying",
                    request.query
                );
            }
        }

        warn!(
            "Search for '{}' returned no results after {attempts} attempts",
            request.query
        );
        Vec::new()
    }
}

#[async_trait]
impl<F: SessionFactory> SearchBackend for LocalSearchService<F> {
    async fn search_and_crawl(&self, request: &SearchRequest) -> Result<Vec<SearchResult>> {
        if request.max_results == 0 {
            return Ok(Vec::new());
        }

        let results = self.search_with_retry(request).await;
        if !request.include_raw_content || results.is_empty() {
            return Ok(results);
        }

        let concurrency = self.pool().capacity();
        Ok(self
            .crawler
            .crawl_all(results, concurrency, request.timeout_duration())
            .await)
    }

    fn pool_stats(&self) -> Option<PoolStats> {
        Some(self.pool().stats())
    }
}
