//! Page retrieval through pooled browser sessions
//!
//! A fetch loads one URL in a leased session and fills the result's
//! `raw_content` with the page's main readable content. Failures never
//! propagate: they are recorded on the result and the session that was in
//! use is restarted, since a failed load is the usual first symptom of a
//! wedged renderer.

mod extraction;

pub use extraction::{MAX_HTML_SIZE, extract_main_content};

use anyhow::{Context, Result};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

use crate::browser_pool::{BrowserSession, SessionFactory, SessionPool};
use crate::utils::constants::PAGE_SOURCE_TIMEOUT_SECS;
use crate::utils::with_timeout;
use crate::web_search::SearchResult;

pub struct PageFetcher<F: SessionFactory> {
    pool: Arc<SessionPool<F>>,
    page_source_timeout: Duration,
}

impl<F: SessionFactory> Clone for PageFetcher<F> {
    fn clone(&self) -> Self {
        Self {
            pool: Arc::clone(&self.pool),
            page_source_timeout: self.page_source_timeout,
        }
    }
}

impl<F: SessionFactory> PageFetcher<F> {
    pub fn new(pool: Arc<SessionPool<F>>) -> Self {
        Self {
            pool,
            page_source_timeout: Duration::from_secs(PAGE_SOURCE_TIMEOUT_SECS),
        }
    }

    #[must_use]
    pub fn with_page_source_timeout(mut self, timeout: Duration) -> Self {
        self.page_source_timeout = timeout;
        self
    }

    /// Fetch `result.url` and fill in its content fields
    ///
    /// On success `raw_content` holds the extracted markdown (or `None` if
    /// the page had no readable text) and `crawl_time` the elapsed seconds.
    /// On failure `raw_content` is `None` and `error` names the cause.
    pub async fn fetch(&self, mut result: SearchResult, timeout: Duration) -> SearchResult {
        let lease = match self.pool.acquire().await {
            Ok(lease) => lease,
            Err(e) => {
                warn!("[Crawl Error] {e} at {}", result.url);
                result.mark_failed(e.to_string());
                return result;
            }
        };
        debug!(session_id = %lease.id(), "Fetching {}", result.url);

        let started = Instant::now();
        match self.load_and_extract(&*lease, &result.url, timeout).await {
            Ok(content) => {
                let elapsed = started.elapsed().as_secs_f64();
                result.raw_content = content;
                result.error = None;
                result.crawl_time = Some(elapsed);
                info!("[Crawl] Fetched {} in {elapsed:.2}s", result.url);
                lease.release().await;
            }
            Err(e) => {
                warn!("[Crawl Error] {e:#} at {}", result.url);
                result.mark_failed(format!("{e:#}"));
                lease.restart().await;
            }
        }

        result
    }

    async fn load_and_extract(
        &self,
        session: &F::Session,
        url: &str,
        timeout: Duration,
    ) -> Result<Option<String>> {
        with_timeout(session.navigate(url), timeout, "Page load").await?;
        let html = with_timeout(session.page_source(), self.page_source_timeout, "Page source").await?;

        tokio::task::spawn_blocking(move || extract_main_content(&html))
            .await
            .context("Content extraction task panicked")?
    }
}
