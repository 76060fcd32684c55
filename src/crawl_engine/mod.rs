//! Bounded fan-out of page fetches
//!
//! The coordinator runs one fetch per search result on at most
//! `max_concurrency` concurrent tasks. Every task carries its own deadline
//! of `timeout + grace`; a task that misses it is abandoned without
//! affecting its siblings, and dropping its in-flight fetch invalidates the
//! session it held (see [`crate::browser_pool::SessionLease`]). Output is
//! always returned in submission order.

pub mod crawl_types;

pub use crawl_types::{CrawlOutcome, CrawlTask, TIMEOUT_ERROR, TaskStatus};

use futures::StreamExt;
use futures::stream::FuturesUnordered;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tracing::{debug, error, info, warn};

use crate::browser_pool::SessionFactory;
use crate::page_fetcher::PageFetcher;
use crate::utils::constants::CRAWL_GRACE_SECS;
use crate::web_search::SearchResult;

pub struct CrawlCoordinator<F: SessionFactory> {
    fetcher: PageFetcher<F>,
    grace: Duration,
}

impl<F: SessionFactory> Clone for CrawlCoordinator<F> {
    fn clone(&self) -> Self {
        Self {
            fetcher: self.fetcher.clone(),
            grace: self.grace,
        }
    }
}

impl<F: SessionFactory> CrawlCoordinator<F> {
    pub fn new(fetcher: PageFetcher<F>) -> Self {
        Self {
            fetcher,
            grace: Duration::from_secs(CRAWL_GRACE_SECS),
        }
    }

    /// Slack granted beyond each task's own timeout before it is abandoned
    #[must_use]
    pub fn with_grace(mut self, grace: Duration) -> Self {
        self.grace = grace;
        self
    }

    /// Fetch every result and return them in input order
    ///
    /// Never fails as a whole: each entry either carries content or has
    /// `raw_content = None` with an `error`.
    pub async fn crawl_all(
        &self,
        results: Vec<SearchResult>,
        max_concurrency: usize,
        timeout: Duration,
    ) -> Vec<SearchResult> {
        let tasks = results
            .into_iter()
            .enumerate()
            .map(|(index, result)| CrawlTask {
                index,
                result,
                timeout,
            })
            .collect();

        self.run(tasks, max_concurrency)
            .await
            .into_iter()
            .map(|outcome| outcome.result)
            .collect()
    }

    /// Run `tasks` and return one outcome per task, sorted by `index`
    pub async fn run(&self, tasks: Vec<CrawlTask>, max_concurrency: usize) -> Vec<CrawlOutcome> {
        if tasks.is_empty() {
            return Vec::new();
        }

        let concurrency = max_concurrency.max(1);
        let semaphore = Arc::new(Semaphore::new(concurrency));
        info!("Crawling {} pages with concurrency {concurrency}", tasks.len());

        let mut active_tasks = FuturesUnordered::new();
        for task in tasks {
            let fetcher = self.fetcher.clone();
            let semaphore = Arc::clone(&semaphore);
            let deadline = task.timeout + self.grace;
            let (index, original) = (task.index, task.result.clone());

            let handle = tokio::spawn(async move {
                let Ok(_permit) = semaphore.acquire_owned().await else {
                    return CrawlOutcome::failed(task.index, task.result, "crawl coordinator closed");
                };

                // The clock starts once the task holds a worker slot
                let url = task.result.url.clone();
                match tokio::time::timeout(deadline, fetcher.fetch(task.result.clone(), task.timeout)).await {
                    Ok(fetched) => CrawlOutcome::from_fetch(task.index, fetched),
                    Err(_) => {
                        warn!(
                            "[Crawl Timeout] {url} exceeded {:.1}s; abandoning task",
                            deadline.as_secs_f64()
                        );
                        CrawlOutcome::timed_out(task.index, task.result)
                    }
                }
            });

            active_tasks.push(async move {
                match handle.await {
                    Ok(outcome) => outcome,
                    Err(e) => {
                        error!("Crawl task for {} died: {e}", original.url);
                        CrawlOutcome::failed(index, original, format!("crawl task failed: {e}"))
                    }
                }
            });
        }

        let mut outcomes = Vec::with_capacity(active_tasks.len());
        while let Some(outcome) = active_tasks.next().await {
            debug!("Crawl of {} {}", outcome.result.url, outcome.status);
            outcomes.push(outcome);
        }

        outcomes.sort_by_key(|outcome| outcome.index);

        let completed = outcomes
            .iter()
            .filter(|o| o.status == TaskStatus::Completed)
            .count();
        info!("Crawl finished: {completed}/{} pages fetched", outcomes.len());

        outcomes
    }
}
