//! Shared in-memory fakes for the integration tests
//!
//! `FakeFactory` launches `FakeSession`s that serve pages from a map instead
//! of driving a browser. All knobs live in a shared `FakeBehavior` so tests
//! can poison sessions, hang URLs or script search pages while the pool is
//! running.

#![allow(dead_code)]

use anyhow::{Result, anyhow};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, AtomicU64, AtomicUsize, Ordering};
use std::time::Duration;

use kodegen_tools_research::browser_pool::{BrowserSession, PoolConfig, SessionFactory, SessionPool};
use kodegen_tools_research::oracle::{Brief, Grade, Oracle, OracleError, Relevance};
use kodegen_tools_research::search_service::{SearchBackend, SearchRequest};
use kodegen_tools_research::web_search::SearchResult;

/// Engine endpoint the fake sessions recognise as a results page
pub const ENGINE_URL: &str = "https://search.test/search";

pub const EMPTY_RESULTS_PAGE: &str = r#"<html><body><ol id="b_results"></ol></body></html>"#;

#[derive(Default)]
pub struct FakeBehavior {
    /// Readable pages by URL; anything else fails to load
    pub pages: Mutex<HashMap<String, String>>,
    /// Results pages served to successive searches; empty page once drained
    pub search_pages: Mutex<VecDeque<String>>,
    /// URLs whose navigation never completes
    pub hanging_navigations: Mutex<HashSet<String>>,
    /// URLs whose page source never arrives
    pub hanging_sources: Mutex<HashSet<String>>,
    /// Session serials whose liveness probe fails
    pub poisoned: Mutex<HashSet<u64>>,
    /// Artificial page-load latency
    pub load_delay: Mutex<Duration>,
    /// Upcoming `create` calls that fail
    pub failing_creates: AtomicU32,

    pub created: AtomicU64,
    pub quits: AtomicU64,
    pub navigations: Mutex<Vec<String>>,
    in_flight: AtomicUsize,
    pub max_in_flight: AtomicUsize,
}

impl FakeBehavior {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn add_page(&self, url: &str, text: &str) {
        self.pages.lock().insert(url.to_string(), article_html(text));
    }

    pub fn queue_search_page(&self, html: impl Into<String>) {
        self.search_pages.lock().push_back(html.into());
    }

    pub fn hang_navigation(&self, url: &str) {
        self.hanging_navigations.lock().insert(url.to_string());
    }

    pub fn hang_source(&self, url: &str) {
        self.hanging_sources.lock().insert(url.to_string());
    }

    pub fn poison(&self, serial: u64) {
        self.poisoned.lock().insert(serial);
    }

    pub fn set_load_delay(&self, delay: Duration) {
        *self.load_delay.lock() = delay;
    }

    pub fn fail_next_creates(&self, count: u32) {
        self.failing_creates.store(count, Ordering::SeqCst);
    }

    pub fn created(&self) -> u64 {
        self.created.load(Ordering::SeqCst)
    }

    pub fn quits(&self) -> u64 {
        self.quits.load(Ordering::SeqCst)
    }

    /// Navigations to the search engine
    pub fn search_navigations(&self) -> usize {
        self.navigations
            .lock()
            .iter()
            .filter(|url| url.starts_with(ENGINE_URL))
            .count()
    }
}

pub struct FakeSession {
    serial: u64,
    behavior: Arc<FakeBehavior>,
    current: Mutex<Option<String>>,
}

impl FakeSession {
    /// Creation order of this session within its factory, starting at 0
    pub fn serial(&self) -> u64 {
        self.serial
    }
}

#[async_trait]
impl BrowserSession for FakeSession {
    async fn navigate(&self, url: &str) -> Result<()> {
        self.behavior.navigations.lock().push(url.to_string());

        let now = self.behavior.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.behavior.max_in_flight.fetch_max(now, Ordering::SeqCst);
        let delay = *self.behavior.load_delay.lock();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        self.behavior.in_flight.fetch_sub(1, Ordering::SeqCst);

        let hangs = self.behavior.hanging_navigations.lock().contains(url);
        if hangs {
            std::future::pending::<()>().await;
        }
        *self.current.lock() = Some(url.to_string());
        Ok(())
    }

    async fn page_source(&self) -> Result<String> {
        let url = self
            .current
            .lock()
            .clone()
            .ok_or_else(|| anyhow!("no document loaded"))?;

        if url.starts_with(ENGINE_URL) {
            let page = self.behavior.search_pages.lock().pop_front();
            return Ok(page.unwrap_or_else(|| EMPTY_RESULTS_PAGE.to_string()));
        }
        let hangs = self.behavior.hanging_sources.lock().contains(&url);
        if hangs {
            std::future::pending::<()>().await;
        }
        self.behavior
            .pages
            .lock()
            .get(&url)
            .cloned()
            .ok_or_else(|| anyhow!("net::ERR_NAME_NOT_RESOLVED at {url}"))
    }

    async fn probe(&self) -> Result<i64> {
        if self.behavior.poisoned.lock().contains(&self.serial) {
            return Err(anyhow!("renderer crashed"));
        }
        Ok(2)
    }

    async fn quit(self) -> Result<()> {
        self.behavior.quits.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[derive(Clone)]
pub struct FakeFactory {
    pub behavior: Arc<FakeBehavior>,
}

impl FakeFactory {
    pub fn new(behavior: Arc<FakeBehavior>) -> Self {
        Self { behavior }
    }
}

#[async_trait]
impl SessionFactory for FakeFactory {
    type Session = FakeSession;

    async fn create(&self) -> Result<FakeSession> {
        let failing = self
            .behavior
            .failing_creates
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1));
        if failing.is_ok() {
            return Err(anyhow!("browser failed to launch"));
        }

        let serial = self.behavior.created.fetch_add(1, Ordering::SeqCst);
        Ok(FakeSession {
            serial,
            behavior: Arc::clone(&self.behavior),
            current: Mutex::new(None),
        })
    }
}

/// Pool settings with millisecond delays so tests run quickly
pub fn fast_pool_config(capacity: usize) -> PoolConfig {
    PoolConfig {
        capacity,
        create_attempts: 2,
        create_retry_delay_ms: 1,
        health_check_timeout_secs: 1,
        replenish_backoff_ms: 10,
        headless: true,
    }
}

pub async fn fake_pool(capacity: usize) -> (Arc<SessionPool<FakeFactory>>, Arc<FakeBehavior>) {
    let behavior = FakeBehavior::new();
    let pool = SessionPool::start(FakeFactory::new(Arc::clone(&behavior)), fast_pool_config(capacity))
        .await
        .expect("fake pool starts");
    (pool, behavior)
}

/// Poll `condition` until it holds or `limit` elapses
pub async fn eventually<F>(limit: Duration, mut condition: F) -> bool
where
    F: FnMut() -> bool,
{
    let deadline = tokio::time::Instant::now() + limit;
    while tokio::time::Instant::now() < deadline {
        if condition() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    condition()
}

/// Minimal article page the extractor turns into `text`
pub fn article_html(text: &str) -> String {
    format!(
        "<html><head><title>t</title></head><body>\
         <nav><a href=\"/\">Home</a></nav>\
         <main><p>{text}</p></main>\
         <footer>Copyright</footer></body></html>"
    )
}

/// Results page in the engine's markup, one entry per `(title, url, snippet)`
pub fn results_page(entries: &[(&str, &str, &str)]) -> String {
    let items: String = entries
        .iter()
        .map(|(title, url, snippet)| {
            format!(
                "<li class=\"b_algo\"><h2><a href=\"{url}\">{title}</a></h2>\
                 <div class=\"b_caption\"><p>{snippet}</p></div></li>"
            )
        })
        .collect();
    format!("<html><body><ol id=\"b_results\">{items}</ol></body></html>")
}

pub fn result(url: &str) -> SearchResult {
    let mut result = SearchResult::new(format!("Title of {url}"), url, format!("Snippet of {url}"));
    result.raw_content = Some(format!("Body of {url}"));
    result
}

/// Backend answering from a fixed query → results table
#[derive(Default)]
pub struct FakeBackend {
    pub responses: Mutex<HashMap<String, Vec<SearchResult>>>,
    pub failing_queries: Mutex<HashSet<String>>,
    pub requests: Mutex<Vec<SearchRequest>>,
}

impl FakeBackend {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn respond(&self, query: &str, urls: &[&str]) {
        self.responses
            .lock()
            .insert(query.to_string(), urls.iter().map(|url| result(url)).collect());
    }

    pub fn fail(&self, query: &str) {
        self.failing_queries.lock().insert(query.to_string());
    }

    pub fn queries(&self) -> Vec<String> {
        self.requests.lock().iter().map(|r| r.query.clone()).collect()
    }
}

#[async_trait]
impl SearchBackend for FakeBackend {
    async fn search_and_crawl(&self, request: &SearchRequest) -> Result<Vec<SearchResult>> {
        self.requests.lock().push(request.clone());
        if self.failing_queries.lock().contains(&request.query) {
            return Err(anyhow!("connection refused"));
        }
        let mut results = self
            .responses
            .lock()
            .get(&request.query)
            .cloned()
            .unwrap_or_default();
        results.truncate(request.max_results);
        Ok(results)
    }
}

/// Oracle with per-URL scores and a scripted sequence of grades
pub struct FakeOracle {
    /// Score by URL substring; unmatched documents score `default_score`
    pub scores: Mutex<Vec<(String, i64)>>,
    pub default_score: i64,
    /// Documents containing one of these URLs compress to nothing relevant
    pub irrelevant: Mutex<HashSet<String>>,
    /// Documents containing one of these URLs fail to compress
    pub compress_failures: Mutex<HashSet<String>>,
    /// Grades handed out in order; the last one repeats
    pub grades: Mutex<VecDeque<Result<Grade, String>>>,
    pub budget: Option<u32>,
    pub grade_calls: AtomicUsize,
    pub graded_corpora: Mutex<Vec<String>>,
}

impl Default for FakeOracle {
    fn default() -> Self {
        Self {
            scores: Mutex::new(Vec::new()),
            default_score: 4,
            irrelevant: Mutex::new(HashSet::new()),
            compress_failures: Mutex::new(HashSet::new()),
            grades: Mutex::new(VecDeque::from([Ok(Grade::pass())])),
            budget: None,
            grade_calls: AtomicUsize::new(0),
            graded_corpora: Mutex::new(Vec::new()),
        }
    }
}

impl FakeOracle {
    pub fn with_grades(grades: Vec<Result<Grade, String>>) -> Self {
        Self {
            grades: Mutex::new(grades.into()),
            ..Self::default()
        }
    }

    pub fn score(&self, url: &str, score: i64) {
        self.scores.lock().push((url.to_string(), score));
    }

    pub fn grade_calls(&self) -> usize {
        self.grade_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Oracle for FakeOracle {
    async fn score_relevance(&self, _query: &str, document: &str) -> Result<Relevance, OracleError> {
        let score = self
            .scores
            .lock()
            .iter()
            .find(|(url, _)| document.contains(url.as_str()))
            .map_or(self.default_score, |(_, score)| *score);
        if score < 0 {
            return Err(OracleError::Exhausted {
                attempts: 5,
                last: Box::new(OracleError::Transport("scoring unavailable".into())),
            });
        }
        Relevance::new(score)
    }

    async fn compress(&self, _query: &str, document: &str) -> Result<Brief, OracleError> {
        if self.irrelevant.lock().iter().any(|url| document.contains(url.as_str())) {
            return Ok(Brief::NothingRelevant);
        }
        if self.compress_failures.lock().iter().any(|url| document.contains(url.as_str())) {
            return Err(OracleError::Transport("compression unavailable".into()));
        }
        let title = document
            .split(',')
            .next()
            .unwrap_or_default()
            .trim_start_matches("Title:");
        Ok(Brief::from_text(format!("Brief: {title}")))
    }

    async fn grade_sufficiency(&self, _queries: &[String], corpus: &str) -> Result<Grade, OracleError> {
        self.grade_calls.fetch_add(1, Ordering::SeqCst);
        self.graded_corpora.lock().push(corpus.to_string());
        let mut grades = self.grades.lock();
        let next = if grades.len() > 1 {
            grades.pop_front()
        } else {
            grades.front().cloned()
        };
        match next {
            Some(Ok(grade)) => Ok(grade),
            Some(Err(e)) => Err(OracleError::Exhausted {
                attempts: 5,
                last: Box::new(OracleError::Transport(e)),
            }),
            None => Ok(Grade::pass()),
        }
    }

    async fn assign_budget(&self, _queries: &[String]) -> Result<Option<u32>, OracleError> {
        Ok(self.budget)
    }
}
