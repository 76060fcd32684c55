//! Shared default values for the research harvester
//!
//! Centralizes the tuning knobs used by the pool, search client, crawl
//! coordinator and research pipeline so defaults stay consistent between
//! `HarvestConfig::default()` and the components' own fallbacks.

/// Number of browser sessions kept by the pool
///
/// Each session is a full Chrome process (~150-250MB RSS), so this is the
/// dominant memory cost of the service.
pub const DEFAULT_POOL_CAPACITY: usize = 10;

/// Attempts made to launch a session before giving up
pub const SESSION_CREATE_ATTEMPTS: u32 = 3;

/// Delay between session launch attempts (milliseconds)
pub const SESSION_CREATE_RETRY_DELAY_MS: u64 = 1_000;

/// Upper bound for the `1 + 1` liveness probe (seconds)
pub const HEALTH_CHECK_TIMEOUT_SECS: u64 = 5;

/// Backoff between background replenishment attempts (milliseconds)
pub const REPLENISH_BACKOFF_MS: u64 = 2_000;

/// Timeout for reading the rendered page source (seconds)
///
/// Deliberately shorter than the navigation timeout: once navigation has
/// finished the DOM snapshot should be immediate.
pub const PAGE_SOURCE_TIMEOUT_SECS: u64 = 5;

/// How long a fetch waits for the load event after `goto` (seconds)
pub const IMPLICIT_WAIT_SECS: u64 = 10;

/// Slack the crawl coordinator grants a task beyond its own timeout (seconds)
pub const CRAWL_GRACE_SECS: u64 = 10;

/// Additional whole-search attempts when the engine returns no results
pub const EMPTY_RESULT_RETRIES: u32 = 5;

/// Default number of results kept per query
pub const DEFAULT_MAX_RESULTS: usize = 3;

/// Default per-page timeout of the HTTP endpoint (seconds)
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 10;

/// Per-page timeout the research pipeline requests from its backend (seconds)
pub const RESEARCH_TIMEOUT_SECS: u64 = 40;

/// Default number of search-filter-grade iterations per research run
pub const DEFAULT_ITERATION_BUDGET: u32 = 1;

/// Ceiling for oracle-assigned iteration budgets
pub const MAX_ITERATION_BUDGET: u32 = 3;

/// Minimum relevance score (1-5) a result needs to enter the corpus
///
/// 2 is "slightly relevant"; anything above it is kept.
pub const RELEVANCE_ACCEPTANCE_THRESHOLD: u8 = 3;

/// Attempts the oracle adapter makes before reporting failure
pub const ORACLE_ATTEMPTS: u32 = 5;

/// Bing web search endpoint
pub const BING_SEARCH_URL: &str = "https://www.bing.com/search";

/// Chrome user agent string for stealth mode
///
/// Updated: 2025-01-29 to Chrome 132 (current stable)
pub const CHROME_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/132.0.6834.160 Safari/537.36";
