pub mod browser_pool;
pub mod browser_profile;
pub mod browser_setup;
pub mod config;
pub mod crawl_engine;
pub mod oracle;
pub mod page_fetcher;
pub mod research;
pub mod search_service;
pub mod server;
pub mod utils;
pub mod web_search;

pub use browser_pool::{
    BrowserSession, ChromePool, ChromeSession, ChromeSessionFactory, PoolConfig, PoolError,
    PoolStats, SessionFactory, SessionHealth, SessionId, SessionLease, SessionPool,
};
pub use browser_setup::{LaunchSpec, LaunchedBrowser, launch_browser, resolve_executable};
pub use config::{ConfigError, HarvestConfig, HarvestConfigBuilder};
pub use crawl_engine::{CrawlCoordinator, CrawlOutcome, CrawlTask, TaskStatus};
pub use oracle::{
    Brief, ChatOracle, ChatOracleConfig, Grade, Oracle, OracleError, Relevance, RetryingOracle,
    Verdict,
};
pub use page_fetcher::{PageFetcher, extract_main_content};
pub use research::{
    BackendConfig, IterationBudget, PipelineStage, ResearchConfig, ResearchOutcome,
    ResearchPipeline, TerminationReason,
};
pub use search_service::{
    LocalSearchService, RemoteSearchBackend, SearchBackend, SearchRequest, SearchResponse,
};
pub use server::{AppError, AppState};
pub use web_search::{RecencyFilter, SearchClient, SearchResult};
