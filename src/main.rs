// Search-and-crawl HTTP service
//
// Starts the browser session pool, serves `/search_and_crawl`, `/health`
// and `/research`, and shuts the pool down after Ctrl-C.

use anyhow::{Context, Result};
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use kodegen_tools_research::config::HarvestConfig;
use kodegen_tools_research::crawl_engine::CrawlCoordinator;
use kodegen_tools_research::oracle::{ChatOracle, Oracle, RetryingOracle};
use kodegen_tools_research::page_fetcher::PageFetcher;
use kodegen_tools_research::research::{BackendConfig, ResearchPipeline};
use kodegen_tools_research::search_service::{
    LocalSearchService, RemoteSearchBackend, SearchBackend,
};
use kodegen_tools_research::server::{self, AppState};
use kodegen_tools_research::web_search::SearchClient;
use kodegen_tools_research::{ChromeSessionFactory, SessionPool};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,kodegen_tools_research=debug")),
        )
        .init();

    let config = HarvestConfig::load().context("failed to load configuration")?;

    let addr = config.server.socket_addr()?;
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;

    let factory = ChromeSessionFactory::new(config.pool.headless)
        .request_timeout(config.crawl.request_timeout())
        .implicit_wait(config.crawl.implicit_wait());
    let pool = SessionPool::start(factory, config.pool.clone())
        .await
        .context("failed to start browser session pool")?;

    let search = SearchClient::new(Arc::clone(&pool))
        .with_engine_url(config.search.engine_url.clone())
        .with_recency(config.search.recency)
        .with_page_source_timeout(config.search.page_source_timeout());
    let fetcher = PageFetcher::new(Arc::clone(&pool))
        .with_page_source_timeout(config.crawl.page_source_timeout());
    let crawler = CrawlCoordinator::new(fetcher).with_grace(config.crawl.grace());
    let local: Arc<dyn SearchBackend> = Arc::new(
        LocalSearchService::from_parts(search, crawler)
            .with_empty_result_retries(config.search.empty_result_retries),
    );

    let research_backend: Arc<dyn SearchBackend> = match &config.research.backend {
        BackendConfig::Local => Arc::clone(&local),
        BackendConfig::Remote { base_url } => {
            info!("Research searches go to {base_url}");
            Arc::new(RemoteSearchBackend::new(base_url.clone()))
        }
    };
    let oracle: Arc<dyn Oracle> = Arc::new(
        RetryingOracle::new(ChatOracle::new(config.oracle.clone()))
            .with_attempts(config.research.oracle_attempts),
    );
    let pipeline = Arc::new(ResearchPipeline::new(
        research_backend,
        oracle,
        config.research.clone(),
    ));

    let state = AppState::new(local).with_research(pipeline);
    let served = server::serve(listener, state, shutdown_signal()).await;

    pool.shutdown().await;
    info!("Browser session pool shut down");
    served
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for Ctrl-C: {e}");
        std::future::pending::<()>().await;
    }
}
