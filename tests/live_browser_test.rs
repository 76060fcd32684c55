//! Real Chrome against the live web
//!
//! Requires a local Chrome/Chromium (or network access to download one).
//! Run with `cargo test --test live_browser_test -- --ignored`.

use std::time::Duration;

use kodegen_tools_research::browser_pool::{ChromeSessionFactory, PoolConfig, SessionPool};
use kodegen_tools_research::search_service::{LocalSearchService, SearchBackend, SearchRequest};

#[tokio::test]
#[ignore = "launches Chrome and hits the network"]
async fn live_search_and_crawl() {
    let pool = SessionPool::start(ChromeSessionFactory::new(true), PoolConfig::with_capacity(2))
        .await
        .expect("chrome pool starts");

    let service = LocalSearchService::new(pool.clone());
    let results = service
        .search_and_crawl(
            &SearchRequest::new("rust programming language")
                .max_results(2)
                .include_raw_content(true)
                .timeout_secs(20),
        )
        .await
        .unwrap();

    assert!(!results.is_empty(), "live search returned nothing");
    for result in &results {
        assert!(result.url.starts_with("http"));
        assert!(result.raw_content.is_some() || result.error.is_some());
    }

    pool.shutdown().await;
}

#[tokio::test]
#[ignore = "launches Chrome"]
async fn live_session_answers_probe() {
    let pool = SessionPool::start(ChromeSessionFactory::new(true), PoolConfig::with_capacity(1))
        .await
        .expect("chrome pool starts");

    let lease = tokio::time::timeout(Duration::from_secs(30), pool.acquire())
        .await
        .expect("acquire within 30s")
        .unwrap();
    lease.release().await;
    assert_eq!(pool.stats().available, 1);

    pool.shutdown().await;
    pool.shutdown().await;
}
