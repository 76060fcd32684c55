//! Search client and local search-and-crawl service against fake sessions

mod common;

use std::sync::Arc;
use std::time::Duration;

use common::{
    EMPTY_RESULTS_PAGE, ENGINE_URL, FakeBehavior, FakeFactory, fake_pool, fast_pool_config, results_page,
};
use kodegen_tools_research::browser_pool::SessionPool;
use kodegen_tools_research::crawl_engine::CrawlCoordinator;
use kodegen_tools_research::page_fetcher::PageFetcher;
use kodegen_tools_research::search_service::{LocalSearchService, SearchBackend, SearchRequest};
use kodegen_tools_research::web_search::{RecencyFilter, SearchClient};

fn service(pool: &Arc<SessionPool<FakeFactory>>) -> LocalSearchService<FakeFactory> {
    let search = SearchClient::new(Arc::clone(pool)).with_engine_url(ENGINE_URL);
    let crawler = CrawlCoordinator::new(PageFetcher::new(Arc::clone(pool)));
    LocalSearchService::from_parts(search, crawler)
}

fn three_hits() -> String {
    results_page(&[
        ("Tokio", "https://tokio.rs/", "An asynchronous runtime"),
        ("Async book", "https://rust-lang.github.io/async-book/", "Asynchronous programming in Rust"),
        ("Docs", "https://docs.rs/tokio", "API documentation"),
    ])
}

#[tokio::test]
async fn empty_results_are_retried_until_the_engine_answers() {
    let (pool, behavior) = fake_pool(1).await;
    for _ in 0..4 {
        behavior.queue_search_page(EMPTY_RESULTS_PAGE);
    }
    behavior.queue_search_page(three_hits());

    let results = service(&pool)
        .search_and_crawl(&SearchRequest::new("rust async runtime"))
        .await
        .unwrap();

    assert_eq!(behavior.search_navigations(), 5);
    let urls: Vec<&str> = results.iter().map(|r| r.url.as_str()).collect();
    assert_eq!(
        urls,
        ["https://tokio.rs/", "https://rust-lang.github.io/async-book/", "https://docs.rs/tokio"]
    );
    assert!(results.iter().all(|r| r.raw_content.is_none()));
}

#[tokio::test]
async fn persistently_empty_engine_yields_empty_list_after_six_attempts() {
    let (pool, behavior) = fake_pool(1).await;

    let results = service(&pool)
        .search_and_crawl(&SearchRequest::new("nothing matches this"))
        .await
        .unwrap();

    assert!(results.is_empty());
    assert_eq!(behavior.search_navigations(), 6);
}

#[tokio::test]
async fn results_are_truncated_to_max_results() {
    let (pool, behavior) = fake_pool(1).await;
    behavior.queue_search_page(three_hits());

    let results = service(&pool)
        .search_and_crawl(&SearchRequest::new("tokio").max_results(2))
        .await
        .unwrap();

    assert_eq!(results.len(), 2);
    assert_eq!(results[0].title, "Tokio");
    assert_eq!(results[0].content, "An asynchronous runtime");
}

#[tokio::test]
async fn zero_max_results_skips_the_engine() {
    let (pool, behavior) = fake_pool(1).await;

    let results = service(&pool)
        .search_and_crawl(&SearchRequest::new("tokio").max_results(0))
        .await
        .unwrap();

    assert!(results.is_empty());
    assert_eq!(behavior.search_navigations(), 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn raw_content_is_crawled_in_result_order() {
    let (pool, behavior) = fake_pool(2).await;
    behavior.queue_search_page(three_hits());
    behavior.add_page("https://tokio.rs/", "Tokio is a runtime for writing reliable applications");
    behavior.add_page("https://rust-lang.github.io/async-book/", "Futures are lazy");

    let results = service(&pool)
        .search_and_crawl(&SearchRequest::new("tokio").include_raw_content(true).timeout_secs(2))
        .await
        .unwrap();

    assert_eq!(results.len(), 3);
    assert!(results[0].raw_content.as_deref().unwrap_or_default().contains("reliable applications"));
    assert!(results[1].raw_content.as_deref().unwrap_or_default().contains("Futures are lazy"));
    // Not served by the fake: the failure stays on its own entry
    assert!(results[2].raw_content.is_none());
    assert!(results[2].error.is_some());
}

#[tokio::test]
async fn recency_filter_reaches_the_engine_url() {
    let behavior = FakeBehavior::new();
    let pool = SessionPool::start(
        FakeFactory::new(Arc::clone(&behavior)),
        fast_pool_config(1),
    )
    .await
    .unwrap();
    behavior.queue_search_page(three_hits());

    let client = SearchClient::new(Arc::clone(&pool))
        .with_engine_url(ENGINE_URL)
        .with_recency(RecencyFilter::Week);
    let results = client.search("tokio", Duration::from_secs(1)).await;

    assert_eq!(results.len(), 3);
    let navigated = behavior.navigations.lock().clone();
    assert_eq!(navigated.len(), 1);
    assert!(navigated[0].starts_with(ENGINE_URL));
    assert!(navigated[0].contains("q=tokio"));
    assert!(navigated[0].contains("filters="));
}

#[tokio::test]
async fn search_releases_its_session_even_on_failure() {
    let (pool, behavior) = fake_pool(1).await;
    behavior.set_load_delay(Duration::from_millis(200));

    let client = SearchClient::new(Arc::clone(&pool)).with_engine_url(ENGINE_URL);
    let results = client.search("slow", Duration::from_millis(20)).await;

    assert!(results.is_empty());
    assert_eq!(pool.stats().available, 1);
    assert_eq!(pool.stats().in_use, 0);
}

#[tokio::test]
async fn blank_query_never_reaches_the_pool() {
    let (pool, behavior) = fake_pool(1).await;
    let client = SearchClient::new(pool).with_engine_url(ENGINE_URL);

    assert!(client.search("   ", Duration::from_secs(1)).await.is_empty());
    assert!(client.search(&"x".repeat(1001), Duration::from_secs(1)).await.is_empty());
    assert_eq!(behavior.search_navigations(), 0);
}

#[tokio::test]
async fn local_service_reports_pool_stats() {
    let (pool, _behavior) = fake_pool(2).await;
    let stats = service(&pool).pool_stats().expect("local backend owns a pool");
    assert_eq!(stats.capacity, 2);
    assert_eq!(stats.available, 2);
}
