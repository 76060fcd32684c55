//! Results-page URL building and HTML parsing
//!
//! Both are pure functions so they can be tested without a browser.

use anyhow::{Context, Result};
use scraper::{Html, Selector};
use std::sync::LazyLock;
use url::Url;

use super::types::{
    CAPTION_SELECTOR, RecencyFilter, SEARCH_RESULT_SELECTOR, SearchResult, TITLE_LINK_SELECTOR,
};
use crate::utils::collapse_whitespace;

static RESULT: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse(SEARCH_RESULT_SELECTOR).expect("BUG: hardcoded CSS selector 'li.b_algo' is invalid")
});

static TITLE_LINK: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse(TITLE_LINK_SELECTOR).expect("BUG: hardcoded CSS selector 'h2 a' is invalid")
});

static CAPTION: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse(CAPTION_SELECTOR).expect("BUG: hardcoded CSS selector 'div.b_caption' is invalid")
});

/// Build the results-page URL for `query`, properly percent-encoded
pub fn build_search_url(engine_url: &str, query: &str, recency: RecencyFilter) -> Result<Url> {
    let mut url = Url::parse(engine_url)
        .with_context(|| format!("Invalid search engine URL: {engine_url}"))?;
    {
        let mut pairs = url.query_pairs_mut();
        pairs.append_pair("q", query);
        if let Some(filter) = recency.engine_filter() {
            pairs.append_pair("filters", filter);
        }
    }
    Ok(url)
}

/// Parse organic results out of a rendered results page
///
/// Entries without a title link or with an empty `href` are skipped. The
/// snippet is the caption's text with whitespace collapsed; a missing
/// caption yields an empty snippet.
pub fn parse_results(html: &str) -> Vec<SearchResult> {
    let document = Html::parse_document(html);

    document
        .select(&RESULT)
        .filter_map(|item| {
            let link = item.select(&TITLE_LINK).next()?;
            let href = link.value().attr("href")?.trim();
            if href.is_empty() {
                return None;
            }

            let title = collapse_whitespace(&link.text().collect::<String>());
            let content = item
                .select(&CAPTION)
                .next()
                .map(|caption| collapse_whitespace(&caption.text().collect::<String>()))
                .unwrap_or_default();

            Some(SearchResult::new(title, href, content))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const RESULTS_PAGE: &str = r#"
        <html><body><ol id="b_results">
          <li class="b_algo">
            <h2><a href="https://tokio.rs/">Tokio - An asynchronous <strong>Rust</strong> runtime</a></h2>
            <div class="b_caption"><p>Tokio is an   event-driven,
              non-blocking I/O platform.</p></div>
          </li>
          <li class="b_ad"><h2><a href="https://ads.example.com">Sponsored</a></h2></li>
          <li class="b_algo">
            <h2>No link here</h2>
            <div class="b_caption"><p>orphan caption</p></div>
          </li>
          <li class="b_algo">
            <h2><a href="https://docs.rs/tokio">tokio - Rust</a></h2>
          </li>
        </ol></body></html>
    "#;

    #[test]
    fn parses_organic_results_and_skips_linkless_entries() {
        let results = parse_results(RESULTS_PAGE);

        assert_eq!(results.len(), 2);
        assert_eq!(results[0].title, "Tokio - An asynchronous Rust runtime");
        assert_eq!(results[0].url, "https://tokio.rs/");
        assert_eq!(
            results[0].content,
            "Tokio is an event-driven, non-blocking I/O platform."
        );
        assert_eq!(results[1].url, "https://docs.rs/tokio");
        assert_eq!(results[1].content, "");
        assert!(results.iter().all(|r| r.raw_content.is_none()));
    }

    #[test]
    fn empty_page_yields_no_results() {
        assert!(parse_results("").is_empty());
        assert!(parse_results("<html><body>captcha</body></html>").is_empty());
    }

    #[test]
    fn search_url_encodes_query_and_filter() {
        let url = build_search_url("https://www.bing.com/search", "rust & tokio", RecencyFilter::Day)
            .unwrap();
        let pairs: Vec<(String, String)> = url
            .query_pairs()
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();

        assert_eq!(
            pairs,
            vec![
                ("q".to_string(), "rust & tokio".to_string()),
                ("filters".to_string(), r#"ex1:"ez1""#.to_string()),
            ]
        );
    }

    #[test]
    fn search_url_without_filter_has_only_query() {
        let url = build_search_url("https://www.bing.com/search", "rust", RecencyFilter::Year).unwrap();
        assert_eq!(url.as_str(), "https://www.bing.com/search?q=rust");
    }
}
