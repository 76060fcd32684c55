//! Data structures and constants for web search functionality

use serde::{Deserialize, Serialize};

// =============================================================================
// Constants
// =============================================================================

/// CSS selector for individual organic results on a Bing results page
pub const SEARCH_RESULT_SELECTOR: &str = "li.b_algo";

/// CSS selector for the result's title link (also carries the URL)
pub const TITLE_LINK_SELECTOR: &str = "h2 a";

/// CSS selector for the result's caption, which holds the snippet
pub const CAPTION_SELECTOR: &str = "div.b_caption";

/// Queries longer than this are rejected before a session is acquired
pub const MAX_QUERY_LENGTH: usize = 1000;

// =============================================================================
// Data Structures
// =============================================================================

/// One search hit, optionally enriched with the crawled page content
///
/// `url` is the identity key everywhere downstream (dedup, ordering,
/// corpus aggregation).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    /// Page title as shown on the results page
    pub title: String,

    /// Page URL
    pub url: String,

    /// Snippet from the results page
    pub content: String,

    /// Main readable content of the page; `null` until crawled or when the crawl failed
    #[serde(default)]
    pub raw_content: Option<String>,

    /// Relevance score assigned during research filtering (1..=5)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<u8>,

    /// Why crawling this result failed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    /// Wall-clock seconds spent fetching the page
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub crawl_time: Option<f64>,
}

impl SearchResult {
    /// A fresh, uncrawled result
    pub fn new(title: impl Into<String>, url: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            url: url.into(),
            content: content.into(),
            raw_content: None,
            score: None,
            error: None,
            crawl_time: None,
        }
    }

    /// Mark the result as failed: content cleared, reason recorded
    pub fn mark_failed(&mut self, reason: impl Into<String>) {
        self.raw_content = None;
        self.crawl_time = None;
        self.error = Some(reason.into());
    }
}

/// Restrict results to recently published pages
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecencyFilter {
    Day,
    Week,
    Month,
    /// No engine-side filter
    #[default]
    Year,
}

impl RecencyFilter {
    /// Value of Bing's `filters` query parameter, if any
    #[must_use]
    pub fn engine_filter(self) -> Option<&'static str> {
        match self {
            Self::Day => Some(r#"ex1:"ez1""#),
            Self::Week => Some(r#"ex1:"ez2""#),
            Self::Month => Some(r#"ex1:"ez3""#),
            Self::Year => None,
        }
    }
}

impl std::str::FromStr for RecencyFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "day" => Ok(Self::Day),
            "week" => Ok(Self::Week),
            "month" => Ok(Self::Month),
            "year" | "any" | "" => Ok(Self::Year),
            other => Err(format!("unknown recency filter '{other}'")),
        }
    }
}
