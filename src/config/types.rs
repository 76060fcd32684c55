use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::time::Duration;

use crate::browser_pool::PoolConfig;
use crate::oracle::ChatOracleConfig;
use crate::research::ResearchConfig;
use crate::utils::constants::{
    BING_SEARCH_URL, CRAWL_GRACE_SECS, DEFAULT_REQUEST_TIMEOUT_SECS, EMPTY_RESULT_RETRIES,
    IMPLICIT_WAIT_SECS, PAGE_SOURCE_TIMEOUT_SECS,
};
use crate::web_search::RecencyFilter;

/// Complete service configuration
///
/// Every section and field has a default, so an empty TOML file (or no file
/// at all) yields a working configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HarvestConfig {
    pub pool: PoolConfig,
    pub search: SearchConfig,
    pub crawl: CrawlConfig,
    pub server: ServerConfig,
    pub research: ResearchConfig,
    pub oracle: ChatOracleConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Results-page endpoint (default: Bing)
    pub engine_url: String,
    /// Recency filter applied to every search (default: `year`, i.e. none)
    pub recency: RecencyFilter,
    /// Timeout for reading the rendered results page in seconds (default: 5)
    pub page_source_timeout_secs: u64,
    /// Extra whole-search attempts while the engine returns nothing (default: 5)
    pub empty_result_retries: u32,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            engine_url: BING_SEARCH_URL.to_string(),
            recency: RecencyFilter::Year,
            page_source_timeout_secs: PAGE_SOURCE_TIMEOUT_SECS,
            empty_result_retries: EMPTY_RESULT_RETRIES,
        }
    }
}

impl SearchConfig {
    #[must_use]
    pub fn page_source_timeout(&self) -> Duration {
        Duration::from_secs(self.page_source_timeout_secs)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CrawlConfig {
    /// Slack beyond a task's own timeout before it is abandoned, in seconds (default: 10)
    pub grace_secs: u64,
    /// Wait for a navigation to settle, in seconds (default: 10)
    pub implicit_wait_secs: u64,
    /// Timeout for reading a fetched page's source in seconds (default: 5)
    pub page_source_timeout_secs: u64,
    /// CDP command timeout in seconds (default: 10)
    pub request_timeout_secs: u64,
}

impl Default for CrawlConfig {
    fn default() -> Self {
        Self {
            grace_secs: CRAWL_GRACE_SECS,
            implicit_wait_secs: IMPLICIT_WAIT_SECS,
            page_source_timeout_secs: PAGE_SOURCE_TIMEOUT_SECS,
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
        }
    }
}

impl CrawlConfig {
    #[must_use]
    pub fn grace(&self) -> Duration {
        Duration::from_secs(self.grace_secs)
    }

    #[must_use]
    pub fn implicit_wait(&self) -> Duration {
        Duration::from_secs(self.implicit_wait_secs)
    }

    #[must_use]
    pub fn page_source_timeout(&self) -> Duration {
        Duration::from_secs(self.page_source_timeout_secs)
    }

    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
        }
    }
}

impl ServerConfig {
    /// `host:port` as a socket address
    pub fn socket_addr(&self) -> Result<SocketAddr, super::ConfigError> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .map_err(|e| super::ConfigError::Invalid(format!("server address {}:{}: {e}", self.host, self.port)))
    }
}
