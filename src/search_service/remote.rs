use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use tracing::debug;

use super::{SearchBackend, SearchRequest, SearchResponse};
use crate::web_search::SearchResult;

/// Default upper bound for one remote search-and-crawl round trip
pub const DEFAULT_REMOTE_TIMEOUT: Duration = Duration::from_secs(300);

/// Client of a running `/search_and_crawl` service
#[derive(Debug, Clone)]
pub struct RemoteSearchBackend {
    client: Client,
    base_url: String,
    request_timeout: Duration,
}

impl RemoteSearchBackend {
    /// `base_url` is the service root, e.g. `http://127.0.0.1:8000`
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            request_timeout: DEFAULT_REMOTE_TIMEOUT,
        }
    }

    /// Service at `http://{host}:{port}`
    pub fn from_host_port(host: &str, port: u16) -> Self {
        Self::new(format!("http://{host}:{port}"))
    }

    #[must_use]
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[async_trait]
impl SearchBackend for RemoteSearchBackend {
    async fn search_and_crawl(&self, request: &SearchRequest) -> Result<Vec<SearchResult>> {
        let url = format!("{}/search_and_crawl", self.base_url);
        debug!("Remote search '{}' via {url}", request.query);

        let response = self
            .client
            .get(&url)
            .timeout(self.request_timeout)
            .query(&[
                ("query", request.query.clone()),
                ("max_results", request.max_results.to_string()),
                ("timeout", request.timeout.to_string()),
                ("include_raw_content", request.include_raw_content.to_string()),
            ])
            .send()
            .await
            .with_context(|| format!("Failed to reach search service at {url}"))?;

        if !response.status().is_success() {
            return Err(anyhow::anyhow!(
                "Search service returned status: {}",
                response.status()
            ));
        }

        let body: SearchResponse = response
            .json()
            .await
            .context("Failed to decode search service response")?;
        Ok(body.results)
    }
}
