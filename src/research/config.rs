use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::utils::constants::{
    DEFAULT_ITERATION_BUDGET, DEFAULT_MAX_RESULTS, MAX_ITERATION_BUDGET, ORACLE_ATTEMPTS,
    RELEVANCE_ACCEPTANCE_THRESHOLD, RESEARCH_TIMEOUT_SECS,
};

/// Where the pipeline's searches run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum BackendConfig {
    /// In-process, against this process's session pool
    #[default]
    Local,
    /// A running `/search_and_crawl` service
    Remote { base_url: String },
}

/// Configuration for one research run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResearchConfig {
    /// Iteration budget used when the oracle assigns none (default: 1)
    pub budget: u32,
    /// Ask the oracle for a budget before the first iteration (default: false)
    pub assign_budget: bool,
    /// Ceiling for oracle-assigned budgets (default: 3)
    pub max_budget: u32,
    /// Minimum relevance score (1-5) a result needs (default: 3)
    pub acceptance_threshold: u8,
    /// Results requested per query (default: 3)
    pub max_results: usize,
    /// Per-page timeout requested from the backend in seconds (default: 40)
    pub timeout_secs: u64,
    /// Crawl full pages before scoring (default: true)
    pub include_raw_content: bool,
    /// Attempts per oracle call (default: 5)
    pub oracle_attempts: u32,
    pub backend: BackendConfig,
}

impl Default for ResearchConfig {
    fn default() -> Self {
        Self {
            budget: DEFAULT_ITERATION_BUDGET,
            assign_budget: false,
            max_budget: MAX_ITERATION_BUDGET,
            acceptance_threshold: RELEVANCE_ACCEPTANCE_THRESHOLD,
            max_results: DEFAULT_MAX_RESULTS,
            timeout_secs: RESEARCH_TIMEOUT_SECS,
            include_raw_content: true,
            oracle_attempts: ORACLE_ATTEMPTS,
            backend: BackendConfig::Local,
        }
    }
}

impl ResearchConfig {
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}
