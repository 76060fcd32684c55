//! Fluent builder for `HarvestConfig`
//!
//! Starts from the defaults; every setter overrides one knob and `build()`
//! validates the result.

use tracing::warn;

use super::{ConfigError, HarvestConfig};
use crate::oracle::ChatOracleConfig;
use crate::research::BackendConfig;
use crate::web_search::RecencyFilter;

#[derive(Debug, Clone, Default)]
pub struct HarvestConfigBuilder {
    config: HarvestConfig,
}

impl HarvestConfig {
    #[must_use]
    pub fn builder() -> HarvestConfigBuilder {
        HarvestConfigBuilder::default()
    }
}

impl HarvestConfigBuilder {
    /// Continue from an existing configuration
    #[must_use]
    pub fn from_config(config: HarvestConfig) -> Self {
        Self { config }
    }

    #[must_use]
    pub fn pool_capacity(mut self, capacity: usize) -> Self {
        self.config.pool.capacity = capacity;
        self
    }

    #[must_use]
    pub fn create_attempts(mut self, attempts: u32) -> Self {
        self.config.pool.create_attempts = attempts;
        self
    }

    /// Set browser headless mode
    ///
    /// Headed browsers need a display server and are only honored in debug
    /// builds. Release builds force headless mode and log a warning.
    #[must_use]
    pub fn headless(mut self, headless: bool) -> Self {
        if !headless && !cfg!(debug_assertions) {
            warn!("Headed browser mode is disabled in release builds, staying headless");
            self.config.pool.headless = true;
        } else {
            self.config.pool.headless = headless;
        }
        self
    }

    #[must_use]
    pub fn engine_url(mut self, url: impl Into<String>) -> Self {
        self.config.search.engine_url = url.into();
        self
    }

    #[must_use]
    pub fn recency(mut self, recency: RecencyFilter) -> Self {
        self.config.search.recency = recency;
        self
    }

    #[must_use]
    pub fn empty_result_retries(mut self, retries: u32) -> Self {
        self.config.search.empty_result_retries = retries;
        self
    }

    #[must_use]
    pub fn crawl_grace_secs(mut self, secs: u64) -> Self {
        self.config.crawl.grace_secs = secs;
        self
    }

    #[must_use]
    pub fn implicit_wait_secs(mut self, secs: u64) -> Self {
        self.config.crawl.implicit_wait_secs = secs;
        self
    }

    #[must_use]
    pub fn bind(mut self, host: impl Into<String>, port: u16) -> Self {
        self.config.server.host = host.into();
        self.config.server.port = port;
        self
    }

    #[must_use]
    pub fn budget(mut self, budget: u32) -> Self {
        self.config.research.budget = budget;
        self
    }

    /// Let the oracle pick each run's budget, capped at `max_budget`
    #[must_use]
    pub fn assign_budget(mut self, max_budget: u32) -> Self {
        self.config.research.assign_budget = true;
        self.config.research.max_budget = max_budget;
        self
    }

    #[must_use]
    pub fn acceptance_threshold(mut self, threshold: u8) -> Self {
        self.config.research.acceptance_threshold = threshold;
        self
    }

    #[must_use]
    pub fn remote_backend(mut self, base_url: impl Into<String>) -> Self {
        self.config.research.backend = BackendConfig::Remote {
            base_url: base_url.into(),
        };
        self
    }

    #[must_use]
    pub fn oracle(mut self, oracle: ChatOracleConfig) -> Self {
        self.config.oracle = oracle;
        self
    }

    pub fn build(self) -> Result<HarvestConfig, ConfigError> {
        self.config.validate()?;
        Ok(self.config)
    }
}
