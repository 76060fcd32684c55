//! Loading `HarvestConfig` from TOML and the environment
//!
//! Precedence, lowest first: built-in defaults, the TOML file named by
//! `HARVEST_CONFIG`, then individual environment overrides.

use std::path::Path;
use tracing::{debug, info};

use super::{ConfigError, HarvestConfig};
use crate::research::BackendConfig;

/// Names the TOML file to load
pub const CONFIG_PATH_ENV: &str = "HARVEST_CONFIG";
/// Host of a remote search service; selects the remote backend when set
pub const SEARCH_HOST_ENV: &str = "SEARCH_HOST";
/// Port of the remote search service (default: 8000)
pub const SEARCH_PORT_ENV: &str = "SEARCH_PORT";
pub const POOL_SIZE_ENV: &str = "HARVEST_POOL_SIZE";
pub const SERVER_PORT_ENV: &str = "HARVEST_PORT";

impl HarvestConfig {
    /// Load from `HARVEST_CONFIG` (if set) and the process environment, then validate
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = match std::env::var(CONFIG_PATH_ENV) {
            Ok(path) if !path.trim().is_empty() => Self::from_file(path.trim())?,
            _ => Self::default(),
        };
        config.apply_env(|name| std::env::var(name).ok())?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        info!("Loading configuration from {}", path.display());
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    /// Apply environment overrides, reading variables through `lookup`
    pub fn apply_env<L>(&mut self, lookup: L) -> Result<(), ConfigError>
    where
        L: Fn(&str) -> Option<String>,
    {
        let lookup = |name: &str| lookup(name).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        if let Some(host) = lookup(SEARCH_HOST_ENV) {
            let port = match lookup(SEARCH_PORT_ENV) {
                Some(port) => parse_env::<u16>(SEARCH_PORT_ENV, &port)?,
                None => 8000,
            };
            debug!("Using remote search backend at {host}:{port}");
            self.research.backend = BackendConfig::Remote {
                base_url: format!("http://{host}:{port}"),
            };
        }

        if let Some(size) = lookup(POOL_SIZE_ENV) {
            self.pool.capacity = parse_env(POOL_SIZE_ENV, &size)?;
        }

        if let Some(port) = lookup(SERVER_PORT_ENV) {
            self.server.port = parse_env(SERVER_PORT_ENV, &port)?;
        }

        Ok(())
    }

    /// Reject configurations that cannot work
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.pool.capacity == 0 {
            return Err(ConfigError::Invalid("pool.capacity must be at least 1".into()));
        }
        if self.pool.create_attempts == 0 {
            return Err(ConfigError::Invalid("pool.create_attempts must be at least 1".into()));
        }
        if self.research.budget == 0 {
            return Err(ConfigError::Invalid("research.budget must be at least 1".into()));
        }
        if self.research.max_budget == 0 {
            return Err(ConfigError::Invalid("research.max_budget must be at least 1".into()));
        }
        if !(1..=5).contains(&self.research.acceptance_threshold) {
            return Err(ConfigError::Invalid(format!(
                "research.acceptance_threshold must be within 1..=5, got {}",
                self.research.acceptance_threshold
            )));
        }
        if let BackendConfig::Remote { base_url } = &self.research.backend
            && url::Url::parse(base_url).is_err()
        {
            return Err(ConfigError::Invalid(format!(
                "research.backend.base_url is not a valid URL: {base_url}"
            )));
        }
        if url::Url::parse(&self.search.engine_url).is_err() {
            return Err(ConfigError::Invalid(format!(
                "search.engine_url is not a valid URL: {}",
                self.search.engine_url
            )));
        }
        Ok(())
    }
}

fn parse_env<T>(name: &str, value: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    value
        .parse()
        .map_err(|e| ConfigError::Invalid(format!("{name}={value}: {e}")))
}
