//! Service configuration
//!
//! `HarvestConfig` gathers the pool, search, crawl, server, research and
//! oracle sections. It is built from defaults, an optional TOML file and
//! environment overrides (see [`HarvestConfig::load`]), or fluently through
//! [`HarvestConfigBuilder`].

mod builder;
mod error;
mod loader;
mod types;

pub use builder::HarvestConfigBuilder;
pub use error::ConfigError;
pub use loader::{
    CONFIG_PATH_ENV, POOL_SIZE_ENV, SEARCH_HOST_ENV, SEARCH_PORT_ENV, SERVER_PORT_ENV,
};
pub use types::{CrawlConfig, HarvestConfig, SearchConfig, ServerConfig};
