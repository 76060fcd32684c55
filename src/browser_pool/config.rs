use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::utils::constants::{
    DEFAULT_POOL_CAPACITY, HEALTH_CHECK_TIMEOUT_SECS, REPLENISH_BACKOFF_MS,
    SESSION_CREATE_ATTEMPTS, SESSION_CREATE_RETRY_DELAY_MS,
};

/// Configuration for the session pool
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PoolConfig {
    /// Number of sessions kept alive (default: 10)
    pub capacity: usize,
    /// Launch attempts per session before giving up (default: 3)
    pub create_attempts: u32,
    /// Delay between launch attempts in milliseconds (default: 1000)
    pub create_retry_delay_ms: u64,
    /// Deadline for the liveness probe in seconds (default: 5)
    pub health_check_timeout_secs: u64,
    /// Backoff between background replenishment rounds in milliseconds (default: 2000)
    pub replenish_backoff_ms: u64,
    /// Run browsers headless (default: true)
    pub headless: bool,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_POOL_CAPACITY,
            create_attempts: SESSION_CREATE_ATTEMPTS,
            create_retry_delay_ms: SESSION_CREATE_RETRY_DELAY_MS,
            health_check_timeout_secs: HEALTH_CHECK_TIMEOUT_SECS,
            replenish_backoff_ms: REPLENISH_BACKOFF_MS,
            headless: true,
        }
    }
}

impl PoolConfig {
    /// Pool of `capacity` sessions with every other knob at its default
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            capacity,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn create_retry_delay(&self) -> Duration {
        Duration::from_millis(self.create_retry_delay_ms)
    }

    #[must_use]
    pub fn health_check_timeout(&self) -> Duration {
        Duration::from_secs(self.health_check_timeout_secs)
    }

    #[must_use]
    pub fn replenish_backoff(&self) -> Duration {
        Duration::from_millis(self.replenish_backoff_ms)
    }
}
