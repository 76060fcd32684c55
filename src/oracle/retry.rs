use async_trait::async_trait;
use rand::Rng;
use std::future::Future;
use std::time::Duration;
use tracing::warn;

use super::{Brief, Grade, Oracle, OracleError, Relevance};
use crate::utils::constants::ORACLE_ATTEMPTS;

/// Retries transient oracle failures with exponential backoff and jitter
///
/// Non-transient errors fail immediately. When every attempt fails the
/// result is [`OracleError::Exhausted`] wrapping the last error.
pub struct RetryingOracle<O> {
    inner: O,
    attempts: u32,
    base_delay: Duration,
}

impl<O: Oracle> RetryingOracle<O> {
    pub fn new(inner: O) -> Self {
        Self {
            inner,
            attempts: ORACLE_ATTEMPTS,
            base_delay: Duration::from_millis(500),
        }
    }

    #[must_use]
    pub fn with_attempts(mut self, attempts: u32) -> Self {
        self.attempts = attempts.max(1);
        self
    }

    /// First backoff step; later steps double it. Zero disables sleeping.
    #[must_use]
    pub fn with_base_delay(mut self, base_delay: Duration) -> Self {
        self.base_delay = base_delay;
        self
    }

    #[must_use]
    pub fn inner(&self) -> &O {
        &self.inner
    }

    async fn retry<T, F, Fut>(&self, operation: &str, f: F) -> Result<T, OracleError>
    where
        F: Fn() -> Fut + Send + Sync,
        Fut: Future<Output = Result<T, OracleError>> + Send,
        T: Send,
    {
        let mut attempt = 1;
        loop {
            match f().await {
                Ok(value) => return Ok(value),
                Err(e) if !e.is_transient() => {
                    warn!("Oracle {operation} failed permanently: {e}");
                    return Err(e);
                }
                Err(e) if attempt >= self.attempts => {
                    warn!("Oracle {operation} failed after {attempt} attempts: {e}");
                    return Err(OracleError::Exhausted {
                        attempts: attempt,
                        last: Box::new(e),
                    });
                }
                Err(e) => {
                    let delay = self.backoff(attempt);
                    warn!(
                        "Oracle {operation} attempt {attempt}/{} failed, retrying in {}ms: {e}",
                        self.attempts,
                        delay.as_millis()
                    );
                    if !delay.is_zero() {
                        tokio::time::sleep(delay).await;
                    }
                    attempt += 1;
                }
            }
        }
    }

    fn backoff(&self, attempt: u32) -> Duration {
        let base_ms = u64::try_from(self.base_delay.as_millis()).unwrap_or(u64::MAX);
        if base_ms == 0 {
            return Duration::ZERO;
        }
        let exponential = base_ms.saturating_mul(1 << (attempt - 1).min(16));
        let jitter = rand::rng().random_range(0..=base_ms);
        Duration::from_millis(exponential.saturating_add(jitter))
    }
}

#[async_trait]
impl<O: Oracle> Oracle for RetryingOracle<O> {
    async fn score_relevance(&self, query: &str, document: &str) -> Result<Relevance, OracleError> {
        self.retry("score_relevance", || self.inner.score_relevance(query, document))
            .await
    }

    async fn compress(&self, query: &str, document: &str) -> Result<Brief, OracleError> {
        self.retry("compress", || self.inner.compress(query, document)).await
    }

    async fn grade_sufficiency(&self, queries: &[String], corpus: &str) -> Result<Grade, OracleError> {
        self.retry("grade_sufficiency", || self.inner.grade_sufficiency(queries, corpus))
            .await
    }

    async fn assign_budget(&self, queries: &[String]) -> Result<Option<u32>, OracleError> {
        self.retry("assign_budget", || self.inner.assign_budget(queries)).await
    }
}
