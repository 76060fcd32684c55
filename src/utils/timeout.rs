//! Timeout helper for browser operations
//!
//! Browser calls can hang indefinitely on slow DNS, streaming responses or a
//! wedged renderer. Every such call goes through [`with_timeout`], which turns
//! an elapsed deadline into an ordinary error naming the operation.

use anyhow::Result;
use std::future::Future;
use std::time::Duration;

/// Run `operation` with an explicit deadline
///
/// The future is dropped when the deadline passes. Dropping does not stop
/// work already queued inside the browser, so callers that hit a timeout must
/// treat the session they were using as suspect.
///
/// # Returns
/// * `Ok(T)` - Operation completed in time
/// * `Err` - Either the operation failed or `"{operation_name} timeout after ..."`
pub async fn with_timeout<F, T>(operation: F, timeout: Duration, operation_name: &str) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    match tokio::time::timeout(timeout, operation).await {
        Ok(result) => result,
        Err(_) => Err(anyhow::anyhow!(
            "{operation_name} timeout after {:.1}s",
            timeout.as_secs_f64()
        )),
    }
}
