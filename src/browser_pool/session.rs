//! Session abstraction the pool manages
//!
//! A session is one live automation handle (a Chrome process with a single
//! tab in production). The pool only needs four things from it: navigate,
//! snapshot the DOM, answer a liveness probe, and quit.

use anyhow::Result;
use async_trait::async_trait;
use std::fmt;

/// One live headless-browser automation handle
///
/// Methods take `&self` because a session is only ever driven by the single
/// caller holding its lease.
#[async_trait]
pub trait BrowserSession: Send + Sync + 'static {
    /// Navigate the session's tab to `url` and wait for the load to settle
    ///
    /// Implementations apply no deadline of their own beyond protocol
    /// timeouts; callers bound this with [`crate::utils::with_timeout`].
    async fn navigate(&self, url: &str) -> Result<()>;

    /// Serialized DOM of the current document
    async fn page_source(&self) -> Result<String>;

    /// Evaluate `1 + 1` in the page and return the result
    ///
    /// The cheapest side-effect-free round trip through the renderer. Any
    /// error, or any answer other than `2`, marks the session unhealthy.
    async fn probe(&self) -> Result<i64>;

    /// Terminate the underlying browser and release its resources
    async fn quit(self) -> Result<()>
    where
        Self: Sized;
}

/// Creates sessions for the pool
#[async_trait]
pub trait SessionFactory: Send + Sync + 'static {
    type Session: BrowserSession;

    /// Launch one new session
    ///
    /// The pool retries failures with a fixed delay; implementations should
    /// not retry internally.
    async fn create(&self) -> Result<Self::Session>;
}

/// Pool-assigned identity of a session, unique for the pool's lifetime
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SessionId(pub u64);

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "session-{}", self.0)
    }
}

/// Health state of a pooled session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionHealth {
    /// Last probe succeeded; eligible to be handed out
    Healthy,
    /// Last probe failed or timed out; will be discarded
    Unhealthy,
    /// Being quit and replaced
    Restarting,
}
