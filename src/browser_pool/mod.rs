//! Fixed-capacity pool of health-checked browser sessions
//!
//! The pool owns exactly `capacity` sessions. Each one is either idle in the
//! queue or checked out through a [`SessionLease`] by exactly one caller.
//! Callers never observe an unhealthy session: [`SessionPool::acquire`] probes
//! the session it dequeues and transparently replaces it on failure, and
//! [`SessionPool::release`] probes again before requeueing.
//!
//! Capacity is conserved. Every discarded session is paired with the launch
//! of a replacement, and a replacement is only launched after its predecessor
//! has been quit, so the number of live sessions never exceeds `capacity`.
//! When a replacement cannot be launched even after retries, a background
//! replenisher keeps trying until it succeeds or the pool shuts down.
//!
//! The pool is an explicitly constructed, explicitly owned resource. Wrap it
//! in an `Arc`, inject it into the components that need it, and call
//! [`SessionPool::shutdown`] once at teardown.

mod chrome;
mod config;
mod error;
mod lease;
mod session;

pub use chrome::{ChromeSession, ChromeSessionFactory};
pub use config::PoolConfig;
pub use error::PoolError;
pub use lease::SessionLease;
pub use session::{BrowserSession, SessionFactory, SessionHealth, SessionId};

use futures::future::join_all;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::time::{Duration, Instant};
use tokio::sync::Semaphore;
use tracing::{debug, error, info, warn};

use crate::utils::with_timeout;

/// Upper bound for quitting one session
const QUIT_TIMEOUT: Duration = Duration::from_secs(10);

/// Session pool backed by real Chrome processes
pub type ChromePool = SessionPool<ChromeSessionFactory>;

/// A session with pool metadata
pub(crate) struct PooledSession<S> {
    pub(crate) id: SessionId,
    pub(crate) health: SessionHealth,
    pub(crate) created_at: Instant,
    pub(crate) last_health_check: Instant,
    pub(crate) session: S,
}

impl<S> PooledSession<S> {
    fn new(id: SessionId, session: S) -> Self {
        let now = Instant::now();
        Self {
            id,
            health: SessionHealth::Healthy,
            created_at: now,
            last_health_check: now,
            session,
        }
    }
}

/// Point-in-time counters for monitoring and tests
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct PoolStats {
    pub capacity: usize,
    pub available: usize,
    pub in_use: usize,
    /// Sessions launched over the pool's lifetime, replacements included
    pub created_total: u64,
    /// Sessions discarded and replaced
    pub restarted_total: u64,
    /// Background replenishers still trying to restore capacity
    pub replenishing: usize,
    pub shut_down: bool,
}

/// Fixed-capacity pool of browser sessions
pub struct SessionPool<F: SessionFactory> {
    factory: F,
    config: PoolConfig,
    /// Idle sessions, oldest first
    idle: Mutex<VecDeque<PooledSession<F::Session>>>,
    /// One permit per idle session; closed on shutdown
    ready: Semaphore,
    next_id: AtomicU64,
    in_use: AtomicUsize,
    created_total: AtomicU64,
    restarted_total: AtomicU64,
    replenishing: AtomicUsize,
    shut_down: AtomicBool,
}

impl<F: SessionFactory> SessionPool<F> {
    /// Launch `config.capacity` sessions and return the ready pool
    ///
    /// Sessions are launched concurrently, each with bounded retry. If any
    /// slot cannot be filled the sessions already launched are quit and the
    /// creation error is returned: a pool that starts below capacity is
    /// treated as a fatal startup failure.
    pub async fn start(factory: F, config: PoolConfig) -> Result<Arc<Self>, PoolError> {
        if config.capacity == 0 {
            return Err(PoolError::SessionCreation {
                attempts: 0,
                source: anyhow::anyhow!("pool capacity must be at least 1"),
            });
        }

        info!(
            capacity = config.capacity,
            "Starting session pool with {} sessions", config.capacity
        );

        let pool = Arc::new(Self {
            factory,
            idle: Mutex::new(VecDeque::with_capacity(config.capacity)),
            ready: Semaphore::new(0),
            next_id: AtomicU64::new(0),
            in_use: AtomicUsize::new(0),
            created_total: AtomicU64::new(0),
            restarted_total: AtomicU64::new(0),
            replenishing: AtomicUsize::new(0),
            shut_down: AtomicBool::new(false),
            config,
        });

        let launches = (0..pool.config.capacity).map(|_| pool.create_with_retry());
        let mut failure = None;
        for result in join_all(launches).await {
            match result {
                Ok(pooled) => {
                    if let Some(rejected) = pool.push_idle(pooled) {
                        pool.discard(rejected).await;
                    }
                }
                Err(e) => {
                    failure.get_or_insert(e);
                }
            }
        }

        if let Some(err) = failure {
            error!("Session pool startup failed: {err}");
            pool.shutdown().await;
            return Err(err);
        }

        info!("Session pool initialized with {} sessions", pool.config.capacity);
        Ok(pool)
    }

    #[must_use]
    pub fn config(&self) -> &PoolConfig {
        &self.config
    }

    #[must_use]
    pub fn capacity(&self) -> usize {
        self.config.capacity
    }

    #[must_use]
    pub fn is_shut_down(&self) -> bool {
        self.shut_down.load(Ordering::SeqCst)
    }

    #[must_use]
    pub fn stats(&self) -> PoolStats {
        PoolStats {
            capacity: self.config.capacity,
            available: self.idle.lock().len(),
            in_use: self.in_use.load(Ordering::SeqCst),
            created_total: self.created_total.load(Ordering::SeqCst),
            restarted_total: self.restarted_total.load(Ordering::SeqCst),
            replenishing: self.replenishing.load(Ordering::SeqCst),
            shut_down: self.is_shut_down(),
        }
    }

    /// Check out a healthy session, waiting while the pool is exhausted
    ///
    /// The dequeued session is probed first; an unhealthy one is quit and
    /// replaced and the caller keeps waiting for the next idle session.
    ///
    /// # Errors
    /// Only [`PoolError::ShutDown`], once [`SessionPool::shutdown`] has run.
    pub async fn acquire(self: &Arc<Self>) -> Result<SessionLease<F>, PoolError> {
        loop {
            let permit = self.ready.acquire().await.map_err(|_| PoolError::ShutDown)?;
            permit.forget();

            // A permit is only ever added after its session was queued, so the
            // queue can only be empty here if shutdown drained it.
            let Some(mut pooled) = self.idle.lock().pop_front() else {
                if self.is_shut_down() {
                    return Err(PoolError::ShutDown);
                }
                continue;
            };

            if self.check_health(&mut pooled).await {
                self.in_use.fetch_add(1, Ordering::SeqCst);
                debug!(
                    session_id = %pooled.id,
                    "Acquired session. {} remaining.",
                    self.ready.available_permits()
                );
                return Ok(SessionLease::new(pooled, Arc::clone(self)));
            }

            warn!(session_id = %pooled.id, "Session unhealthy during acquire. Restarting...");
            self.replace(pooled).await;
        }
    }

    /// Return a session to the pool
    ///
    /// The session is probed; a failing one is quit and replaced before this
    /// call returns (or handed to a background replenisher if the
    /// replacement cannot be launched).
    pub async fn release(self: &Arc<Self>, mut lease: SessionLease<F>) {
        let Some(pooled) = lease.take() else {
            return;
        };
        self.in_use.fetch_sub(1, Ordering::SeqCst);

        let mut pooled = pooled;
        if self.is_shut_down() {
            self.discard(pooled).await;
            return;
        }

        if self.check_health(&mut pooled).await {
            let id = pooled.id;
            match self.push_idle(pooled) {
                None => debug!(session_id = %id, "Released session. {} available.", self.ready.available_permits()),
                Some(rejected) => self.discard(rejected).await,
            }
        } else {
            warn!(session_id = %pooled.id, "Session unhealthy during release. Restarting...");
            self.replace(pooled).await;
        }
    }

    /// Forcibly discard a checked-out session and put a fresh one in its place
    ///
    /// Quit errors are swallowed. Used after failed page operations, where
    /// the session may be wedged in a state a probe would not reveal.
    pub async fn restart(self: &Arc<Self>, mut lease: SessionLease<F>) {
        let Some(pooled) = lease.take() else {
            return;
        };
        self.in_use.fetch_sub(1, Ordering::SeqCst);
        info!(session_id = %pooled.id, "Restarting session due to fatal error...");
        self.replace(pooled).await;
    }

    /// Quit every idle session and refuse further acquisitions
    ///
    /// Idempotent. Sessions checked out at the time are quit when their
    /// leases come back. Pending `acquire` calls fail with
    /// [`PoolError::ShutDown`].
    pub async fn shutdown(&self) {
        if self.shut_down.swap(true, Ordering::SeqCst) {
            debug!("Session pool already shut down");
            return;
        }

        info!("Shutting down session pool");
        self.ready.close();

        let drained: Vec<_> = self.idle.lock().drain(..).collect();
        let count = drained.len();
        join_all(drained.into_iter().map(|pooled| self.discard(pooled))).await;

        info!("Session pool shutdown complete ({count} idle sessions quit)");
    }

    /// Called from `SessionLease::drop` when a lease was neither released nor
    /// restarted, e.g. because the operation holding it was abandoned on
    /// timeout. The session's state is unknown, so it is replaced.
    pub(crate) fn reclaim_abandoned(self: &Arc<Self>, pooled: PooledSession<F::Session>) {
        self.in_use.fetch_sub(1, Ordering::SeqCst);
        let id = pooled.id;

        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                warn!(session_id = %id, "Session lease abandoned; replacing session");
                let pool = Arc::clone(self);
                handle.spawn(async move {
                    pool.replace(pooled).await;
                });
            }
            Err(_) => {
                warn!(
                    session_id = %id,
                    "Session lease abandoned outside a runtime; session dropped without replacement"
                );
                drop(pooled);
            }
        }
    }

    async fn check_health(&self, pooled: &mut PooledSession<F::Session>) -> bool {
        let timeout = self.config.health_check_timeout();
        let healthy = match tokio::time::timeout(timeout, pooled.session.probe()).await {
            Ok(Ok(2)) => true,
            Ok(Ok(other)) => {
                warn!(session_id = %pooled.id, "Health check returned {other}, expected 2");
                false
            }
            Ok(Err(e)) => {
                warn!(session_id = %pooled.id, "Health check failed: {e:#}");
                false
            }
            Err(_) => {
                warn!(
                    session_id = %pooled.id,
                    "Health check timeout after {:.1}s",
                    timeout.as_secs_f64()
                );
                false
            }
        };

        pooled.last_health_check = Instant::now();
        pooled.health = if healthy {
            SessionHealth::Healthy
        } else {
            SessionHealth::Unhealthy
        };
        healthy
    }

    /// Queue an idle session, or hand it back if the pool is shut down
    fn push_idle(&self, pooled: PooledSession<F::Session>) -> Option<PooledSession<F::Session>> {
        {
            let mut idle = self.idle.lock();
            if self.is_shut_down() {
                return Some(pooled);
            }
            idle.push_back(pooled);
        }
        self.ready.add_permits(1);
        None
    }

    /// Quit a session, swallowing (but logging) quit errors
    async fn discard(&self, mut pooled: PooledSession<F::Session>) {
        pooled.health = SessionHealth::Restarting;
        let id = pooled.id;
        let age = pooled.created_at.elapsed();
        match with_timeout(pooled.session.quit(), QUIT_TIMEOUT, "Session quit").await {
            Ok(()) => debug!(session_id = %id, "Session quit after {:.1}s in service", age.as_secs_f64()),
            Err(e) => warn!(session_id = %id, "Session quit error: {e:#}"),
        }
    }

    /// Quit `pooled` and fill its slot with a freshly launched session
    async fn replace(self: &Arc<Self>, pooled: PooledSession<F::Session>) {
        let old_id = pooled.id;
        self.discard(pooled).await;

        if self.is_shut_down() {
            return;
        }
        self.restarted_total.fetch_add(1, Ordering::SeqCst);

        match self.create_with_retry().await {
            Ok(fresh) => {
                let new_id = fresh.id;
                match self.push_idle(fresh) {
                    None => info!("Session {old_id} replaced by {new_id} and returned to pool"),
                    Some(rejected) => self.discard(rejected).await,
                }
            }
            Err(e) => {
                error!("Failed to replace session {old_id}: {e}. Scheduling background replenishment");
                self.spawn_replenisher();
            }
        }
    }

    /// Keep trying to launch one session until it succeeds or the pool shuts down
    fn spawn_replenisher(self: &Arc<Self>) {
        self.replenishing.fetch_add(1, Ordering::SeqCst);
        let pool = Arc::clone(self);

        tokio::spawn(async move {
            let backoff = pool.config.replenish_backoff();
            while !pool.is_shut_down() {
                tokio::time::sleep(backoff).await;
                match pool.create_with_retry().await {
                    Ok(fresh) => {
                        let id = fresh.id;
                        match pool.push_idle(fresh) {
                            None => info!(session_id = %id, "Background replenishment restored pool capacity"),
                            Some(rejected) => pool.discard(rejected).await,
                        }
                        break;
                    }
                    Err(e) => warn!("Background replenishment attempt failed: {e}"),
                }
            }
            pool.replenishing.fetch_sub(1, Ordering::SeqCst);
        });
    }

    async fn create_with_retry(&self) -> Result<PooledSession<F::Session>, PoolError> {
        let attempts = self.config.create_attempts.max(1);
        let delay = self.config.create_retry_delay();
        let mut last_error = None;

        for attempt in 1..=attempts {
            match self.factory.create().await {
                Ok(session) => {
                    let id = SessionId(self.next_id.fetch_add(1, Ordering::SeqCst));
                    self.created_total.fetch_add(1, Ordering::SeqCst);
                    debug!(session_id = %id, "New browser session created");
                    return Ok(PooledSession::new(id, session));
                }
                Err(e) => {
                    warn!("Attempt {attempt}/{attempts} to create session failed: {e:#}");
                    last_error = Some(e);
                    if attempt < attempts {
                        tokio::time::sleep(delay).await;
                    }
                }
            }
        }

        Err(PoolError::SessionCreation {
            attempts,
            source: last_error.unwrap_or_else(|| anyhow::anyhow!("no launch attempt was made")),
        })
    }
}
