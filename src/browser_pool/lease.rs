use std::ops::Deref;
use std::sync::Arc;

use super::{PooledSession, SessionFactory, SessionHealth, SessionId, SessionPool};

/// Exclusive, temporary ownership of one pooled session
///
/// Hand the lease back with [`SessionLease::release`] after a successful
/// operation or [`SessionLease::restart`] after a failed one. A lease that is
/// simply dropped (for instance because the future holding it was abandoned
/// on timeout) is treated as poisoned: the session is quit and replaced in
/// the background so the pool's capacity is preserved.
pub struct SessionLease<F: SessionFactory> {
    pooled: Option<PooledSession<F::Session>>,
    pool: Arc<SessionPool<F>>,
}

impl<F: SessionFactory> SessionLease<F> {
    pub(crate) fn new(pooled: PooledSession<F::Session>, pool: Arc<SessionPool<F>>) -> Self {
        Self {
            pooled: Some(pooled),
            pool,
        }
    }

    /// Identity of the leased session
    #[must_use]
    pub fn id(&self) -> SessionId {
        self.pooled
            .as_ref()
            .map_or(SessionId(u64::MAX), |pooled| pooled.id)
    }

    #[must_use]
    pub fn health(&self) -> SessionHealth {
        self.pooled
            .as_ref()
            .map_or(SessionHealth::Restarting, |pooled| pooled.health)
    }

    /// Health-check the session and return it to the pool
    pub async fn release(self) {
        let pool = Arc::clone(&self.pool);
        pool.release(self).await;
    }

    /// Discard the session and put a fresh one in its place
    pub async fn restart(self) {
        let pool = Arc::clone(&self.pool);
        pool.restart(self).await;
    }

    pub(crate) fn take(&mut self) -> Option<PooledSession<F::Session>> {
        self.pooled.take()
    }
}

impl<F: SessionFactory> Deref for SessionLease<F> {
    type Target = F::Session;

    fn deref(&self) -> &Self::Target {
        match &self.pooled {
            Some(pooled) => &pooled.session,
            // `take` is only called by the pool while consuming the lease
            None => unreachable!("BUG: session lease used after being returned to the pool"),
        }
    }
}

impl<F: SessionFactory> Drop for SessionLease<F> {
    fn drop(&mut self) {
        if let Some(pooled) = self.pooled.take() {
            self.pool.reclaim_abandoned(pooled);
        }
    }
}
