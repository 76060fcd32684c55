use thiserror::Error;

/// Errors surfaced by [`super::SessionPool`]
///
/// Health-check failures never appear here: they are recovered inside the
/// pool by replacing the session.
#[derive(Debug, Error)]
pub enum PoolError {
    /// A session could not be launched after every retry
    ///
    /// Fatal during pool construction.
    #[error("Failed to create browser session after {attempts} attempts: {source:#}")]
    SessionCreation {
        attempts: u32,
        #[source]
        source: anyhow::Error,
    },

    /// The pool has been shut down; no further sessions will be handed out
    #[error("Session pool has been shut down")]
    ShutDown,
}
