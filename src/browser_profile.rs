//! Per-session Chrome profile directories
//!
//! Every pooled session gets its own UUID-named user data directory so that
//! concurrent Chrome processes never contend for the same `SingletonLock`.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Prefix shared by all profile directories this crate creates
pub const PROFILE_PREFIX: &str = "kodegen_research_chrome";

/// RAII wrapper for a Chrome profile directory
///
/// Removes the directory on drop unless ownership was handed over with
/// [`BrowserProfile::into_path`].
#[derive(Debug)]
pub struct BrowserProfile {
    path: PathBuf,
    cleanup_on_drop: bool,
}

impl BrowserProfile {
    fn new(path: PathBuf) -> Self {
        Self {
            path,
            cleanup_on_drop: true,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Consume the profile and return the path, disabling auto-cleanup
    ///
    /// Used when the session that owns the browser takes over cleanup.
    pub fn into_path(mut self) -> PathBuf {
        self.cleanup_on_drop = false;
        std::mem::take(&mut self.path)
    }
}

impl Drop for BrowserProfile {
    fn drop(&mut self) {
        if self.cleanup_on_drop && self.path.exists() {
            info!("BrowserProfile cleanup: removing {}", self.path.display());
            if let Err(e) = std::fs::remove_dir_all(&self.path) {
                warn!("Failed to cleanup profile directory {}: {}", self.path.display(), e);
            }
        }
    }
}

/// Create a unique profile directory under the system temp dir
///
/// Uses `create_dir` rather than `create_dir_all` so a UUID collision fails
/// loudly instead of sharing a profile.
pub fn create_unique_profile(prefix: &str) -> Result<BrowserProfile> {
    let path = std::env::temp_dir().join(format!("{}_{}", prefix, Uuid::new_v4()));

    debug!("Creating unique Chrome profile: {}", path.display());

    std::fs::create_dir(&path)
        .with_context(|| format!("Failed to create profile directory: {}", path.display()))?;

    Ok(BrowserProfile::new(path))
}

/// Remove a profile directory that is no longer backed by a running browser
///
/// Must only be called after the browser process has exited, otherwise
/// Chrome may still hold file handles inside it.
pub fn remove_profile_dir(path: &Path) {
    if !path.exists() {
        return;
    }
    debug!("Removing Chrome profile directory: {}", path.display());
    if let Err(e) = std::fs::remove_dir_all(path) {
        warn!(
            "Failed to clean up profile directory {}: {}. Manual cleanup may be required.",
            path.display(),
            e
        );
    }
}
