//! Chrome-backed sessions
//!
//! Each session is its own Chrome process with a private profile directory
//! and a single tab that every navigation reuses. Processes are never shared
//! between sessions, so a renderer crash takes down exactly one pool slot.

use anyhow::{Context, Result};
use async_trait::async_trait;
use chromiumoxide::{Browser, Page};
use std::path::PathBuf;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::session::{BrowserSession, SessionFactory};
use crate::browser_profile::{PROFILE_PREFIX, create_unique_profile, remove_profile_dir};
use crate::browser_setup::{LaunchSpec, LaunchedBrowser, apply_stealth_measures, launch_browser};
use crate::utils::constants::{DEFAULT_REQUEST_TIMEOUT_SECS, IMPLICIT_WAIT_SECS};

pub struct ChromeSession {
    browser: Browser,
    page: Page,
    handler: JoinHandle<()>,
    profile_dir: Option<PathBuf>,
    implicit_wait: Duration,
}

#[async_trait]
impl BrowserSession for ChromeSession {
    async fn navigate(&self, url: &str) -> Result<()> {
        self.page
            .goto(url)
            .await
            .with_context(|| format!("Failed to navigate to {url}"))?;

        // Pages that keep long-polling connections open may never report a
        // settled load; the DOM is usable regardless.
        if tokio::time::timeout(self.implicit_wait, self.page.wait_for_navigation())
            .await
            .is_err()
        {
            debug!(
                "Load did not settle within {:.1}s for {url}",
                self.implicit_wait.as_secs_f64()
            );
        }
        Ok(())
    }

    async fn page_source(&self) -> Result<String> {
        self.page.content().await.context("Failed to read page source")
    }

    async fn probe(&self) -> Result<i64> {
        self.page
            .evaluate("1 + 1")
            .await
            .context("Probe evaluation failed")?
            .into_value::<i64>()
            .context("Probe returned a non-integer value")
    }

    async fn quit(mut self) -> Result<()> {
        let closed = self.browser.close().await;
        let exited = self.browser.wait().await;
        self.handler.abort();

        // Only after the process exited; Chrome holds handles in the profile.
        if let Some(dir) = self.profile_dir.take() {
            remove_profile_dir(&dir);
        }

        closed.context("Failed to close browser")?;
        exited.context("Failed to wait for browser exit")?;
        Ok(())
    }
}

impl Drop for ChromeSession {
    fn drop(&mut self) {
        self.handler.abort();
        if let Some(dir) = self.profile_dir.take() {
            warn!(
                "ChromeSession dropped without quit; profile {} removed while Chrome may still be running",
                dir.display()
            );
            remove_profile_dir(&dir);
        }
    }
}

/// Launches one Chrome process per session
#[derive(Debug, Clone)]
pub struct ChromeSessionFactory {
    headless: bool,
    request_timeout: Duration,
    implicit_wait: Duration,
}

impl Default for ChromeSessionFactory {
    fn default() -> Self {
        Self {
            headless: true,
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
            implicit_wait: Duration::from_secs(IMPLICIT_WAIT_SECS),
        }
    }
}

impl ChromeSessionFactory {
    #[must_use]
    pub fn new(headless: bool) -> Self {
        Self {
            headless,
            ..Self::default()
        }
    }

    /// CDP request timeout applied to every protocol command
    #[must_use]
    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Upper bound on waiting for a navigation to settle
    #[must_use]
    pub fn implicit_wait(mut self, wait: Duration) -> Self {
        self.implicit_wait = wait;
        self
    }
}

#[async_trait]
impl SessionFactory for ChromeSessionFactory {
    type Session = ChromeSession;

    async fn create(&self) -> Result<ChromeSession> {
        let profile = create_unique_profile(PROFILE_PREFIX)?;

        let LaunchedBrowser {
            mut browser,
            handler,
        } = launch_browser(&LaunchSpec {
            headless: self.headless,
            user_data_dir: profile.path().to_path_buf(),
            request_timeout: self.request_timeout,
        })
        .await?;

        let page = match browser.new_page("about:blank").await {
            Ok(page) => page,
            Err(e) => {
                let _ = browser.close().await;
                let _ = browser.wait().await;
                handler.abort();
                // `profile` drops here and removes the directory
                return Err(anyhow::Error::new(e).context("Failed to open session tab"));
            }
        };

        if let Err(e) = apply_stealth_measures(&page).await {
            warn!("Stealth injection failed: {e:#}");
        }

        let profile_dir = profile.into_path();
        info!("Chrome session launched with profile {}", profile_dir.display());

        Ok(ChromeSession {
            browser,
            page,
            handler,
            profile_dir: Some(profile_dir),
            implicit_wait: self.implicit_wait,
        })
    }
}
