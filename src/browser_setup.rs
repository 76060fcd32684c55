//! Chrome discovery and launch for pooled sessions

use anyhow::{Context, Result, anyhow};
use chromiumoxide::browser::{Browser, BrowserConfigBuilder, HeadlessMode};
use chromiumoxide::cdp::browser_protocol::page::AddScriptToEvaluateOnNewDocumentParams;
use chromiumoxide::fetcher::{BrowserFetcher, BrowserFetcherOptions};
use futures::StreamExt;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::Duration;
use tokio::task::{self, JoinHandle};
use tracing::{debug, error, info, trace, warn};

use crate::utils::constants::CHROME_USER_AGENT;

/// Overrides executable discovery when it points at an existing file
pub const CHROMIUM_PATH_ENV: &str = "CHROMIUM_PATH";

#[cfg(target_os = "windows")]
const KNOWN_LOCATIONS: &[&str] = &[
    r"C:\Program Files\Google\Chrome\Application\chrome.exe",
    r"C:\Program Files (x86)\Google\Chrome\Application\chrome.exe",
    r"C:\Program Files\Chromium\Application\chrome.exe",
];

#[cfg(target_os = "macos")]
const KNOWN_LOCATIONS: &[&str] = &[
    "/Applications/Google Chrome.app/Contents/MacOS/Google Chrome",
    "/Applications/Chromium.app/Contents/MacOS/Chromium",
    "~/Applications/Google Chrome.app/Contents/MacOS/Google Chrome",
    "/opt/homebrew/bin/chromium",
];

#[cfg(not(any(target_os = "windows", target_os = "macos")))]
const KNOWN_LOCATIONS: &[&str] = &[
    "/usr/bin/google-chrome",
    "/usr/bin/google-chrome-stable",
    "/usr/bin/chromium",
    "/usr/bin/chromium-browser",
    "/snap/bin/chromium",
    "/usr/local/bin/chromium",
    "/opt/google/chrome/chrome",
];

const PATH_COMMANDS: &[&str] = &["chromium", "chromium-browser", "google-chrome", "chrome"];

/// Flags every session process starts with
///
/// Search engines and many article sites answer automation-flagged browsers
/// with captchas or empty shells.
const AUTOMATION_ARGS: &[&str] = &[
    "--disable-blink-features=AutomationControlled",
    "--disable-gpu",
    "--disable-dev-shm-usage",
    "--disable-infobars",
    "--disable-notifications",
    "--disable-software-rasterizer",
    "--disable-setuid-sandbox",
    "--no-first-run",
    "--no-default-browser-check",
    "--no-sandbox",
    "--ignore-certificate-errors",
    "--disable-extensions",
    "--disable-popup-blocking",
    "--disable-background-networking",
    "--disable-background-timer-throttling",
    "--disable-backgrounding-occluded-windows",
    "--disable-breakpad",
    "--disable-features=TranslateUI",
    "--disable-hang-monitor",
    "--disable-prompt-on-repost",
    "--metrics-recording-only",
    "--password-store=basic",
    "--use-mock-keychain",
    "--hide-scrollbars",
    "--mute-audio",
];

/// Evasion scripts registered before every document a session loads
const STEALTH_SCRIPTS: &[&str] = &[
    r"Object.defineProperty(navigator, 'webdriver', { get: () => false });",
    r"Object.defineProperty(navigator, 'languages', { get: () => ['en-US', 'en'] });",
    r"
        if (!window.chrome) {
            window.chrome = {};
        }
        if (!window.chrome.runtime) {
            window.chrome.runtime = {
                connect: () => ({
                    onMessage: { addListener: () => {}, removeListener: () => {} },
                    postMessage: () => {}
                })
            };
        }
    ",
];

/// Everything needed to start one session process
#[derive(Debug, Clone)]
pub struct LaunchSpec {
    pub headless: bool,
    pub user_data_dir: PathBuf,
    pub request_timeout: Duration,
}

/// A running Chrome process plus the task draining its CDP events
///
/// The handler task must be aborted once the browser has been closed.
pub struct LaunchedBrowser {
    pub browser: Browser,
    pub handler: JoinHandle<()>,
}

/// Locate an installed Chrome/Chromium, downloading one as a last resort
pub async fn resolve_executable() -> Result<PathBuf> {
    if let Some(path) = installed_executable() {
        return Ok(path);
    }
    warn!("No local Chrome/Chromium found; fetching a managed build");
    download_managed_browser().await
}

/// Search `CHROMIUM_PATH`, the platform's usual install locations and `PATH`
pub fn installed_executable() -> Option<PathBuf> {
    if let Ok(value) = std::env::var(CHROMIUM_PATH_ENV) {
        let path = PathBuf::from(value);
        if path.exists() {
            info!("Using browser from {CHROMIUM_PATH_ENV}: {}", path.display());
            return Some(path);
        }
        warn!("{CHROMIUM_PATH_ENV} points to a missing file: {}", path.display());
    }

    let known = KNOWN_LOCATIONS
        .iter()
        .filter_map(|location| expand_home(location))
        .find(|path| path.exists());
    if let Some(path) = known {
        info!("Found browser at: {}", path.display());
        return Some(path);
    }

    if cfg!(target_os = "windows") {
        return None;
    }
    PATH_COMMANDS.iter().find_map(|cmd| {
        let output = Command::new("which").arg(cmd).output().ok()?;
        if !output.status.success() {
            return None;
        }
        let found = String::from_utf8_lossy(&output.stdout).trim().to_string();
        if found.is_empty() {
            return None;
        }
        info!("Found browser on PATH: {found}");
        Some(PathBuf::from(found))
    })
}

fn expand_home(location: &str) -> Option<PathBuf> {
    match location.strip_prefix("~/") {
        Some(rest) => dirs::home_dir().map(|home| home.join(rest)),
        None => Some(PathBuf::from(location)),
    }
}

/// Download a Chromium build into the user cache directory
pub async fn download_managed_browser() -> Result<PathBuf> {
    let cache_dir = dirs::cache_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join("kodegen_research")
        .join("chromium");
    std::fs::create_dir_all(&cache_dir)
        .with_context(|| format!("Failed to create {}", cache_dir.display()))?;

    info!("Downloading managed Chromium into {}", cache_dir.display());
    let options = BrowserFetcherOptions::builder()
        .with_path(&cache_dir)
        .build()
        .context("Failed to build fetcher options")?;
    let revision = BrowserFetcher::new(options)
        .fetch()
        .await
        .context("Failed to fetch Chromium")?;

    info!("Managed Chromium ready at {}", revision.folder_path.display());
    Ok(revision.executable_path)
}

/// Start a Chrome process with the automation flag set and drain its events
pub async fn launch_browser(spec: &LaunchSpec) -> Result<LaunchedBrowser> {
    let executable = resolve_executable().await?;
    launch_with_executable(spec, &executable).await
}

async fn launch_with_executable(spec: &LaunchSpec, executable: &Path) -> Result<LaunchedBrowser> {
    let mut builder = BrowserConfigBuilder::default()
        .request_timeout(spec.request_timeout)
        .window_size(1920, 1080)
        .user_data_dir(spec.user_data_dir.clone())
        .chrome_executable(executable)
        .arg(format!("--user-agent={CHROME_USER_AGENT}"));

    builder = if spec.headless {
        builder.headless_mode(HeadlessMode::default())
    } else {
        builder.with_head()
    };
    for arg in AUTOMATION_ARGS {
        builder = builder.arg(*arg);
    }

    let config = builder
        .build()
        .map_err(|e| anyhow!("Failed to build browser config: {e}"))?;
    let (browser, mut events) = Browser::launch(config)
        .await
        .context("Failed to launch browser")?;
    debug!("Chrome started from {}", executable.display());

    let handler = task::spawn(async move {
        while let Some(event) = events.next().await {
            let Err(e) = event else { continue };
            if is_benign_cdp_error(&e.to_string()) {
                trace!("Suppressed benign CDP error: {e}");
            } else {
                error!("Browser handler error: {e:?}");
            }
        }
        trace!("Browser event handler finished");
    });

    Ok(LaunchedBrowser { browser, handler })
}

/// Chrome emits CDP messages chromiumoxide cannot deserialize; they are noise
///
/// <https://github.com/mattsse/chromiumoxide/issues/167>
fn is_benign_cdp_error(message: &str) -> bool {
    message.contains("data did not match any variant of untagged enum Message")
        || message.contains("Failed to deserialize WS response")
}

/// Register the stealth scripts on a session tab before its first navigation
pub async fn apply_stealth_measures(page: &chromiumoxide::Page) -> Result<()> {
    for script in STEALTH_SCRIPTS {
        page.execute(AddScriptToEvaluateOnNewDocumentParams {
            source: (*script).to_string(),
            include_command_line_api: None,
            world_name: None,
            run_immediately: None,
        })
        .await
        .context("Failed to register stealth script")?;
    }
    Ok(())
}
