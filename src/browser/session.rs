//! Browser session management
//!
//! Handles launching and controlling a single browser instance over the
//! DevTools Protocol. One session owns one browser process and one page;
//! the handle is valid between `launch` and `close` and is never reused
//! across engine iterations.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chromiumoxide::browser::HeadlessMode;
use chromiumoxide::cdp::browser_protocol::page::CaptureScreenshotFormat;
use chromiumoxide::page::ScreenshotParams;
use chromiumoxide::{Browser, BrowserConfig, Page};
use futures::StreamExt;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use super::Engine;
use crate::error::SuiteError;

/// Global counter for sequential session naming (Session-1, Session-2, ...)
static SESSION_COUNTER: AtomicU32 = AtomicU32::new(1);

/// How often bounded waits poll the page
const POLL_INTERVAL: Duration = Duration::from_millis(250);

/// Configuration for a browser session
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BrowserSessionConfig {
    /// Override the auto-detected browser executable
    pub browser_path: Option<String>,
    /// Run in headless mode
    pub headless: bool,
    /// User data directory (a per-session temp dir when unset)
    pub user_data_dir: Option<String>,
    /// Window width
    pub window_width: u32,
    /// Window height
    pub window_height: u32,
}

impl Default for BrowserSessionConfig {
    fn default() -> Self {
        Self {
            browser_path: None,
            headless: true,
            user_data_dir: None,
            window_width: 1920,
            window_height: 1080,
        }
    }
}

impl BrowserSessionConfig {
    /// Set headless mode
    pub fn headless(mut self, headless: bool) -> Self {
        self.headless = headless;
        self
    }

    /// Set browser executable path
    pub fn browser_path(mut self, path: Option<String>) -> Self {
        self.browser_path = path;
        self
    }
}

/// A live browser session
pub struct BrowserSession {
    /// Session display name, e.g. "Session-1"
    pub id: String,
    /// The engine this session was launched with
    engine: Engine,
    /// The browser instance
    browser: Arc<RwLock<Option<Browser>>>,
    /// The single page driven by the suite
    page: Arc<RwLock<Option<Page>>>,
    /// Whether the session is alive (flipped when the CDP handler ends
    /// or the session is closed)
    alive: Arc<AtomicBool>,
}

impl BrowserSession {
    /// Launch a browser for the given engine and open its initial page.
    ///
    /// Fails with [`SuiteError::BrowserNotFound`] before spawning anything
    /// when no executable can be located for the engine.
    pub async fn launch(engine: Engine, config: &BrowserSessionConfig) -> Result<Self, SuiteError> {
        let session_id = format!("Session-{}", SESSION_COUNTER.fetch_add(1, Ordering::Relaxed));

        let executable = match config.browser_path {
            Some(ref path) => PathBuf::from(path),
            None => engine
                .find_executable()
                .ok_or_else(|| SuiteError::BrowserNotFound(engine.name().to_string()))?,
        };

        info!(
            "Launching {} for session {} (headless: {}, executable: {})",
            engine,
            session_id,
            config.headless,
            executable.display()
        );

        let mut builder = BrowserConfig::builder()
            .chrome_executable(&executable)
            .window_size(config.window_width, config.window_height)
            // Required when running as root (e.g., in Docker or CI)
            .arg("--no-sandbox")
            .arg("--disable-dev-shm-usage")
            .arg("--no-first-run")
            .arg("--no-default-browser-check");

        if config.headless {
            builder = builder.headless_mode(HeadlessMode::New);
        } else {
            builder = builder.with_head();
        }

        let user_data_dir = match config.user_data_dir {
            Some(ref dir) => PathBuf::from(dir),
            None => std::env::temp_dir()
                .join("orangehrm-e2e")
                .join(&session_id),
        };
        std::fs::create_dir_all(&user_data_dir)?;
        builder = builder.user_data_dir(&user_data_dir);

        let browser_config = builder
            .build()
            .map_err(SuiteError::LaunchFailed)?;

        let (browser, mut handler) = Browser::launch(browser_config)
            .await
            .map_err(|e| SuiteError::LaunchFailed(e.to_string()))?;

        // Drain CDP events in the background; when the stream ends the
        // browser has disconnected or crashed.
        let session_id_clone = session_id.clone();
        let alive_flag = Arc::new(AtomicBool::new(true));
        let alive_for_handler = alive_flag.clone();
        tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                debug!("Session {} browser event: {:?}", session_id_clone, event);
            }
            warn!(
                "Session {} browser disconnected (event handler ended)",
                session_id_clone
            );
            alive_for_handler.store(false, Ordering::Relaxed);
        });

        // The browser opens with a blank tab; take it as our page and
        // close any extras.
        let page = {
            let mut pages = browser
                .pages()
                .await
                .map_err(|e| SuiteError::LaunchFailed(e.to_string()))?;

            let main_page = if !pages.is_empty() {
                pages.remove(0)
            } else {
                browser
                    .new_page("about:blank")
                    .await
                    .map_err(|e| SuiteError::LaunchFailed(e.to_string()))?
            };

            for extra_page in pages {
                debug!("Closing extra blank tab");
                let _ = extra_page.close().await;
            }

            main_page
        };

        info!("Session {} ready ({})", session_id, engine);

        Ok(Self {
            id: session_id,
            engine,
            browser: Arc::new(RwLock::new(Some(browser))),
            page: Arc::new(RwLock::new(Some(page))),
            alive: alive_flag,
        })
    }

    /// Get session ID
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Engine this session runs
    pub fn engine(&self) -> Engine {
        self.engine
    }

    /// Check if the session is alive
    pub fn is_alive(&self) -> bool {
        self.alive.load(Ordering::Relaxed)
    }

    /// Navigate to a URL and wait for the load to settle
    pub async fn goto(&self, url: &str, timeout: Duration) -> Result<(), SuiteError> {
        let page = self.page.read().await;
        let page = page
            .as_ref()
            .ok_or(SuiteError::ConnectionLost("No active page".into()))?;

        debug!("Session {} navigating to: {}", self.id, url);
        tokio::time::timeout(timeout, async {
            page.goto(url).await?;
            page.wait_for_navigation().await?;
            Ok::<_, chromiumoxide::error::CdpError>(())
        })
        .await
        .map_err(|_| SuiteError::Timeout(format!("Navigation to {} timed out", url)))?
        .map_err(|e| SuiteError::NavigationFailed(e.to_string()))?;

        Ok(())
    }

    /// Wait for the current navigation to settle
    pub async fn wait_for_navigation(&self, timeout: Duration) -> Result<(), SuiteError> {
        let page = self.page.read().await;
        let page = page
            .as_ref()
            .ok_or(SuiteError::ConnectionLost("No active page".into()))?;

        tokio::time::timeout(timeout, page.wait_for_navigation())
            .await
            .map_err(|_| SuiteError::Timeout("Navigation timeout".into()))?
            .map_err(|e| SuiteError::NavigationFailed(e.to_string()))?;

        Ok(())
    }

    /// Get current URL
    pub async fn current_url(&self) -> Result<String, SuiteError> {
        let page = self.page.read().await;
        let page = page
            .as_ref()
            .ok_or(SuiteError::ConnectionLost("No active page".into()))?;

        page.url()
            .await
            .map_err(|e| SuiteError::ConnectionLost(e.to_string()))?
            .ok_or_else(|| SuiteError::ConnectionLost("No URL".into()))
    }

    /// Evaluate a JavaScript expression and deserialize the result
    pub async fn evaluate<T: serde::de::DeserializeOwned>(
        &self,
        script: &str,
    ) -> Result<T, SuiteError> {
        let page = self.page.read().await;
        let page = page
            .as_ref()
            .ok_or(SuiteError::ConnectionLost("No active page".into()))?;

        page.evaluate(script)
            .await
            .map_err(|e| SuiteError::Evaluation(e.to_string()))?
            .into_value()
            .map_err(|e| SuiteError::Evaluation(e.to_string()))
    }

    /// Check whether an element matching the selector is visible
    pub async fn is_visible(&self, selector: &str) -> Result<bool, SuiteError> {
        self.evaluate(&visibility_script(selector)).await
    }

    /// Check whether the given text appears in the rendered page body
    pub async fn is_text_visible(&self, text: &str) -> Result<bool, SuiteError> {
        let needle = js_string(text);
        let script = format!(
            "(function() {{ return !!document.body && document.body.innerText.includes({needle}); }})()"
        );
        self.evaluate(&script).await
    }

    /// Wait until an element matching the selector is attached to the DOM.
    /// Fails with [`SuiteError::Timeout`] when the ceiling is exceeded.
    pub async fn wait_for_selector(
        &self,
        selector: &str,
        timeout: Duration,
    ) -> Result<(), SuiteError> {
        let script = format!(
            "(function() {{ return !!document.querySelector({}); }})()",
            js_string(selector)
        );
        self.poll_until(&script, timeout)
            .await
            .map_err(|_| SuiteError::Timeout(format!("Waiting for selector {} timed out", selector)))
    }

    /// Wait until an element matching the selector is visible and
    /// interactable (non-zero box, not hidden, not disabled).
    pub async fn wait_for_clickable(
        &self,
        selector: &str,
        timeout: Duration,
    ) -> Result<(), SuiteError> {
        self.poll_until(&clickability_script(selector), timeout)
            .await
            .map_err(|_| {
                SuiteError::Timeout(format!("Element {} never became clickable", selector))
            })
    }

    /// Fill a form field with the given value
    pub async fn fill(&self, selector: &str, value: &str) -> Result<(), SuiteError> {
        let page = self.page.read().await;
        let page = page
            .as_ref()
            .ok_or(SuiteError::ConnectionLost("No active page".into()))?;

        let element = page
            .find_element(selector)
            .await
            .map_err(|e| SuiteError::ElementNotFound(format!("{}: {}", selector, e)))?;

        element
            .click()
            .await
            .map_err(|e| SuiteError::Evaluation(e.to_string()))?;
        element
            .type_str(value)
            .await
            .map_err(|e| SuiteError::Evaluation(e.to_string()))?;

        Ok(())
    }

    /// Click on an element by selector
    pub async fn click(&self, selector: &str) -> Result<(), SuiteError> {
        let page = self.page.read().await;
        let page = page
            .as_ref()
            .ok_or(SuiteError::ConnectionLost("No active page".into()))?;

        let element = page
            .find_element(selector)
            .await
            .map_err(|e| SuiteError::ElementNotFound(format!("{}: {}", selector, e)))?;

        element
            .click()
            .await
            .map_err(|e| SuiteError::Evaluation(e.to_string()))?;

        Ok(())
    }

    /// Capture a PNG screenshot of the current page to the given path
    pub async fn save_screenshot(&self, path: &Path) -> Result<(), SuiteError> {
        let page = self.page.read().await;
        let page = page
            .as_ref()
            .ok_or(SuiteError::ConnectionLost("No active page".into()))?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        page.save_screenshot(
            ScreenshotParams::builder()
                .format(CaptureScreenshotFormat::Png)
                .full_page(true)
                .build(),
            path,
        )
        .await
        .map_err(|e| SuiteError::Screenshot(format!("{}: {}", path.display(), e)))?;

        debug!("Session {} screenshot saved: {}", self.id, path.display());
        Ok(())
    }

    /// Close the browser session, releasing the browser process.
    ///
    /// Safe to call after an error; called from every orchestrator exit path.
    pub async fn close(&self) -> Result<(), SuiteError> {
        // Mark as not alive first to prevent new operations
        self.alive.store(false, Ordering::Relaxed);

        {
            let mut page = self.page.write().await;
            if let Some(p) = page.take() {
                let _ = p.close().await;
            }
        }

        // Graceful close first, brief grace period for child processes,
        // then force kill so nothing leaks.
        {
            let mut browser = self.browser.write().await;
            if let Some(mut b) = browser.take() {
                let _ = b.close().await;
                tokio::time::sleep(Duration::from_millis(500)).await;
                let _ = b.kill().await;
            }
        }

        info!("Session {} closed", self.id);
        Ok(())
    }

    /// Poll a boolean JavaScript expression until it is true or the timeout
    /// elapses. Errors from individual polls are retried until the deadline.
    async fn poll_until(&self, script: &str, timeout: Duration) -> Result<(), ()> {
        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            if let Ok(true) = self.evaluate::<bool>(script).await {
                return Ok(());
            }
            if tokio::time::Instant::now() >= deadline {
                return Err(());
            }
            tokio::time::sleep(POLL_INTERVAL).await;
        }
    }
}

/// Encode a Rust string as a JavaScript string literal
fn js_string(value: &str) -> String {
    serde_json::to_string(value).unwrap_or_else(|_| "\"\"".to_string())
}

fn visibility_script(selector: &str) -> String {
    format!(
        r#"(function() {{
            const el = document.querySelector({});
            if (!el) return false;
            const rect = el.getBoundingClientRect();
            const style = window.getComputedStyle(el);
            return rect.width > 0 && rect.height > 0 &&
                style.visibility !== 'hidden' && style.display !== 'none';
        }})()"#,
        js_string(selector)
    )
}

fn clickability_script(selector: &str) -> String {
    format!(
        r#"(function() {{
            const el = document.querySelector({});
            if (!el) return false;
            const rect = el.getBoundingClientRect();
            const style = window.getComputedStyle(el);
            return rect.width > 0 && rect.height > 0 &&
                style.visibility !== 'hidden' && style.display !== 'none' &&
                style.pointerEvents !== 'none' && !el.disabled;
        }})()"#,
        js_string(selector)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_session_config_is_headless() {
        let config = BrowserSessionConfig::default();
        assert!(config.headless);
        assert!(config.browser_path.is_none());
        assert_eq!(config.window_width, 1920);
    }

    #[test]
    fn js_string_escapes_quotes() {
        assert_eq!(
            js_string(r#"input[name="username"]"#),
            r#""input[name=\"username\"]""#
        );
    }

    #[test]
    fn visibility_script_embeds_selector_literal() {
        let script = visibility_script("span i");
        assert!(script.contains(r#"querySelector("span i")"#));
    }
}
