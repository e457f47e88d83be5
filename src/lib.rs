//! OrangeHRM login/logout end-to-end suite
//!
//! Drives the OrangeHRM demo application through login and logout flows
//! over the Chrome DevTools Protocol, captures screenshots at fixed
//! checkpoints, and records per-user outcomes in a run report.

pub mod browser;
pub mod data;
pub mod error;
pub mod flows;
pub mod runner;
pub mod screenshot;

use std::path::PathBuf;
use std::time::Duration;

use tracing::{info, warn};

pub use browser::{BrowserSession, BrowserSessionConfig, Engine};
pub use data::{builtin_users, load_fixture, Credential, Expectation};
pub use error::SuiteError;
pub use runner::{Outcome, RunReport, SuiteRunner, UserReport, UserState};
pub use screenshot::Checkpoint;

/// Default fixture path relative to the working directory
pub const DEFAULT_FIXTURE_PATH: &str = "test_data/json_login_data.json";

/// Selectors for the pages under test.
///
/// The account-menu trigger is configurable on purpose: the demo
/// application only exposes it through markup that changes between
/// releases, so a deployment-specific override beats a hardcoded
/// structural path.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Selectors {
    pub username_input: String,
    pub password_input: String,
    pub submit_button: String,
    /// The account-menu trigger that reveals the Logout item
    pub account_menu: String,
    /// The Logout item inside the opened menu
    pub logout_item: String,
    /// Text shown when credentials are rejected
    pub invalid_credentials_text: String,
}

impl Default for Selectors {
    fn default() -> Self {
        Self {
            username_input: r#"input[name="username"]"#.to_string(),
            password_input: r#"input[name="password"]"#.to_string(),
            submit_button: r#"button[type="submit"]"#.to_string(),
            account_menu: ".oxd-userdropdown-tab".to_string(),
            logout_item: r#"a[href*="logout"]"#.to_string(),
            invalid_credentials_text: "Invalid credentials".to_string(),
        }
    }
}

/// Suite configuration
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SuiteConfig {
    /// Login page URL; also the expected post-logout destination
    pub login_url: String,
    /// Dashboard URL reached after a successful login
    pub dashboard_url: String,
    /// Root directory for checkpoint screenshots
    pub screenshots_dir: PathBuf,
    /// Selector set for the pages under test
    pub selectors: Selectors,
    /// Ceiling for the username-field wait on the login page (seconds)
    pub login_field_timeout_secs: u64,
    /// Ceiling for menu visibility/interactability waits (seconds)
    pub menu_timeout_secs: u64,
    /// Ceiling for the post-logout redirect wait (seconds)
    pub redirect_timeout_secs: u64,
    /// Ceiling for navigations and other page actions (seconds)
    pub action_timeout_secs: u64,
    /// Pause between user iterations (milliseconds)
    pub pause_between_users_ms: u64,
}

impl Default for SuiteConfig {
    fn default() -> Self {
        Self {
            login_url: "https://opensource-demo.orangehrmlive.com/web/index.php/auth/login"
                .to_string(),
            dashboard_url:
                "https://opensource-demo.orangehrmlive.com/web/index.php/dashboard/index"
                    .to_string(),
            screenshots_dir: PathBuf::from("screenshots"),
            selectors: Selectors::default(),
            login_field_timeout_secs: 10,
            menu_timeout_secs: 10,
            redirect_timeout_secs: 30,
            action_timeout_secs: 60,
            pause_between_users_ms: 3000,
        }
    }
}

impl SuiteConfig {
    /// Load config from a JSON file, falling back to defaults on any error
    pub fn load(path: &std::path::Path) -> Self {
        if path.exists() {
            match std::fs::read_to_string(path) {
                Ok(content) => match serde_json::from_str(&content) {
                    Ok(config) => {
                        info!("Loaded config from {:?}", path);
                        return config;
                    }
                    Err(e) => {
                        warn!("Failed to parse config file: {}", e);
                    }
                },
                Err(e) => {
                    warn!("Failed to read config file: {}", e);
                }
            }
        }
        Self::default()
    }

    pub fn login_field_timeout(&self) -> Duration {
        Duration::from_secs(self.login_field_timeout_secs)
    }

    pub fn menu_timeout(&self) -> Duration {
        Duration::from_secs(self.menu_timeout_secs)
    }

    pub fn redirect_timeout(&self) -> Duration {
        Duration::from_secs(self.redirect_timeout_secs)
    }

    pub fn action_timeout(&self) -> Duration {
        Duration::from_secs(self.action_timeout_secs)
    }

    pub fn pause_between_users(&self) -> Duration {
        Duration::from_millis(self.pause_between_users_ms)
    }
}

/// Get log directory path
pub fn log_dir() -> PathBuf {
    PathBuf::from("logs")
}

/// Initialize logging: console layer plus a non-blocking file layer.
///
/// The returned guard must be held for the lifetime of the process or the
/// file writer drops buffered lines on exit.
pub fn init_logging() -> Option<tracing_appender::non_blocking::WorkerGuard> {
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::util::SubscriberInitExt;

    let env_filter = tracing_subscriber::EnvFilter::from_default_env()
        .add_directive(tracing::Level::INFO.into());

    let console_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_thread_ids(false);

    let log_dir = log_dir();
    if std::fs::create_dir_all(&log_dir).is_ok() {
        let file_appender = tracing_appender::rolling::daily(&log_dir, "orangehrm-e2e.log");
        let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

        let file_layer = tracing_subscriber::fmt::layer()
            .with_ansi(false)
            .with_target(true)
            .with_writer(non_blocking);

        tracing_subscriber::registry()
            .with(env_filter)
            .with(console_layer)
            .with(file_layer)
            .init();

        Some(guard)
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(console_layer)
            .init();

        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_targets_the_demo_host() {
        let config = SuiteConfig::default();
        assert!(config.login_url.ends_with("/auth/login"));
        assert!(config.dashboard_url.ends_with("/dashboard/index"));
        assert_eq!(config.login_field_timeout_secs, 10);
        assert_eq!(config.redirect_timeout_secs, 30);
        assert_eq!(config.screenshots_dir, PathBuf::from("screenshots"));
    }

    #[test]
    fn default_selectors_match_the_login_form_contract() {
        let selectors = Selectors::default();
        assert_eq!(selectors.username_input, r#"input[name="username"]"#);
        assert_eq!(selectors.password_input, r#"input[name="password"]"#);
        assert_eq!(selectors.submit_button, r#"button[type="submit"]"#);
        assert_eq!(selectors.invalid_credentials_text, "Invalid credentials");
    }

    #[test]
    fn missing_config_file_falls_back_to_defaults() {
        let config = SuiteConfig::load(std::path::Path::new("/nonexistent/config.json"));
        assert_eq!(config.login_url, SuiteConfig::default().login_url);
    }

    #[test]
    fn partial_config_file_fills_in_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"loginUrl": "https://example.com/login"}"#).unwrap();
        let config = SuiteConfig::load(&path);
        assert_eq!(config.login_url, "https://example.com/login");
        assert_eq!(config.redirect_timeout_secs, 30);
    }
}
