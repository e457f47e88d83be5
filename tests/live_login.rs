//! Opt-in live browser tests.
//!
//! These drive a real browser against the public OrangeHRM demo host.
//! They are not run by default: set `ORANGEHRM_E2E=1` and have a
//! Chromium-family browser installed.
//!
//!   ORANGEHRM_E2E=1 cargo test --test live_login
//!
//! The env-var guard keeps CI green when no browser (or no network) is
//! available.

use orangehrm_e2e::browser::{BrowserSession, BrowserSessionConfig, Engine};
use orangehrm_e2e::data::{Credential, Expectation};
use orangehrm_e2e::runner::{Outcome, SuiteRunner, UserState};
use orangehrm_e2e::SuiteConfig;

fn live_enabled() -> bool {
    std::env::var("ORANGEHRM_E2E").as_deref() == Ok("1")
}

fn live_engine() -> Option<Engine> {
    Engine::ALL.into_iter().find(|e| e.find_executable().is_some())
}

#[tokio::test]
async fn session_close_releases_the_browser() {
    if !live_enabled() {
        eprintln!("skipping live browser test (set ORANGEHRM_E2E=1)");
        return;
    }
    let engine = live_engine().expect("no browser installed");

    let session = BrowserSession::launch(engine, &BrowserSessionConfig::default())
        .await
        .expect("launch failed");
    assert!(session.is_alive());

    session.close().await.expect("close failed");
    assert!(!session.is_alive(), "session handle should be invalid after close");
}

#[tokio::test]
async fn admin_login_and_logout_round_trip() {
    if !live_enabled() {
        eprintln!("skipping live browser test (set ORANGEHRM_E2E=1)");
        return;
    }
    let engine = live_engine().expect("no browser installed");

    let tmp = tempfile::tempdir().unwrap();
    let mut config = SuiteConfig::default();
    config.screenshots_dir = tmp.path().to_path_buf();

    let users = vec![
        Credential::new("Admin", "admin123", Expectation::Success),
        Credential::new("bogus", "bogus", Expectation::Failure),
    ];

    let runner = SuiteRunner::new(config, BrowserSessionConfig::default());
    let report = runner.run(&[engine], &users).await;

    assert!(report.is_success(), "report: {:?}", report);

    let admin = report.users.iter().find(|u| u.username == "Admin").unwrap();
    assert_eq!(admin.state, UserState::LoggedOut);
    assert_eq!(admin.outcome, Outcome::Passed);

    let bogus = report.users.iter().find(|u| u.username == "bogus").unwrap();
    assert_eq!(bogus.state, UserState::LoginFailed);
    assert_eq!(bogus.outcome, Outcome::Passed);

    // Checkpoint screenshots exist for both users; no after-logout
    // screenshot for the rejected login.
    let dir = tmp.path().join(engine.name());
    assert!(dir.join("before_login_Admin.png").exists());
    assert!(dir.join("after_login_Admin.png").exists());
    assert!(dir.join("after_logout_Admin.png").exists());
    assert!(dir.join("before_login_bogus.png").exists());
    assert!(dir.join("login_failed_bogus.png").exists());
    assert!(!dir.join("after_logout_bogus.png").exists());
}
