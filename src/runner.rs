//! Test orchestrator
//!
//! Drives the per-user login/logout state machine across one or more
//! browser engines. Engines run sequentially, one session per engine, one
//! user at a time within a session.
//!
//! Error policy is uniform: a failure inside a user iteration captures an
//! error screenshot, records the failure in the run report, and continues
//! with the next user. A session launch failure skips that engine. Fixture
//! errors abort before any browser is launched.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

use crate::browser::{BrowserSession, BrowserSessionConfig, Engine};
use crate::data::{Credential, Expectation};
use crate::error::SuiteError;
use crate::screenshot::{self, Checkpoint};
use crate::{flows, SuiteConfig};

/// Per-user progress through the flow
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserState {
    NotStarted,
    Navigated,
    LoggedIn,
    LoggedOut,
    LoginFailed,
    ErrorCaptured,
}

/// Whether the user iteration matched its expectation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Passed,
    Failed,
}

/// Result of one user iteration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserReport {
    pub username: String,
    pub engine: Engine,
    pub state: UserState,
    pub outcome: Outcome,
    pub error: Option<String>,
    pub screenshots: Vec<PathBuf>,
}

/// An engine that could not be driven at all
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineFailure {
    pub engine: Engine,
    pub error: String,
}

/// Result of a whole run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub users: Vec<UserReport>,
    pub engine_failures: Vec<EngineFailure>,
}

impl RunReport {
    pub fn passed(&self) -> usize {
        self.users
            .iter()
            .filter(|u| u.outcome == Outcome::Passed)
            .count()
    }

    pub fn failed(&self) -> usize {
        self.users.len() - self.passed()
    }

    /// The run succeeds only when every user passed on every engine
    pub fn is_success(&self) -> bool {
        self.failed() == 0 && self.engine_failures.is_empty() && !self.users.is_empty()
    }

    /// Write the report as pretty JSON
    pub fn save(&self, path: &std::path::Path) -> Result<(), SuiteError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(self)
            .map_err(|e| SuiteError::Report(e.to_string()))?;
        std::fs::write(path, content)?;
        info!("Run report written to {}", path.display());
        Ok(())
    }
}

/// What the post-login page state means for this user's expectation
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum LoginAssessment {
    /// Expected success and the dashboard was reached: proceed to logout
    ProceedToLogout,
    /// Expected failure and the invalid-credentials banner is visible
    ExpectedFailureConfirmed,
    /// Page state contradicts the expectation
    WrongOutcome(String),
}

pub(crate) fn assess_login(
    expected: Expectation,
    dashboard_reached: bool,
    banner_visible: bool,
) -> LoginAssessment {
    match (expected, dashboard_reached, banner_visible) {
        (Expectation::Success, true, _) => LoginAssessment::ProceedToLogout,
        (Expectation::Success, false, _) => {
            LoginAssessment::WrongOutcome("expected successful login but dashboard was not reached".into())
        }
        (Expectation::Failure, true, _) => {
            LoginAssessment::WrongOutcome("expected login failure but dashboard was reached".into())
        }
        (Expectation::Failure, false, true) => LoginAssessment::ExpectedFailureConfirmed,
        (Expectation::Failure, false, false) => LoginAssessment::WrongOutcome(
            "expected invalid-credentials message was not visible".into(),
        ),
    }
}

/// Failed reports for users that never ran because their session died.
///
/// Every requested user must appear in the run report; a truncated user
/// list would make a crashed run look like a complete successful one.
fn dead_session_reports(engine: Engine, users: &[Credential]) -> Vec<UserReport> {
    users
        .iter()
        .map(|user| UserReport {
            username: user.username.clone(),
            engine,
            state: UserState::ErrorCaptured,
            outcome: Outcome::Failed,
            error: Some("session died before user was processed".to_string()),
            screenshots: Vec::new(),
        })
        .collect()
}

/// Runs the login/logout flow for a user list across the requested engines
pub struct SuiteRunner {
    config: SuiteConfig,
    session_config: BrowserSessionConfig,
}

impl SuiteRunner {
    pub fn new(config: SuiteConfig, session_config: BrowserSessionConfig) -> Self {
        Self {
            config,
            session_config,
        }
    }

    /// Run the full suite: every user against every engine, sequentially.
    pub async fn run(&self, engines: &[Engine], users: &[Credential]) -> RunReport {
        let started_at = Utc::now();
        let mut report = RunReport {
            started_at,
            finished_at: started_at,
            users: Vec::new(),
            engine_failures: Vec::new(),
        };

        for &engine in engines {
            match self.run_engine(engine, users).await {
                Ok(mut user_reports) => report.users.append(&mut user_reports),
                Err(e) => {
                    error!("Skipping engine {}: {}", engine, e);
                    report.engine_failures.push(EngineFailure {
                        engine,
                        error: e.to_string(),
                    });
                }
            }
        }

        report.finished_at = Utc::now();
        info!(
            "Run finished: {} passed, {} failed, {} engine(s) skipped",
            report.passed(),
            report.failed(),
            report.engine_failures.len()
        );
        report
    }

    /// Launch one session for the engine and drive the whole user list
    /// through it. The session is closed on every exit path.
    async fn run_engine(
        &self,
        engine: Engine,
        users: &[Credential],
    ) -> Result<Vec<UserReport>, SuiteError> {
        let session = BrowserSession::launch(engine, &self.session_config).await?;
        let screenshots_dir =
            screenshot::engine_dir(&self.config.screenshots_dir, engine.name());

        let mut reports = Vec::with_capacity(users.len());
        for (i, user) in users.iter().enumerate() {
            if !session.is_alive() {
                warn!(
                    "Session {} died before user {}; marking remaining users failed for engine {}",
                    session.id(),
                    user.username,
                    engine
                );
                reports.extend(dead_session_reports(engine, &users[i..]));
                break;
            }

            let user_report = self.run_user(&session, user, &screenshots_dir).await;
            reports.push(user_report);

            if i + 1 < users.len() {
                tokio::time::sleep(self.config.pause_between_users()).await;
            }
        }

        flows::close_session(&session).await?;
        Ok(reports)
    }

    /// Drive one user through the state machine:
    /// NotStarted -> Navigated -> LoggedIn -> (LoggedOut | LoginFailed),
    /// with ErrorCaptured reachable from any point.
    async fn run_user(
        &self,
        session: &BrowserSession,
        user: &Credential,
        screenshots_dir: &std::path::Path,
    ) -> UserReport {
        let mut report = UserReport {
            username: user.username.clone(),
            engine: session.engine(),
            state: UserState::NotStarted,
            outcome: Outcome::Failed,
            error: None,
            screenshots: Vec::new(),
        };

        info!(
            "Starting login/logout test for user: {} ({})",
            user.username,
            session.engine()
        );

        if let Err(e) = self.user_steps(session, user, screenshots_dir, &mut report).await {
            error!(
                "Error during login/logout test for user {}: {}",
                user.username, e
            );
            report.state = UserState::ErrorCaptured;
            report.outcome = Outcome::Failed;
            report.error = Some(e.to_string());
            if let Some(path) =
                screenshot::capture(session, screenshots_dir, Checkpoint::Error, &user.username)
                    .await
            {
                report.screenshots.push(path);
            }
        }

        report
    }

    async fn user_steps(
        &self,
        session: &BrowserSession,
        user: &Credential,
        screenshots_dir: &std::path::Path,
        report: &mut UserReport,
    ) -> Result<(), SuiteError> {
        let cfg = &self.config;

        flows::navigate_to_login(session, cfg).await?;
        report.state = UserState::Navigated;
        if let Some(path) =
            screenshot::capture(session, screenshots_dir, Checkpoint::BeforeLogin, &user.username)
                .await
        {
            report.screenshots.push(path);
        }

        flows::perform_login(session, cfg, &user.username, &user.password).await?;
        report.state = UserState::LoggedIn;
        if let Some(path) =
            screenshot::capture(session, screenshots_dir, Checkpoint::AfterLogin, &user.username)
                .await
        {
            report.screenshots.push(path);
        }

        let current = session.current_url().await?;
        let dashboard_reached = flows::urls_match(&current, &cfg.dashboard_url);
        let banner_visible = if dashboard_reached {
            false
        } else {
            session
                .is_text_visible(&cfg.selectors.invalid_credentials_text)
                .await?
        };

        match assess_login(user.expected, dashboard_reached, banner_visible) {
            LoginAssessment::ProceedToLogout => {
                flows::perform_logout(session, cfg, screenshots_dir).await?;
                flows::wait_for_logout_redirect(session, cfg, screenshots_dir).await?;

                report.state = UserState::LoggedOut;
                report.outcome = Outcome::Passed;
                if let Some(path) = screenshot::capture(
                    session,
                    screenshots_dir,
                    Checkpoint::AfterLogout,
                    &user.username,
                )
                .await
                {
                    report.screenshots.push(path);
                }
                info!("Login/logout succeeded for user: {}", user.username);
            }
            LoginAssessment::ExpectedFailureConfirmed => {
                report.state = UserState::LoginFailed;
                report.outcome = Outcome::Passed;
                if let Some(path) = screenshot::capture(
                    session,
                    screenshots_dir,
                    Checkpoint::LoginFailed,
                    &user.username,
                )
                .await
                {
                    report.screenshots.push(path);
                }
                info!(
                    "Login rejected as expected for user: {}",
                    user.username
                );
            }
            LoginAssessment::WrongOutcome(reason) => {
                warn!("User {} failed: {} (URL: {})", user.username, reason, current);
                report.state = if dashboard_reached {
                    UserState::LoggedIn
                } else {
                    UserState::LoginFailed
                };
                report.outcome = Outcome::Failed;
                report.error = Some(reason);
                if let Some(path) = screenshot::capture(
                    session,
                    screenshots_dir,
                    Checkpoint::LoginFailed,
                    &user.username,
                )
                .await
                {
                    report.screenshots.push(path);
                }
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expected_success_on_dashboard_proceeds_to_logout() {
        assert_eq!(
            assess_login(Expectation::Success, true, false),
            LoginAssessment::ProceedToLogout
        );
    }

    #[test]
    fn expected_success_off_dashboard_is_wrong_outcome() {
        assert!(matches!(
            assess_login(Expectation::Success, false, false),
            LoginAssessment::WrongOutcome(_)
        ));
    }

    #[test]
    fn expected_failure_with_banner_is_confirmed() {
        assert_eq!(
            assess_login(Expectation::Failure, false, true),
            LoginAssessment::ExpectedFailureConfirmed
        );
    }

    #[test]
    fn expected_failure_without_banner_is_wrong_outcome() {
        assert!(matches!(
            assess_login(Expectation::Failure, false, false),
            LoginAssessment::WrongOutcome(_)
        ));
    }

    #[test]
    fn expected_failure_reaching_dashboard_is_wrong_outcome() {
        assert!(matches!(
            assess_login(Expectation::Failure, true, false),
            LoginAssessment::WrongOutcome(_)
        ));
    }

    #[test]
    fn empty_run_is_not_a_success() {
        let now = Utc::now();
        let report = RunReport {
            started_at: now,
            finished_at: now,
            users: vec![],
            engine_failures: vec![],
        };
        assert!(!report.is_success());
    }

    #[test]
    fn run_with_engine_failure_is_not_a_success() {
        let now = Utc::now();
        let report = RunReport {
            started_at: now,
            finished_at: now,
            users: vec![UserReport {
                username: "Admin".into(),
                engine: Engine::Chromium,
                state: UserState::LoggedOut,
                outcome: Outcome::Passed,
                error: None,
                screenshots: vec![],
            }],
            engine_failures: vec![EngineFailure {
                engine: Engine::Edge,
                error: "not installed".into(),
            }],
        };
        assert!(!report.is_success());
        assert_eq!(report.passed(), 1);
        assert_eq!(report.failed(), 0);
    }

    #[test]
    fn dead_session_marks_remaining_users_failed() {
        let users = vec![
            Credential::new("Admin", "admin123", Expectation::Success),
            Credential::new("bogus", "bogus", Expectation::Failure),
        ];
        let reports = dead_session_reports(Engine::Chromium, &users);
        assert_eq!(reports.len(), 2);
        for report in &reports {
            assert_eq!(report.state, UserState::ErrorCaptured);
            assert_eq!(report.outcome, Outcome::Failed);
            assert!(report.error.is_some());
        }
        assert_eq!(reports[0].username, "Admin");
        assert_eq!(reports[1].username, "bogus");
    }

    #[test]
    fn run_truncated_by_session_death_is_not_a_success() {
        // One user passed, then the session died before the second: the
        // report must contain both users and the run must fail.
        let users = vec![Credential::new("bogus", "bogus", Expectation::Failure)];
        let now = Utc::now();
        let mut report = RunReport {
            started_at: now,
            finished_at: now,
            users: vec![UserReport {
                username: "Admin".into(),
                engine: Engine::Chromium,
                state: UserState::LoggedOut,
                outcome: Outcome::Passed,
                error: None,
                screenshots: vec![],
            }],
            engine_failures: vec![],
        };
        report
            .users
            .extend(dead_session_reports(Engine::Chromium, &users));

        assert_eq!(report.users.len(), 2);
        assert_eq!(report.passed(), 1);
        assert_eq!(report.failed(), 1);
        assert!(!report.is_success());
    }

    #[test]
    fn report_serializes_to_json() {
        let now = Utc::now();
        let report = RunReport {
            started_at: now,
            finished_at: now,
            users: vec![UserReport {
                username: "Admin".into(),
                engine: Engine::Chrome,
                state: UserState::LoggedOut,
                outcome: Outcome::Passed,
                error: None,
                screenshots: vec![PathBuf::from("screenshots/chrome/after_logout_Admin.png")],
            }],
            engine_failures: vec![],
        };
        let json = serde_json::to_string(&report).unwrap();
        assert!(json.contains("\"engine\":\"chrome\""));
        assert!(json.contains("\"state\":\"logged_out\""));
        assert!(json.contains("\"outcome\":\"passed\""));
    }

    #[test]
    fn report_round_trips_and_saves() {
        let now = Utc::now();
        let report = RunReport {
            started_at: now,
            finished_at: now,
            users: vec![],
            engine_failures: vec![],
        };
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.json");
        report.save(&path).unwrap();
        let loaded: RunReport =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(loaded.users.len(), 0);
    }
}
