//! Screenshot capture at fixed checkpoints
//!
//! Every processed user gets a PNG per checkpoint under
//! `screenshots/<engine>/`. Capture failures are logged but never fail the
//! run; a missing screenshot is diagnostic noise, not a test outcome.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::browser::BrowserSession;

/// Named checkpoints at which the orchestrator captures screenshots
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Checkpoint {
    BeforeLogin,
    AfterLogin,
    AfterLogout,
    LoginFailed,
    Error,
}

impl Checkpoint {
    /// Fixed filename for this checkpoint and user
    pub fn filename(&self, username: &str) -> String {
        let prefix = match self {
            Checkpoint::BeforeLogin => "before_login",
            Checkpoint::AfterLogin => "after_login",
            Checkpoint::AfterLogout => "after_logout",
            Checkpoint::LoginFailed => "login_failed",
            Checkpoint::Error => "error",
        };
        format!("{}_{}.png", prefix, sanitize(username))
    }
}

/// Replace path-hostile characters in usernames used as filename stems
fn sanitize(username: &str) -> String {
    username
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || c == '-' || c == '_' || c == '.' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

/// Per-engine screenshot directory under the configured root
pub fn engine_dir(root: &Path, engine_name: &str) -> PathBuf {
    root.join(engine_name)
}

/// Capture a checkpoint screenshot for a user.
///
/// Returns the path when the capture succeeded so the orchestrator can
/// record it in the run report.
pub async fn capture(
    session: &BrowserSession,
    dir: &Path,
    checkpoint: Checkpoint,
    username: &str,
) -> Option<PathBuf> {
    let path = dir.join(checkpoint.filename(username));
    info!("Capturing screenshot: {}", path.display());

    match session.save_screenshot(&path).await {
        Ok(()) => Some(path),
        Err(e) => {
            warn!("Failed to capture {}: {}", path.display(), e);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn checkpoint_filenames_match_fixed_patterns() {
        assert_eq!(Checkpoint::BeforeLogin.filename("Admin"), "before_login_Admin.png");
        assert_eq!(Checkpoint::AfterLogin.filename("Admin"), "after_login_Admin.png");
        assert_eq!(Checkpoint::AfterLogout.filename("Admin"), "after_logout_Admin.png");
        assert_eq!(Checkpoint::LoginFailed.filename("bogus"), "login_failed_bogus.png");
        assert_eq!(Checkpoint::Error.filename("bogus"), "error_bogus.png");
    }

    #[test]
    fn usernames_are_sanitized_for_filenames() {
        assert_eq!(
            Checkpoint::Error.filename("a/b c"),
            "error_a_b_c.png"
        );
    }

    #[test]
    fn screenshots_are_grouped_per_engine() {
        let dir = engine_dir(Path::new("screenshots"), "chromium");
        assert_eq!(dir, PathBuf::from("screenshots/chromium"));
    }
}
