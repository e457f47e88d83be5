//! Credential test data
//!
//! Users come from either the built-in table (the "config data" source) or a
//! JSON fixture file of the shape `{"users": [{"username", "password",
//! "expected"}, ...]}`. The fixture is validated up front so malformed
//! records fail the run before any browser is launched.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::SuiteError;

/// Expected outcome of a login attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Expectation {
    Success,
    Failure,
}

impl<'de> Deserialize<'de> for Expectation {
    /// Anything other than "success" in the fixture counts as failure
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let value = String::deserialize(deserializer)?;
        Ok(if value == "success" {
            Expectation::Success
        } else {
            Expectation::Failure
        })
    }
}

impl Default for Expectation {
    fn default() -> Self {
        Expectation::Success
    }
}

/// One user record driven through the login/logout flow
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Credential {
    pub username: String,
    pub password: String,
    #[serde(default)]
    pub expected: Expectation,
}

impl Credential {
    pub fn new(username: &str, password: &str, expected: Expectation) -> Self {
        Self {
            username: username.to_string(),
            password: password.to_string(),
            expected,
        }
    }
}

/// Wire shape of the JSON fixture file
#[derive(Debug, Deserialize)]
struct FixtureFile {
    users: Vec<Credential>,
}

/// Load credentials from a JSON fixture file.
///
/// Fails with [`SuiteError::FixtureNotFound`] if the path does not exist and
/// [`SuiteError::FixtureInvalid`] if the content does not parse. Both happen
/// before any browser process is spawned.
pub fn load_fixture(path: impl AsRef<Path>) -> Result<Vec<Credential>, SuiteError> {
    let path = path.as_ref();

    if !path.exists() {
        return Err(SuiteError::FixtureNotFound(path.display().to_string()));
    }

    let content = std::fs::read_to_string(path)?;
    let fixture: FixtureFile = serde_json::from_str(&content)
        .map_err(|e| SuiteError::FixtureInvalid(format!("{}: {}", path.display(), e)))?;

    if fixture.users.is_empty() {
        return Err(SuiteError::FixtureInvalid(format!(
            "{}: no users in fixture",
            path.display()
        )));
    }

    info!(
        "Loaded {} user(s) from fixture {}",
        fixture.users.len(),
        path.display()
    );
    Ok(fixture.users)
}

/// Built-in user table (the static config source).
///
/// The demo application ships with a single known-good account; the second
/// record exercises the invalid-credentials path.
pub fn builtin_users() -> Vec<Credential> {
    vec![
        Credential::new("Admin", "admin123", Expectation::Success),
        Credential::new("bogus", "bogus", Expectation::Failure),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_fixture(content: &str) -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        let mut file = std::fs::File::create(dir.path().join("users.json")).unwrap();
        file.write_all(content.as_bytes()).unwrap();
        dir
    }

    #[test]
    fn missing_fixture_fails_with_not_found() {
        let err = load_fixture("/nonexistent/users.json").unwrap_err();
        assert!(matches!(err, SuiteError::FixtureNotFound(_)));
    }

    #[test]
    fn loads_users_from_fixture() {
        let dir = write_fixture(
            r#"{"users": [
                {"username": "Admin", "password": "admin123", "expected": "success"},
                {"username": "bogus", "password": "bogus", "expected": "failure"}
            ]}"#,
        );
        let users = load_fixture(dir.path().join("users.json")).unwrap();
        assert_eq!(users.len(), 2);
        assert_eq!(users[0].username, "Admin");
        assert_eq!(users[0].expected, Expectation::Success);
        assert_eq!(users[1].expected, Expectation::Failure);
    }

    #[test]
    fn non_success_expected_values_count_as_failure() {
        let dir = write_fixture(
            r#"{"users": [{"username": "u", "password": "p", "expected": "locked_out"}]}"#,
        );
        let users = load_fixture(dir.path().join("users.json")).unwrap();
        assert_eq!(users[0].expected, Expectation::Failure);
    }

    #[test]
    fn missing_expected_defaults_to_success() {
        let dir = write_fixture(r#"{"users": [{"username": "u", "password": "p"}]}"#);
        let users = load_fixture(dir.path().join("users.json")).unwrap();
        assert_eq!(users[0].expected, Expectation::Success);
    }

    #[test]
    fn malformed_json_fails_with_invalid() {
        let dir = write_fixture("{not json");
        let err = load_fixture(dir.path().join("users.json")).unwrap_err();
        assert!(matches!(err, SuiteError::FixtureInvalid(_)));
    }

    #[test]
    fn empty_user_list_is_rejected() {
        let dir = write_fixture(r#"{"users": []}"#);
        let err = load_fixture(dir.path().join("users.json")).unwrap_err();
        assert!(matches!(err, SuiteError::FixtureInvalid(_)));
    }

    #[test]
    fn builtin_users_cover_both_expectations() {
        let users = builtin_users();
        assert!(users.iter().any(|u| u.expected == Expectation::Success));
        assert!(users.iter().any(|u| u.expected == Expectation::Failure));
    }
}
