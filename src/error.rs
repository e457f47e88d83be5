//! Suite error types

use thiserror::Error;

/// Errors raised while loading test data or driving the browser
#[derive(Error, Debug)]
pub enum SuiteError {
    #[error("Fixture file not found at {0}")]
    FixtureNotFound(String),

    #[error("Fixture file is invalid: {0}")]
    FixtureInvalid(String),

    #[error("Unsupported browser engine: {0}")]
    UnsupportedEngine(String),

    #[error("Browser executable not found for engine {0}")]
    BrowserNotFound(String),

    #[error("Failed to launch browser: {0}")]
    LaunchFailed(String),

    #[error("Navigation failed: {0}")]
    NavigationFailed(String),

    #[error("Timeout: {0}")]
    Timeout(String),

    #[error("Element not found: {0}")]
    ElementNotFound(String),

    #[error("Connection lost: {0}")]
    ConnectionLost(String),

    #[error("Screenshot failed: {0}")]
    Screenshot(String),

    #[error("Evaluation failed: {0}")]
    Evaluation(String),

    #[error("Report error: {0}")]
    Report(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<SuiteError> for String {
    fn from(err: SuiteError) -> String {
        err.to_string()
    }
}
