//! Browser engine selection
//!
//! The suite drives Chromium-family engines over the DevTools Protocol.
//! Exactly three identifiers are accepted; anything else fails with
//! [`SuiteError::UnsupportedEngine`] before a process is spawned.

use std::path::PathBuf;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::SuiteError;

/// Supported browser engines
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Engine {
    Chromium,
    Chrome,
    Edge,
}

impl Engine {
    /// All engines, in the order the multi-engine runner iterates them
    pub const ALL: [Engine; 3] = [Engine::Chromium, Engine::Chrome, Engine::Edge];

    /// Identifier used in CLI arguments and screenshot directory names
    pub fn name(&self) -> &'static str {
        match self {
            Engine::Chromium => "chromium",
            Engine::Chrome => "chrome",
            Engine::Edge => "edge",
        }
    }

    /// Find the engine's executable on the system
    pub fn find_executable(&self) -> Option<PathBuf> {
        let candidates: Vec<PathBuf> = if cfg!(target_os = "windows") {
            let mut paths: Vec<PathBuf> = match self {
                Engine::Chromium => vec![PathBuf::from(r"C:\Program Files\Chromium\Application\chrome.exe")],
                Engine::Chrome => vec![
                    PathBuf::from(r"C:\Program Files\Google\Chrome\Application\chrome.exe"),
                    PathBuf::from(r"C:\Program Files (x86)\Google\Chrome\Application\chrome.exe"),
                ],
                Engine::Edge => vec![
                    PathBuf::from(r"C:\Program Files (x86)\Microsoft\Edge\Application\msedge.exe"),
                    PathBuf::from(r"C:\Program Files\Microsoft\Edge\Application\msedge.exe"),
                ],
            };
            if let Ok(local) = std::env::var("LOCALAPPDATA") {
                if *self == Engine::Chrome {
                    paths.push(PathBuf::from(format!(
                        r"{}\Google\Chrome\Application\chrome.exe",
                        local
                    )));
                }
            }
            paths
        } else if cfg!(target_os = "macos") {
            match self {
                Engine::Chromium => vec![PathBuf::from("/Applications/Chromium.app/Contents/MacOS/Chromium")],
                Engine::Chrome => vec![PathBuf::from(
                    "/Applications/Google Chrome.app/Contents/MacOS/Google Chrome",
                )],
                Engine::Edge => vec![PathBuf::from(
                    "/Applications/Microsoft Edge.app/Contents/MacOS/Microsoft Edge",
                )],
            }
        } else {
            match self {
                Engine::Chromium => vec![
                    PathBuf::from("/usr/bin/chromium"),
                    PathBuf::from("/usr/bin/chromium-browser"),
                    PathBuf::from("/snap/bin/chromium"),
                ],
                Engine::Chrome => vec![
                    PathBuf::from("/usr/bin/google-chrome"),
                    PathBuf::from("/usr/bin/google-chrome-stable"),
                ],
                Engine::Edge => vec![
                    PathBuf::from("/usr/bin/microsoft-edge"),
                    PathBuf::from("/usr/bin/microsoft-edge-stable"),
                ],
            }
        };

        candidates.into_iter().find(|p| p.exists())
    }
}

impl FromStr for Engine {
    type Err = SuiteError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "chromium" => Ok(Engine::Chromium),
            "chrome" => Ok(Engine::Chrome),
            "edge" => Ok(Engine::Edge),
            other => Err(SuiteError::UnsupportedEngine(other.to_string())),
        }
    }
}

impl std::fmt::Display for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}
