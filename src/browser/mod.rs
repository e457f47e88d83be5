//! Browser automation module
//!
//! Handles launching and controlling a browser instance per engine for the
//! login/logout suite. One session is active at a time.

mod engine;
mod session;

pub use engine::Engine;
pub use session::{BrowserSession, BrowserSessionConfig};
