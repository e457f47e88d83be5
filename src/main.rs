//! Suite runner binary
//!
//! Runs the login/logout flow for every user against the selected
//! engine(s) and exits non-zero when any user or engine failed.
//!
//! Examples:
//! - `orangehrm-e2e --engine chromium`
//! - `orangehrm-e2e --engine all --headed --users test_data/json_login_data.json`
//! - `orangehrm-e2e --report report.json`

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use tracing::info;

use orangehrm_e2e::browser::{BrowserSessionConfig, Engine};
use orangehrm_e2e::runner::SuiteRunner;
use orangehrm_e2e::{builtin_users, load_fixture, SuiteConfig};

#[derive(Parser, Debug)]
#[command(name = "orangehrm-e2e", about = "Login/logout E2E suite for the OrangeHRM demo")]
struct Args {
    /// Browser engine: chromium, chrome, edge, or all
    #[arg(long, default_value = "chromium")]
    engine: String,

    /// Run with a visible browser window instead of headless
    #[arg(long)]
    headed: bool,

    /// JSON fixture with the user list; omitted = built-in config users
    #[arg(long)]
    users: Option<PathBuf>,

    /// Suite config file (JSON); defaults apply when absent
    #[arg(long, default_value = "suite.json")]
    config: PathBuf,

    /// Screenshot root directory (overrides the config value)
    #[arg(long)]
    screenshots: Option<PathBuf>,

    /// Write the JSON run report to this path
    #[arg(long)]
    report: Option<PathBuf>,

    /// Override the action timeout in seconds
    #[arg(long)]
    timeout: Option<u64>,

    /// Browser executable override (applies to the selected engine)
    #[arg(long, env = "ORANGEHRM_E2E_BROWSER")]
    browser_path: Option<String>,
}

fn parse_engines(arg: &str) -> anyhow::Result<Vec<Engine>> {
    if arg.eq_ignore_ascii_case("all") {
        return Ok(Engine::ALL.to_vec());
    }
    let engine = arg.parse::<Engine>()?;
    Ok(vec![engine])
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _guard = orangehrm_e2e::init_logging();
    let args = Args::parse();

    // Engine and fixture problems surface before any browser is launched
    let engines = parse_engines(&args.engine)?;
    let users = match args.users {
        Some(ref path) => load_fixture(path).context("failed to load user fixture")?,
        None => builtin_users(),
    };

    let mut config = SuiteConfig::load(&args.config);
    if let Some(dir) = args.screenshots {
        config.screenshots_dir = dir;
    }
    if let Some(secs) = args.timeout {
        config.action_timeout_secs = secs;
    }

    let session_config = BrowserSessionConfig::default()
        .headless(!args.headed)
        .browser_path(args.browser_path);

    info!(
        "Starting run: {} user(s), engines: {:?}, headless: {}",
        users.len(),
        engines.iter().map(Engine::name).collect::<Vec<_>>(),
        !args.headed
    );

    let runner = SuiteRunner::new(config, session_config);
    let report = runner.run(&engines, &users).await;

    if let Some(ref path) = args.report {
        report.save(path).context("failed to write run report")?;
    }

    info!(
        "{} passed, {} failed, {} engine(s) skipped",
        report.passed(),
        report.failed(),
        report.engine_failures.len()
    );

    if report.is_success() {
        Ok(())
    } else {
        std::process::exit(1);
    }
}
