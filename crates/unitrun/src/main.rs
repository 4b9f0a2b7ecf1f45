//! unitrun CLI - runs the bundled demo suites through the unitrun harness.
//!
//! All arguments are verified by the harness itself, so plugin options show up
//! in `--help` next to the core ones.
//!
//! Environment:
//! - `UNITRUN_CONFIG`: YAML option file used as defaults under the arguments
//! - `UNITRUN_LOG`: tracing filter for diagnostics on stderr (default `warn`)

mod demo;

use std::path::Path;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;
use unitrun_core::{HarnessError, RunSummary, Session, load_table};

/// Exit codes for the unitrun CLI.
mod exit_code {
    pub const SUCCESS: u8 = 0;
    pub const CONFIG_ERROR: u8 = 2;
    pub const EXECUTION_ERROR: u8 = 126;
    /// Largest run status passed through as-is.
    pub const MAX_STATUS: i32 = 125;
}

const CONFIG_ENV: &str = "UNITRUN_CONFIG";
const LOG_ENV: &str = "UNITRUN_LOG";

fn init_logging() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

fn main() -> ExitCode {
    init_logging();
    let args: Vec<String> = std::env::args().skip(1).collect();
    match run(args) {
        Ok(summary) => ExitCode::from(status_code(summary.status)),
        Err(HarnessError::HelpRequested(help)) => {
            println!("{help}");
            ExitCode::from(exit_code::SUCCESS)
        }
        Err(e) if e.is_configuration() => {
            eprintln!("error: {e}");
            ExitCode::from(exit_code::CONFIG_ERROR)
        }
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::from(exit_code::EXECUTION_ERROR)
        }
    }
}

fn run(args: Vec<String>) -> Result<RunSummary, HarnessError> {
    let mut session = Session::new();
    demo::register(&mut session)?;

    if let Some(path) = std::env::var_os(CONFIG_ENV) {
        let path = Path::new(&path);
        tracing::debug!(path = %path.display(), "loading option file");
        let defaults = load_table(path)?;
        session.apply_defaults(&defaults)?;
    }

    session.run(args)
}

/// Map a run status onto a process exit code.
fn status_code(status: i32) -> u8 {
    if status == 0 {
        return exit_code::SUCCESS;
    }
    u8::try_from(status.clamp(1, exit_code::MAX_STATUS)).unwrap_or(1)
}
