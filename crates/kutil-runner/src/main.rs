//! # kutil-runner
//!
//! Bootstraps file logging for a host process and reports the effective
//! level of each requested logger.
//!
//! # Usage
//!
//! ```bash
//! kutil-runner --log-dir /var/log/app --logback conf/logback.json com.app.worker com.app.api
//! ```

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;

/// Logger name the runner logs its own progress under.
const RUNNER_LOGGER: &str = "kutil.runner";

/// Logging bootstrap runner.
#[derive(Parser)]
#[command(name = "kutil-runner", about = "Logging bootstrap runner")]
struct Cli {
    /// Directory receiving `<program>.log` and its rotated copies.
    #[arg(long)]
    log_dir: PathBuf,

    /// Logback file (JSON, logger name → level). Missing file means defaults.
    #[arg(long, default_value = "logback.json")]
    logback: PathBuf,

    /// Logger names to configure and report.
    loggers: Vec<String>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // 1. Bootstrap logging for the runner itself
    let runner = kutil_core::get_logger(RUNNER_LOGGER, &cli.logback, &cli.log_dir)
        .with_context(|| format!("logging bootstrap failed (log_dir={})", cli.log_dir.display()))?;

    info!(
        target: RUNNER_LOGGER,
        "kutil-runner starting, logback={}, {} logger(s), runner level={}",
        cli.logback.display(),
        cli.loggers.len(),
        runner.effective_level(),
    );

    // 2. Configure and report every requested logger
    for name in &cli.loggers {
        let logger = kutil_core::get_logger(name, &cli.logback, &cli.log_dir)
            .with_context(|| format!("cannot configure logger '{name}'"))?;

        if logger.is_disabled() {
            println!("{name}: OFF");
        } else {
            println!("{name}: {}", logger.effective_level());
        }
    }

    info!(target: RUNNER_LOGGER, "configured {} logger(s)", cli.loggers.len());
    kutil_core::logging::global().root().flush();
    Ok(())
}
