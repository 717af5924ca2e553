//! Main application entry point (CLI binary).
//!
//! This is a thin wrapper around the `wigle_locator` library that handles:
//! - Command-line argument parsing
//! - Environment variable loading (.env file)
//! - Logger initialization
//! - User-facing output formatting
//!
//! All core functionality is implemented in the library crate.

use anyhow::{Context, Result};
use clap::Parser;
use std::process;

use wigle_locator::initialization::init_logger_with;
use wigle_locator::{run, Config};

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env (if present) so WIGLE_API_KEY can
    // live next to the binary instead of being exported manually.
    if dotenvy::dotenv().is_err() {
        if let Ok(exe_path) = std::env::current_exe() {
            if let Some(exe_dir) = exe_path.parent() {
                let env_path = exe_dir.join(".env");
                if env_path.exists() {
                    let _ = dotenvy::from_path(&env_path);
                }
            }
        }
    }

    let config = Config::parse();

    let log_level = config.log_level.clone();
    let log_format = config.log_format.clone();
    init_logger_with(log_level.into(), log_format).context("Failed to initialize logger")?;

    match run(config).await {
        Ok(report) => {
            println!(
                "Processed {} candidate{} ({} located, {} permanent misses, {} cache hits, {} skipped)",
                report.candidates,
                if report.candidates == 1 { "" } else { "s" },
                report.resolved,
                report.negative,
                report.cache_hits,
                report.skipped,
            );
            if report.pending > 0 {
                println!(
                    "{} still pending; they will be retried on the next run",
                    report.pending
                );
            }
            println!("State saved in {}", report.data_dir.display());
            Ok(())
        }
        Err(e) => {
            eprintln!("wigle_locator error: {:#}", e);
            process::exit(1);
        }
    }
}
