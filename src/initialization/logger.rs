//! Logger initialization.

use std::io::Write;

use colored::*;
use log::LevelFilter;

use crate::config::LogFormat;
use crate::error_handling::InitializationError;

/// Initializes the logger with the specified level and format.
///
/// Configures `env_logger` with custom formatting, plain (colored) or JSON.
/// `RUST_LOG` is honored for per-module filtering, but the explicit `level`
/// argument takes precedence for this crate's own output.
pub fn init_logger_with(level: LevelFilter, format: LogFormat) -> Result<(), InitializationError> {
    colored::control::set_override(true);

    let mut builder = env_logger::Builder::from_default_env();
    builder.filter_level(level);
    builder.filter_module("reqwest", LevelFilter::Info);
    builder.filter_module("hyper", LevelFilter::Info);
    builder.filter_module("wigle_locator", level);

    match format {
        LogFormat::Json => {
            builder.format(|buf, record| {
                writeln!(
                    buf,
                    "{{\"ts\":{},\"level\":\"{}\",\"target\":\"{}\",\"msg\":{}}}",
                    chrono::Utc::now().timestamp_millis(),
                    record.level(),
                    record.target(),
                    serde_json::to_string(&record.args().to_string())
                        .unwrap_or_else(|_| "\"\"".into())
                )
            });
        }
        LogFormat::Plain => {
            builder.format(|buf, record| {
                let level = record.level();
                let colored_level = match level {
                    log::Level::Error => level.to_string().red(),
                    log::Level::Warn => level.to_string().yellow(),
                    log::Level::Info => level.to_string().green(),
                    log::Level::Debug => level.to_string().blue(),
                    log::Level::Trace => level.to_string().purple(),
                };

                writeln!(
                    buf,
                    "{} [{}] {}",
                    record.target().cyan(),
                    colored_level,
                    record.args()
                )
            });
        }
    }

    // try_init() instead of init(): tests may initialize more than once.
    builder.try_init().map_err(InitializationError::from)?;

    Ok(())
}
