//! Configuration types and CLI options.
//!
//! This module defines the command-line configuration for the binary and the
//! plain settings struct consumed by the resolver library.

use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, ValueEnum};

use crate::config::constants::*;

/// Logging level for the application.
#[derive(Clone, Debug, ValueEnum)]
pub enum LogLevel {
    /// Only error messages
    Error,
    /// Error and warning messages
    Warn,
    /// Error, warning, and informational messages
    Info,
    /// All messages except trace
    Debug,
    /// All messages including trace
    Trace,
}

impl From<LogLevel> for log::LevelFilter {
    fn from(l: LogLevel) -> Self {
        match l {
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Trace => log::LevelFilter::Trace,
        }
    }
}

/// Log output format.
#[derive(Clone, Debug, ValueEnum)]
pub enum LogFormat {
    /// Human-readable format with colors (default)
    Plain,
    /// Structured JSON format for machine parsing
    Json,
}

/// Command-line configuration for the `wigle_locator` binary.
///
/// Candidates are read as `BSSID[,SSID]` lines from `file` (`-` for stdin).
/// The API credential comes from `--api-key` or the `WIGLE_API_KEY`
/// environment variable (a `.env` file is honored).
#[derive(Debug, Clone, Parser)]
#[command(name = "wigle_locator", version, about)]
pub struct Config {
    /// File of candidate lines to resolve, or '-' for stdin
    pub file: PathBuf,

    /// WiGLE API credential (the encoded token, sent as a Basic auth header)
    #[arg(long, env = "WIGLE_API_KEY", hide_env_values = true)]
    pub api_key: String,

    /// Directory for the persisted cache/queue/governor state
    #[arg(long, default_value = DEFAULT_DATA_DIR)]
    pub data_dir: PathBuf,

    /// Log level
    #[arg(long, value_enum, default_value_t = LogLevel::Info)]
    pub log_level: LogLevel,

    /// Log format
    #[arg(long, value_enum, default_value_t = LogFormat::Plain)]
    pub log_format: LogFormat,

    /// Per-request HTTP timeout in seconds
    #[arg(long, default_value_t = HTTP_TIMEOUT_SECS)]
    pub timeout_seconds: u64,

    /// Maximum concurrent intake resolutions
    #[arg(long, default_value_t = DEFAULT_MAX_CONCURRENCY)]
    pub max_concurrency: usize,

    /// Outbound lookups allowed per UTC day
    #[arg(long, default_value_t = DEFAULT_DAILY_LIMIT)]
    pub daily_limit: u32,

    /// Cooldown after a rate-limit response, in hours
    #[arg(long, default_value_t = DEFAULT_COOLDOWN_HOURS)]
    pub cooldown_hours: u64,

    /// Resolved records older than this many days are dropped on reload
    #[arg(long, default_value_t = DEFAULT_CACHE_TTL_DAYS)]
    pub cache_ttl_days: u64,

    /// Maximum resolved records kept before evicting the oldest
    #[arg(long, default_value_t = DEFAULT_CACHE_CAP)]
    pub cache_cap: usize,

    /// Maximum pending queue length
    #[arg(long, default_value_t = DEFAULT_QUEUE_CAP)]
    pub queue_cap: usize,

    /// Maximum queue items attempted per drain pass
    #[arg(long, default_value_t = DEFAULT_DRAIN_BATCH_SIZE)]
    pub batch_size: usize,

    /// Transient failures tolerated per item before it is discarded
    #[arg(long, default_value_t = DEFAULT_MAX_RETRIES)]
    pub max_retries: u32,

    /// Pause between lookups during a drain pass, in seconds
    #[arg(long, default_value_t = DEFAULT_INTER_REQUEST_DELAY.as_secs())]
    pub request_delay_seconds: u64,

    /// Interval between background drain passes, in seconds
    #[arg(long, default_value_t = DEFAULT_DRAIN_INTERVAL_SECS)]
    pub drain_interval_seconds: u64,

    /// Status/admin HTTP server port (optional, disabled by default)
    #[arg(long)]
    pub status_port: Option<u16>,

    /// Keep running after the input is consumed, draining periodically
    #[arg(long)]
    pub serve: bool,
}

impl Config {
    /// Builds the resolver settings from the CLI options.
    pub fn resolver_settings(&self) -> ResolverSettings {
        ResolverSettings {
            daily_limit: self.daily_limit,
            cooldown: Duration::from_secs(self.cooldown_hours * 60 * 60),
            cache_ttl: Duration::from_secs(self.cache_ttl_days * 24 * 60 * 60),
            cache_cap: self.cache_cap,
            queue_cap: self.queue_cap,
            max_batch_size: self.batch_size,
            max_retries: self.max_retries,
            inter_request_delay: Duration::from_secs(self.request_delay_seconds),
        }
    }
}

/// Tunables for a [`crate::Resolver`] instance.
///
/// Library callers construct this directly; the CLI derives it from flags.
#[derive(Debug, Clone)]
pub struct ResolverSettings {
    /// Outbound lookups allowed per UTC day.
    pub daily_limit: u32,
    /// How long the governor stays in cooldown after a rate-limit response.
    pub cooldown: Duration,
    /// Age past which a resolved record no longer counts as a cache hit.
    pub cache_ttl: Duration,
    /// Maximum resolved records kept before evicting the oldest.
    pub cache_cap: usize,
    /// Maximum pending queue length.
    pub queue_cap: usize,
    /// Maximum queue items attempted per drain pass.
    pub max_batch_size: usize,
    /// Transient failures tolerated per item before it is discarded.
    pub max_retries: u32,
    /// Unconditional pause before each lookup during a drain pass.
    pub inter_request_delay: Duration,
}

impl Default for ResolverSettings {
    fn default() -> Self {
        Self {
            daily_limit: DEFAULT_DAILY_LIMIT,
            cooldown: Duration::from_secs(DEFAULT_COOLDOWN_HOURS * 60 * 60),
            cache_ttl: Duration::from_secs(DEFAULT_CACHE_TTL_DAYS * 24 * 60 * 60),
            cache_cap: DEFAULT_CACHE_CAP,
            queue_cap: DEFAULT_QUEUE_CAP,
            max_batch_size: DEFAULT_DRAIN_BATCH_SIZE,
            max_retries: DEFAULT_MAX_RETRIES,
            inter_request_delay: DEFAULT_INTER_REQUEST_DELAY,
        }
    }
}
