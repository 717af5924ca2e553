//! Configuration constants.
//!
//! Operational defaults for the resolver: quota limits, cooldown and TTL
//! durations, store sizes, and batch parameters. All of these are overridable
//! from the CLI; the constants are the documented defaults.

use std::time::Duration;

/// WiGLE network detail endpoint queried once per BSSID.
pub const WIGLE_API_URL: &str = "https://api.wigle.net/api/v2/network/detail";

/// Directory holding the three persisted state files.
pub const DEFAULT_DATA_DIR: &str = "./wigle_locator_data";

/// Per-request HTTP timeout in seconds.
/// A hung request is classified as transient once this fires; there is no
/// other cancellation path for an in-flight call.
pub const HTTP_TIMEOUT_SECS: u64 = 10;

/// Outbound lookups allowed per UTC day.
/// WiGLE's free tier enforces a daily query quota, not a burst limiter, so
/// the counter rolls over at midnight UTC rather than on a sliding window.
pub const DEFAULT_DAILY_LIMIT: u32 = 100;

/// Cooldown length after a 429, in hours.
/// Pessimistic on purpose: upstream rate-limit semantics are a daily quota,
/// so a short backoff would just burn the remaining quota into the same wall.
/// Tunable via `--cooldown-hours`.
pub const DEFAULT_COOLDOWN_HOURS: u64 = 24;

/// Resolved locations older than this are dropped on reload.
/// Stale geolocation data is worse than a fresh miss.
pub const DEFAULT_CACHE_TTL_DAYS: u64 = 30;

/// Maximum resolved records kept before evicting the oldest.
pub const DEFAULT_CACHE_CAP: usize = 10_000;

/// Maximum pending queue length; intake beyond this is dropped with a warning.
pub const DEFAULT_QUEUE_CAP: usize = 5_000;

/// Maximum queue items attempted per drain pass.
pub const DEFAULT_DRAIN_BATCH_SIZE: usize = 25;

/// Transient failures tolerated per queue item before it is discarded.
pub const DEFAULT_MAX_RETRIES: u32 = 5;

/// Unconditional pause before each lookup during a drain pass.
/// A simple local spacing delay, not a token bucket; precision is not needed.
pub const DEFAULT_INTER_REQUEST_DELAY: Duration = Duration::from_secs(2);

/// Interval between background drain passes, in seconds.
pub const DEFAULT_DRAIN_INTERVAL_SECS: u64 = 600;

/// Concurrent intake resolutions (semaphore limit) for the CLI.
pub const DEFAULT_MAX_CONCURRENCY: usize = 8;

/// Length of the generated single-session admin flush token.
pub const SESSION_TOKEN_LEN: usize = 32;
