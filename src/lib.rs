//! wigle_locator library: offline-tolerant BSSID geolocation resolution.
//!
//! Given network BSSIDs observed by a capture pipeline, this library looks up
//! their geographic location from the rate-limited WiGLE API, caches results
//! durably, and survives total loss of connectivity without losing or
//! duplicating work. Unresolved identifiers wait in a persistent retry queue
//! drained in bounded batches by a background worker; a global governor halts
//! all outbound traffic during a rate-limit cooldown or once the daily quota
//! is spent.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use std::time::Duration;
//! use wigle_locator::{
//!     start_background_worker, Resolver, ResolverSettings, StateStore, WigleClient,
//! };
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let store = StateStore::open(std::path::Path::new("./wigle_locator_data"))?;
//! let client = wigle_locator::initialization::init_client(Duration::from_secs(10))?;
//! let lookup = Arc::new(WigleClient::new(client, "api-token"));
//! let resolver = Arc::new(Resolver::open(ResolverSettings::default(), lookup, store));
//!
//! let (shutdown, worker) = start_background_worker(
//!     Arc::clone(&resolver),
//!     Duration::from_secs(600),
//! );
//! resolver.on_candidate("AA:BB:CC:DD:EE:FF", "cafe-wifi").await;
//! shutdown.cancel();
//! worker.await?;
//! resolver.close();
//! # Ok(())
//! # }
//! ```
//!
//! # Requirements
//!
//! This library requires a Tokio runtime. Use `#[tokio::main]` in your
//! application or ensure you're calling library functions within an async
//! context.

#![warn(missing_docs)]

mod app;
mod cache;
pub mod config;
mod error_handling;
mod governor;
pub mod initialization;
mod lookup;
mod persistence;
mod queue;
mod resolver;
mod status_server;

// Re-export public API
pub use app::validate_and_normalize_bssid;
pub use cache::LocationRecord;
pub use config::{Config, LogFormat, LogLevel, ResolverSettings};
pub use error_handling::{FlushError, InitializationError, PersistenceError, ResolverStats};
pub use governor::{GovernorState, GovernorStatus};
pub use lookup::{classify_response, LocationLookup, Outcome, WigleClient};
pub use persistence::StateStore;
pub use queue::QueueItem;
pub use resolver::{start_background_worker, DrainReport, ResolveStatus, Resolver};
pub use run::{run, RunReport};
pub use status_server::{
    start_status_server, CounterSnapshot, FlushRequest, FlushResponse, StatusResponse,
};

// Internal run module (intake loop for the CLI binary)
mod run {
    use std::path::PathBuf;
    use std::sync::Arc;
    use std::time::Duration;

    use anyhow::{Context, Result};
    use futures::stream::FuturesUnordered;
    use futures::StreamExt;
    use log::{info, warn};
    use tokio::io::{AsyncBufReadExt, BufReader};

    use crate::app::{shutdown_gracefully, validate_and_normalize_bssid};
    use crate::config::Config;
    use crate::error_handling::ResolverStats;
    use crate::initialization::{init_client, init_semaphore};
    use crate::lookup::WigleClient;
    use crate::persistence::StateStore;
    use crate::resolver::{start_background_worker, Resolver};

    /// Results of one intake run.
    #[derive(Debug, Clone)]
    pub struct RunReport {
        /// Candidate lines accepted for resolution.
        pub candidates: usize,
        /// Lines skipped as malformed.
        pub skipped: usize,
        /// Lookups that produced coordinates this session.
        pub resolved: u64,
        /// Lookups cached as permanent misses this session.
        pub negative: u64,
        /// Intake answered from the cache this session.
        pub cache_hits: u64,
        /// Identifiers still waiting in the retry queue at exit.
        pub pending: usize,
        /// Where the persisted state lives.
        pub data_dir: PathBuf,
    }

    /// Runs the resolver over the configured candidate input.
    ///
    /// Reads `BSSID[,SSID]` lines from the input file (or stdin for `-`),
    /// resolves them concurrently, and drains the retry queue in the
    /// background. With `--serve` the process keeps running after the input
    /// is consumed, draining periodically until Ctrl-C. State is flushed
    /// before returning.
    pub async fn run(config: Config) -> Result<RunReport> {
        let store =
            StateStore::open(&config.data_dir).context("Failed to open data directory")?;
        let client = init_client(Duration::from_secs(config.timeout_seconds))
            .context("Failed to initialize HTTP client")?;
        let lookup = Arc::new(WigleClient::new(client, config.api_key.clone()));
        let resolver = Arc::new(Resolver::open(config.resolver_settings(), lookup, store));

        if let Some(port) = config.status_port {
            let server_resolver = Arc::clone(&resolver);
            tokio::spawn(async move {
                if let Err(e) =
                    crate::status_server::start_status_server(port, server_resolver).await
                {
                    warn!("Status server error: {}", e);
                }
            });
        }

        let (worker_shutdown, worker_handle) = start_background_worker(
            Arc::clone(&resolver),
            Duration::from_secs(config.drain_interval_seconds),
        );

        let is_stdin = config.file.as_os_str() == "-";
        if is_stdin {
            info!("Reading candidates from stdin");
        }
        let mut stdin_lines = if is_stdin {
            Some(BufReader::new(tokio::io::stdin()).lines())
        } else {
            None
        };
        let mut file_lines = if !is_stdin {
            let file = tokio::fs::File::open(&config.file)
                .await
                .context("Failed to open input file")?;
            Some(BufReader::new(file).lines())
        } else {
            None
        };

        let semaphore = init_semaphore(config.max_concurrency);
        let mut tasks = FuturesUnordered::new();
        let mut candidates = 0usize;
        let mut skipped = 0usize;

        loop {
            let line_result = if let Some(lines) = stdin_lines.as_mut() {
                lines.next_line().await
            } else if let Some(lines) = file_lines.as_mut() {
                lines.next_line().await
            } else {
                Ok(None)
            };
            let line = match line_result {
                Ok(Some(line)) => line,
                Ok(None) => break,
                Err(e) => {
                    warn!("Failed to read line from input: {e}");
                    continue;
                }
            };

            let trimmed = line.trim();
            if trimmed.is_empty() || trimmed.starts_with('#') {
                continue;
            }

            let (raw_bssid, ssid) = match trimmed.split_once(',') {
                Some((bssid, ssid)) => (bssid.trim(), ssid.trim()),
                None => (trimmed, ""),
            };
            let Some(bssid) = validate_and_normalize_bssid(raw_bssid) else {
                warn!("Skipping malformed BSSID: {raw_bssid}");
                skipped += 1;
                continue;
            };
            let ssid = ssid.to_string();

            let permit = match Arc::clone(&semaphore).acquire_owned().await {
                Ok(permit) => permit,
                Err(_) => {
                    warn!("Semaphore closed, skipping BSSID: {bssid}");
                    continue;
                }
            };
            candidates += 1;

            let resolver_for_task = Arc::clone(&resolver);
            tasks.push(tokio::spawn(async move {
                let _permit = permit;
                resolver_for_task.on_candidate(&bssid, &ssid).await;
            }));
        }

        while let Some(task_result) = tasks.next().await {
            if let Err(join_error) = task_result {
                warn!("Intake task panicked: {:?}", join_error);
            }
        }

        if config.serve {
            info!(
                "Input consumed; serving until Ctrl-C ({} pending)",
                resolver.queue_depth()
            );
            tokio::signal::ctrl_c()
                .await
                .context("Failed to listen for shutdown signal")?;
            info!("Shutdown signal received");
        } else {
            // One final pass for anything intake parked.
            resolver.on_connectivity_available().await;
        }

        shutdown_gracefully(&resolver, worker_shutdown, worker_handle).await;

        let stats = resolver.stats();
        Ok(RunReport {
            candidates,
            skipped,
            resolved: ResolverStats::get(&stats.resolved),
            negative: ResolverStats::get(&stats.negative),
            cache_hits: ResolverStats::get(&stats.cache_hits),
            pending: resolver.queue_depth(),
            data_dir: config.data_dir.clone(),
        })
    }
}
