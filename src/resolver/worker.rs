//! Background drain worker.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::{interval, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use super::Resolver;

/// Spawns the long-lived worker that drains the retry queue on a fixed
/// interval. Returns the token that shuts it down and the task handle to
/// await during shutdown.
///
/// The interval fires immediately, so startup doubles as the first drain
/// pass: anything queued by a previous run gets attempted right away.
pub fn start_background_worker(
    resolver: Arc<Resolver>,
    drain_interval: Duration,
) -> (CancellationToken, tokio::task::JoinHandle<()>) {
    let shutdown = CancellationToken::new();
    let cancelled = shutdown.child_token();

    let handle = tokio::spawn(async move {
        let mut ticker = interval(drain_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let depth = resolver.queue_depth();
                    if depth > 0 {
                        log::debug!("drain tick: {depth} pending");
                    }
                    resolver.on_connectivity_available().await;
                }
                _ = cancelled.cancelled() => {
                    log::debug!("drain worker shutting down");
                    break;
                }
            }
        }
    });

    (shutdown, handle)
}
