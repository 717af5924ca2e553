//! Graceful shutdown handling.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::resolver::Resolver;

/// Shuts down the background worker and flushes resolver state.
///
/// An in-progress drain pass finishes its current item before the worker
/// observes the cancellation; the final `close()` then writes all three
/// stores so nothing is lost across the exit.
pub async fn shutdown_gracefully(
    resolver: &Arc<Resolver>,
    worker_shutdown: CancellationToken,
    worker_handle: tokio::task::JoinHandle<()>,
) {
    worker_shutdown.cancel();
    let _ = worker_handle.await;
    resolver.close();
}
