//! Application initialization and resource setup.
//!
//! Shared resources for the binary: the logger, the HTTP client, and the
//! intake concurrency semaphore. Initialization failures come back as proper
//! error types instead of panics.

mod client;
mod logger;

use std::sync::Arc;

use tokio::sync::Semaphore;

pub use client::init_client;
pub use logger::init_logger_with;

/// Initializes the semaphore bounding concurrent intake resolutions.
pub fn init_semaphore(count: usize) -> Arc<Semaphore> {
    Arc::new(Semaphore::new(count))
}
