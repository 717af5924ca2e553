//! HTTP client initialization.

use std::sync::Arc;
use std::time::Duration;

use reqwest::ClientBuilder;

/// Initializes the shared HTTP client used for lookups.
///
/// One client per process, with the per-request timeout from configuration.
/// The timeout is the only cancellation path for a hung request; once it
/// fires the call is classified as transient.
pub fn init_client(timeout: Duration) -> Result<Arc<reqwest::Client>, reqwest::Error> {
    let client = ClientBuilder::new().timeout(timeout).build()?;
    Ok(Arc::new(client))
}
