//! HTTP status and admin server.
//!
//! Three endpoints, bound to localhost only:
//! - `GET /status`: queue depth, governor state, session counters
//! - `GET /locations`: resolved records as JSON
//! - `POST /flush`: token-gated administrative override
//!
//! The server runs in the background and does not block intake or draining.

mod handlers;
mod types;

use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;

use crate::resolver::Resolver;
use handlers::{flush_handler, locations_handler, status_handler};
pub use types::{CounterSnapshot, FlushRequest, FlushResponse, StatusResponse};

/// Creates and starts the status server.
pub async fn start_status_server(port: u16, resolver: Arc<Resolver>) -> Result<(), anyhow::Error> {
    let app = Router::new()
        .route("/status", get(status_handler))
        .route("/locations", get(locations_handler))
        .route("/flush", post(flush_handler))
        .with_state(resolver);

    let listener = tokio::net::TcpListener::bind(format!("127.0.0.1:{}", port))
        .await
        .map_err(|e| anyhow::anyhow!("Failed to bind status server to port {}: {}", port, e))?;

    log::info!("Status server listening on http://127.0.0.1:{}/", port);
    log::info!("  - Status: http://127.0.0.1:{}/status", port);
    log::info!("  - Locations: http://127.0.0.1:{}/locations", port);

    axum::serve(listener, app)
        .await
        .map_err(|e| anyhow::anyhow!("Status server error: {}", e))?;

    Ok(())
}
