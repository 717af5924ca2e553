//! Status/admin endpoint handlers.

use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};

use super::types::{CounterSnapshot, FlushRequest, FlushResponse, StatusResponse};
use crate::cache::LocationRecord;
use crate::error_handling::ResolverStats;
use crate::resolver::Resolver;

/// `GET /status`: queue depth, governor state, session counters.
pub async fn status_handler(State(resolver): State<Arc<Resolver>>) -> Json<StatusResponse> {
    let stats = resolver.stats();
    Json(StatusResponse {
        resolved_records: resolver.list_resolved().len(),
        queue_depth: resolver.queue_depth(),
        governor: resolver.governor_status(),
        counters: CounterSnapshot {
            cache_hits: ResolverStats::get(&stats.cache_hits),
            resolved: ResolverStats::get(&stats.resolved),
            negative: ResolverStats::get(&stats.negative),
            queued: ResolverStats::get(&stats.queued),
            transient_errors: ResolverStats::get(&stats.transient_errors),
            dropped: ResolverStats::get(&stats.dropped),
            rate_limited: ResolverStats::get(&stats.rate_limited),
        },
    })
}

/// `GET /locations`: all unexpired resolved records, newest first.
pub async fn locations_handler(
    State(resolver): State<Arc<Resolver>>,
) -> Json<Vec<LocationRecord>> {
    Json(resolver.list_resolved())
}

/// `POST /flush`: administrative override, token-gated.
///
/// With a valid token: empties the queue, lifts the cooldown, resets the
/// daily counter, and reports how many items were removed. With an invalid
/// token: 403 and no state change.
pub async fn flush_handler(
    State(resolver): State<Arc<Resolver>>,
    Json(request): Json<FlushRequest>,
) -> Response {
    match resolver.flush(&request.token) {
        Ok(removed) => (StatusCode::OK, Json(FlushResponse { removed })).into_response(),
        Err(e) => (StatusCode::FORBIDDEN, e.to_string()).into_response(),
    }
}
