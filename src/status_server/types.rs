//! Status/admin server payload types.

use serde::{Deserialize, Serialize};

use crate::governor::GovernorStatus;

/// Session counters as served on `/status`.
#[derive(Debug, Serialize)]
pub struct CounterSnapshot {
    /// Intake requests answered from the cache.
    pub cache_hits: u64,
    /// Lookups that produced coordinates.
    pub resolved: u64,
    /// Lookups cached as permanent misses.
    pub negative: u64,
    /// Intake items parked in the retry queue.
    pub queued: u64,
    /// Lookup calls that failed transiently.
    pub transient_errors: u64,
    /// Queue items discarded after exhausting retries.
    pub dropped: u64,
    /// Rate-limit responses observed.
    pub rate_limited: u64,
}

/// JSON body of the `/status` endpoint.
#[derive(Debug, Serialize)]
pub struct StatusResponse {
    /// Resolved records currently visible in the cache.
    pub resolved_records: usize,
    /// Identifiers waiting in the retry queue.
    pub queue_depth: usize,
    /// Governor summary: cooldown and daily quota.
    pub governor: GovernorStatus,
    /// Session counters.
    pub counters: CounterSnapshot,
}

/// JSON body accepted by `POST /flush`.
#[derive(Debug, Deserialize)]
pub struct FlushRequest {
    /// The single-session admin token.
    pub token: String,
}

/// JSON body returned by a successful flush.
#[derive(Debug, Serialize)]
pub struct FlushResponse {
    /// How many queued items were removed.
    pub removed: usize,
}
