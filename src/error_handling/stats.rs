//! Atomic counters for resolution outcomes.

use std::sync::atomic::{AtomicU64, Ordering};

/// Running counters for everything the resolver has done this session.
///
/// Shared across intake tasks, the drain worker, and the status server, so
/// all fields are atomics and reads are best-effort snapshots.
#[derive(Debug, Default)]
pub struct ResolverStats {
    /// Intake requests answered from the cache without any I/O.
    pub cache_hits: AtomicU64,
    /// Lookups that produced coordinates.
    pub resolved: AtomicU64,
    /// Lookups that produced a confirmed permanent miss (including auth
    /// rejections, which are logged separately).
    pub negative: AtomicU64,
    /// Intake items parked in the retry queue.
    pub queued: AtomicU64,
    /// Lookup calls classified as transient failures.
    pub transient_errors: AtomicU64,
    /// Queue items discarded after exhausting their retries.
    pub dropped: AtomicU64,
    /// Rate-limit responses observed (each one trips a cooldown).
    pub rate_limited: AtomicU64,
}

impl ResolverStats {
    /// Creates a zeroed counter set.
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn incr(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    /// Snapshot of a single counter.
    pub fn get(counter: &AtomicU64) -> u64 {
        counter.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters_start_at_zero() {
        let stats = ResolverStats::new();
        assert_eq!(ResolverStats::get(&stats.cache_hits), 0);
        assert_eq!(ResolverStats::get(&stats.resolved), 0);
        assert_eq!(ResolverStats::get(&stats.dropped), 0);
    }

    #[test]
    fn test_increment_is_visible() {
        let stats = ResolverStats::new();
        ResolverStats::incr(&stats.resolved);
        ResolverStats::incr(&stats.resolved);
        ResolverStats::incr(&stats.queued);
        assert_eq!(ResolverStats::get(&stats.resolved), 2);
        assert_eq!(ResolverStats::get(&stats.queued), 1);
        assert_eq!(ResolverStats::get(&stats.negative), 0);
    }
}
