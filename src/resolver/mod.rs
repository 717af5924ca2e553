//! Resolution engine.
//!
//! Orchestrates intake, cache checks, governor checks, queue management, and
//! batch draining. Two levels on purpose:
//!
//! - **Direct attempt on intake** gives low latency for the common case
//!   (online, no quota pressure).
//! - **Periodic batch drain** gives eventual resolution and bounded resource
//!   use while offline or under load.
//!
//! All cache/queue/governor mutation happens under one coarse mutex; lookups
//! are I/O bound so contention is negligible. HTTP calls are made outside the
//! lock, with an in-flight set keeping intake idempotent while a direct
//! attempt is outstanding. Every mutating operation finishes by flushing the
//! dirty stores, so a crash recovers to the last persisted state.

mod worker;

pub use worker::start_background_worker;

use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use rand::{distr::Alphanumeric, Rng};
use subtle::ConstantTimeEq;

use crate::cache::{LocationRecord, ResolvedCache};
use crate::config::{ResolverSettings, SESSION_TOKEN_LEN};
use crate::error_handling::{FlushError, ResolverStats};
use crate::governor::{GovernorState, GovernorStatus, RateGovernor};
use crate::lookup::{LocationLookup, Outcome};
use crate::persistence::StateStore;
use crate::queue::{QueueItem, RetryQueue};

/// What happened to one intake candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolveStatus {
    /// Answered from the cache, no I/O.
    CacheHit,
    /// Looked up now and cached with coordinates.
    Resolved,
    /// Looked up now; upstream confirmed no data. Cached, never retried.
    PermanentMiss,
    /// Parked in the retry queue (governor denied, rate limited, or the
    /// attempt failed transiently).
    Queued,
    /// Already queued, or a direct attempt for it is in flight.
    Pending,
}

/// Summary of one drain pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DrainReport {
    /// Lookup calls issued during the pass.
    pub attempted: usize,
    /// Items resolved with coordinates.
    pub resolved: usize,
    /// Items cached as permanent misses.
    pub negative: usize,
    /// Items discarded after exhausting their retries.
    pub dropped: usize,
    /// Whether the pass stopped early on a governor denial or rate limit.
    pub aborted: bool,
    /// Whether the pass never started (governor denied, or a drain was
    /// already running).
    pub skipped: bool,
}

#[derive(Debug, Default)]
struct DirtyFlags {
    cache: bool,
    queue: bool,
    governor: bool,
}

struct ResolverState {
    cache: ResolvedCache,
    queue: RetryQueue,
    governor: RateGovernor,
    in_flight: HashSet<String>,
    draining: bool,
    dirty: DirtyFlags,
}

/// The external-lookup resolution engine.
///
/// One instance per process, constructed with [`Resolver::open`], shared by
/// reference (`Arc`) between intake tasks, the drain worker, and the status
/// server. [`Resolver::close`] flushes state before exit.
pub struct Resolver {
    state: Mutex<ResolverState>,
    lookup: Arc<dyn LocationLookup>,
    store: StateStore,
    settings: ResolverSettings,
    stats: ResolverStats,
    session_token: Mutex<String>,
}

impl Resolver {
    /// Opens the resolver, restoring cache, queue, and governor state.
    ///
    /// Each store loads independently: an unreadable queue file starts the
    /// queue empty without touching the cache, and vice versa. Cache entries
    /// past the TTL are dropped before becoming visible.
    pub fn open(
        settings: ResolverSettings,
        lookup: Arc<dyn LocationLookup>,
        store: StateStore,
    ) -> Self {
        let now = Utc::now();

        let records = store.load_cache().unwrap_or_else(|e| {
            log::warn!("resolved cache unreadable, starting empty: {e}");
            Vec::new()
        });
        let items = store.load_queue().unwrap_or_else(|e| {
            log::warn!("pending queue unreadable, starting empty: {e}");
            Vec::new()
        });
        let governor_state = store
            .load_governor()
            .unwrap_or_else(|e| {
                log::warn!("governor state unreadable, starting fresh: {e}");
                None
            })
            .unwrap_or_else(|| GovernorState::initial(now));

        let cache =
            ResolvedCache::from_records(records, settings.cache_cap, settings.cache_ttl, now);
        let queue = RetryQueue::from_items(items, settings.queue_cap);
        let governor =
            RateGovernor::from_state(governor_state, settings.daily_limit, settings.cooldown);

        let token = generate_session_token();
        log::info!(
            "resolver ready: {} cached, {} pending; flush token for this session: {token}",
            cache.len(),
            queue.len()
        );

        Self {
            state: Mutex::new(ResolverState {
                cache,
                queue,
                governor,
                in_flight: HashSet::new(),
                draining: false,
                dirty: DirtyFlags::default(),
            }),
            lookup,
            store,
            settings,
            stats: ResolverStats::new(),
            session_token: Mutex::new(token),
        }
    }

    /// Intake entry point: fire-and-forget resolution of one candidate.
    ///
    /// The capture pipeline observes no return value; failures are logged and
    /// absorbed here.
    pub async fn on_candidate(&self, bssid: &str, ssid: &str) {
        let status = self.resolve(bssid, ssid).await;
        log::debug!("candidate {ssid} ({bssid}): {status:?}");
    }

    /// Resolves one identifier, idempotently.
    ///
    /// Cache hit and already-pending paths return without I/O. A governor
    /// denial parks the item. Otherwise one direct lookup is attempted and
    /// the outcome applied: success and permanent misses are cached, rate
    /// limits trip the cooldown and park the item, transient failures park it
    /// with a zero retry count.
    pub async fn resolve(&self, bssid: &str, ssid: &str) -> ResolveStatus {
        let now = Utc::now();
        {
            let mut state = self.lock_state();
            if state.governor.tick(now) {
                state.dirty.governor = true;
            }
            if state.cache.get(bssid, now).is_some() {
                ResolverStats::incr(&self.stats.cache_hits);
                return ResolveStatus::CacheHit;
            }
            if state.queue.contains(bssid) || state.in_flight.contains(bssid) {
                return ResolveStatus::Pending;
            }
            if !state.governor.allow(now) {
                self.park(&mut state, bssid, ssid, now);
                drop(state);
                self.persist_dirty();
                return ResolveStatus::Queued;
            }
            state.in_flight.insert(bssid.to_string());
        }

        // The call happens outside the lock so a slow network never blocks
        // other intake; the in_flight entry keeps this identifier idempotent
        // meanwhile.
        let outcome = self.lookup.fetch(bssid).await;

        let status = {
            let now = Utc::now();
            let mut state = self.lock_state();
            state.in_flight.remove(bssid);
            match outcome {
                Outcome::Found { lat, lon } => {
                    self.record_located(&mut state, bssid, ssid, lat, lon, now);
                    ResolveStatus::Resolved
                }
                Outcome::NotFound => {
                    self.record_permanent_miss(&mut state, bssid, ssid, now, false);
                    ResolveStatus::PermanentMiss
                }
                Outcome::AuthError => {
                    self.record_permanent_miss(&mut state, bssid, ssid, now, true);
                    ResolveStatus::PermanentMiss
                }
                Outcome::RateLimited => {
                    self.record_rate_limited(&mut state, now);
                    self.park(&mut state, bssid, ssid, now);
                    ResolveStatus::Queued
                }
                Outcome::Transient {
                    reason,
                    reached_upstream,
                } => {
                    if reached_upstream {
                        // A completed response spent quota even though the
                        // body was unusable.
                        state.governor.record_request(now);
                        state.dirty.governor = true;
                    }
                    ResolverStats::incr(&self.stats.transient_errors);
                    log::debug!("lookup for {bssid} failed transiently: {reason}");
                    self.park(&mut state, bssid, ssid, now);
                    ResolveStatus::Queued
                }
            }
        };
        self.persist_dirty();
        status
    }

    /// Connectivity tick from the host: drains the queue once.
    pub async fn on_connectivity_available(&self) -> DrainReport {
        self.drain_queue().await
    }

    /// Drains up to one batch of pending items, oldest first.
    ///
    /// At most one drain runs at a time; a second trigger while one is in
    /// progress is a silent no-op. The governor is re-evaluated before every
    /// call so a mid-batch cooldown stops the pass immediately, leaving the
    /// rest of the queue untouched. A rate-limited response aborts the rest
    /// of the batch rather than spending requests into a closing window.
    pub async fn drain_queue(&self) -> DrainReport {
        let mut report = DrainReport::default();

        let batch = {
            let now = Utc::now();
            let mut state = self.lock_state();
            if state.governor.tick(now) {
                state.dirty.governor = true;
            }
            if state.draining || !state.governor.allow(now) {
                report.skipped = true;
                return report;
            }
            state.draining = true;
            state.queue.peek_batch(self.settings.max_batch_size)
        };

        for item in &batch {
            {
                let now = Utc::now();
                let mut state = self.lock_state();
                if state.governor.tick(now) {
                    state.dirty.governor = true;
                }
                // State may have changed mid-batch.
                if !state.governor.allow(now) {
                    report.aborted = true;
                    break;
                }
                if state.cache.get(&item.bssid, now).is_some() {
                    // Resolved by a concurrent intake since the snapshot.
                    if state.queue.remove(&item.bssid) {
                        state.dirty.queue = true;
                    }
                    continue;
                }
                state.in_flight.insert(item.bssid.clone());
            }

            tokio::time::sleep(self.settings.inter_request_delay).await;
            let outcome = self.lookup.fetch(&item.bssid).await;
            report.attempted += 1;

            let abort = {
                let now = Utc::now();
                let mut state = self.lock_state();
                state.in_flight.remove(&item.bssid);
                match outcome {
                    Outcome::Found { lat, lon } => {
                        self.record_located(&mut state, &item.bssid, &item.ssid, lat, lon, now);
                        report.resolved += 1;
                        false
                    }
                    Outcome::NotFound => {
                        self.record_permanent_miss(&mut state, &item.bssid, &item.ssid, now, false);
                        report.negative += 1;
                        false
                    }
                    Outcome::AuthError => {
                        self.record_permanent_miss(&mut state, &item.bssid, &item.ssid, now, true);
                        report.negative += 1;
                        false
                    }
                    Outcome::RateLimited => {
                        // Item stays queued untouched.
                        self.record_rate_limited(&mut state, now);
                        true
                    }
                    Outcome::Transient {
                        reason,
                        reached_upstream,
                    } => {
                        if reached_upstream {
                            state.governor.record_request(now);
                            state.dirty.governor = true;
                        }
                        ResolverStats::incr(&self.stats.transient_errors);
                        log::debug!("retry for {} failed transiently: {reason}", item.bssid);
                        if let Some(count) = state.queue.increment_retry(&item.bssid) {
                            if count >= self.settings.max_retries {
                                state.queue.remove(&item.bssid);
                                ResolverStats::incr(&self.stats.dropped);
                                report.dropped += 1;
                                log::warn!(
                                    "giving up on {} after {count} transient failures",
                                    item.bssid
                                );
                            }
                        }
                        state.dirty.queue = true;
                        false
                    }
                }
            };
            if abort {
                report.aborted = true;
                break;
            }
        }

        {
            let mut state = self.lock_state();
            state.draining = false;
        }
        self.persist_dirty();

        if report.attempted > 0 {
            log::info!(
                "drain pass: {} attempted, {} resolved, {} negative, {} dropped{}",
                report.attempted,
                report.resolved,
                report.negative,
                report.dropped,
                if report.aborted { " (aborted)" } else { "" }
            );
        }
        report
    }

    /// All unexpired resolved records, newest first.
    pub fn list_resolved(&self) -> Vec<LocationRecord> {
        let now = Utc::now();
        self.lock_state().cache.list(now)
    }

    /// Number of identifiers waiting in the retry queue.
    pub fn queue_depth(&self) -> usize {
        self.lock_state().queue.len()
    }

    /// Point-in-time governor summary.
    pub fn governor_status(&self) -> GovernorStatus {
        let now = Utc::now();
        let mut state = self.lock_state();
        if state.governor.tick(now) {
            state.dirty.governor = true;
        }
        state.governor.status(now)
    }

    /// Session counters.
    pub fn stats(&self) -> &ResolverStats {
        &self.stats
    }

    /// The current single-session flush token.
    ///
    /// Generated at startup, logged once, and rotated after every successful
    /// flush. The owner hands it to whoever operates the admin endpoint.
    pub fn session_token(&self) -> String {
        self.lock_token().clone()
    }

    /// Administrative override: empties the queue, lifts the cooldown, and
    /// zeroes the daily counter in one step.
    ///
    /// The token comparison is constant-time, and a matched token is consumed:
    /// a fresh one is generated and logged. Returns how many queued items
    /// were removed.
    pub fn flush(&self, token: &str) -> Result<usize, FlushError> {
        {
            let mut session = self.lock_token();
            let supplied = token.as_bytes();
            let expected = session.as_bytes();
            let matched =
                supplied.len() == expected.len() && bool::from(supplied.ct_eq(expected));
            if !matched {
                log::warn!("flush rejected: session token mismatch");
                return Err(FlushError::InvalidToken);
            }
            *session = generate_session_token();
            log::info!("flush accepted; next session token: {session}");
        }

        let removed = {
            let now = Utc::now();
            let mut state = self.lock_state();
            let removed = state.queue.clear();
            state.governor.reset(now);
            state.dirty.queue = true;
            state.dirty.governor = true;
            removed
        };
        self.persist_dirty();
        log::info!("flush cleared {removed} queued items and reset the governor");
        Ok(removed)
    }

    /// Flushes all state to disk. Called once on shutdown.
    pub fn close(&self) {
        {
            let mut state = self.lock_state();
            state.dirty = DirtyFlags {
                cache: true,
                queue: true,
                governor: true,
            };
        }
        self.persist_dirty();
        log::debug!("resolver state flushed on shutdown");
    }

    fn lock_state(&self) -> MutexGuard<'_, ResolverState> {
        self.state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn lock_token(&self) -> MutexGuard<'_, String> {
        self.session_token
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn park(&self, state: &mut ResolverState, bssid: &str, ssid: &str, now: DateTime<Utc>) {
        if state.queue.enqueue(QueueItem::new(bssid, ssid, now)) {
            state.dirty.queue = true;
            ResolverStats::incr(&self.stats.queued);
            log::debug!("parked {ssid} ({bssid}) in the retry queue");
        }
    }

    fn record_located(
        &self,
        state: &mut ResolverState,
        bssid: &str,
        ssid: &str,
        lat: f64,
        lon: f64,
        now: DateTime<Utc>,
    ) {
        state.governor.record_request(now);
        state.cache.insert(LocationRecord::located(bssid, ssid, lat, lon, now));
        if state.queue.remove(bssid) {
            state.dirty.queue = true;
        }
        state.dirty.cache = true;
        state.dirty.governor = true;
        ResolverStats::incr(&self.stats.resolved);
        log::info!("located {ssid} ({bssid}): {lat}, {lon}");
    }

    fn record_permanent_miss(
        &self,
        state: &mut ResolverState,
        bssid: &str,
        ssid: &str,
        now: DateTime<Utc>,
        auth_rejected: bool,
    ) {
        state.governor.record_request(now);
        state.cache.insert(LocationRecord::negative(bssid, ssid, now));
        if state.queue.remove(bssid) {
            state.dirty.queue = true;
        }
        state.dirty.cache = true;
        state.dirty.governor = true;
        ResolverStats::incr(&self.stats.negative);
        if auth_rejected {
            log::error!(
                "credential rejected while looking up {bssid}; every future lookup will likely fail"
            );
        } else {
            log::debug!("no upstream data for {ssid} ({bssid}); cached as permanent miss");
        }
    }

    fn record_rate_limited(&self, state: &mut ResolverState, now: DateTime<Utc>) {
        state.governor.record_request(now);
        state.governor.trip_cooldown(now);
        state.dirty.governor = true;
        ResolverStats::incr(&self.stats.rate_limited);
    }

    /// Writes dirty stores outside the state lock.
    ///
    /// A failed write re-arms the dirty flag so the next flush retries; the
    /// in-memory state stays authoritative.
    fn persist_dirty(&self) {
        let (cache, queue, governor) = {
            let mut state = self.lock_state();
            let cache = state.dirty.cache.then(|| state.cache.snapshot());
            let queue = state.dirty.queue.then(|| state.queue.snapshot());
            let governor = state.dirty.governor.then(|| state.governor.state().clone());
            state.dirty = DirtyFlags::default();
            (cache, queue, governor)
        };

        if let Some(records) = cache {
            if let Err(e) = self.store.save_cache(&records) {
                log::warn!("failed to persist resolved cache, will retry: {e}");
                self.lock_state().dirty.cache = true;
            }
        }
        if let Some(items) = queue {
            if let Err(e) = self.store.save_queue(&items) {
                log::warn!("failed to persist pending queue, will retry: {e}");
                self.lock_state().dirty.queue = true;
            }
        }
        if let Some(state) = governor {
            if let Err(e) = self.store.save_governor(&state) {
                log::warn!("failed to persist governor state, will retry: {e}");
                self.lock_state().dirty.governor = true;
            }
        }
    }
}

fn generate_session_token() -> String {
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(SESSION_TOKEN_LEN)
        .map(char::from)
        .collect()
}
