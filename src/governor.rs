//! Rate-limit governor.
//!
//! Global gate for all outbound lookups. Two states:
//!
//! - **Normal**: requests allowed while the daily counter is under the limit.
//! - **Cooldown**: entered on any rate-limited response, exited lazily the
//!   first time a caller evaluates the governor after `cooldown_until`.
//!
//! The cooldown is deliberately long (default 24h): the upstream limit is a
//! daily quota, not a burst limiter, so a short backoff would only spend the
//! remaining quota into the same wall. The daily counter also rolls over on
//! its own at midnight UTC, independent of cooldown events.
//!
//! The governor itself is not synchronized; the resolver mutates it under the
//! same lock as the cache and queue so two callers can never both observe
//! "allowed" across a quota boundary by more than one in-flight request.

use chrono::{DateTime, Duration as ChronoDuration, NaiveTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Persisted governor state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GovernorState {
    /// Whether a cooldown is in force.
    pub cooldown_active: bool,
    /// When the current cooldown ends; meaningful only while active.
    pub cooldown_until: Option<DateTime<Utc>>,
    /// Lookups issued since the last rollover.
    pub daily_request_count: u32,
    /// When the daily counter next resets.
    pub daily_counter_reset_at: DateTime<Utc>,
}

impl GovernorState {
    /// Fresh state with a zero counter rolling over at the next UTC midnight.
    pub fn initial(now: DateTime<Utc>) -> Self {
        Self {
            cooldown_active: false,
            cooldown_until: None,
            daily_request_count: 0,
            daily_counter_reset_at: next_daily_reset(now),
        }
    }
}

/// Point-in-time governor summary for the query surface.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GovernorStatus {
    /// Whether a cooldown is in force.
    pub cooldown_active: bool,
    /// Whole minutes until the cooldown lifts (0 when not in cooldown).
    pub minutes_remaining: i64,
    /// Lookups issued since the last rollover.
    pub daily_count: u32,
    /// The configured daily quota.
    pub daily_limit: u32,
}

/// The governor state machine.
pub struct RateGovernor {
    state: GovernorState,
    daily_limit: u32,
    cooldown: ChronoDuration,
}

impl RateGovernor {
    /// Creates a governor with fresh state.
    pub fn new(daily_limit: u32, cooldown: Duration, now: DateTime<Utc>) -> Self {
        Self::from_state(GovernorState::initial(now), daily_limit, cooldown)
    }

    /// Restores a governor from persisted state.
    pub fn from_state(state: GovernorState, daily_limit: u32, cooldown: Duration) -> Self {
        Self {
            state,
            daily_limit,
            cooldown: ChronoDuration::seconds(cooldown.as_secs() as i64),
        }
    }

    /// Applies lazy state transitions: cooldown expiry and daily rollover.
    ///
    /// Called at the top of every governor evaluation. Returns `true` if the
    /// state changed, so the caller can mark it for persistence. Rollover
    /// always schedules the *next* boundary from `now`, so a counter is reset
    /// exactly once per boundary even after long offline gaps.
    pub fn tick(&mut self, now: DateTime<Utc>) -> bool {
        let mut changed = false;

        if self.state.cooldown_active {
            let expired = match self.state.cooldown_until {
                Some(until) => now > until,
                None => true,
            };
            if expired {
                self.state.cooldown_active = false;
                self.state.cooldown_until = None;
                self.state.daily_request_count = 0;
                self.state.daily_counter_reset_at = next_daily_reset(now);
                changed = true;
            }
        }

        if now >= self.state.daily_counter_reset_at {
            self.state.daily_request_count = 0;
            self.state.daily_counter_reset_at = next_daily_reset(now);
            changed = true;
        }

        changed
    }

    /// Whether an outbound lookup may be issued right now.
    pub fn allow(&self, now: DateTime<Utc>) -> bool {
        if self.state.cooldown_active {
            if let Some(until) = self.state.cooldown_until {
                if now < until {
                    return false;
                }
            }
        }
        self.state.daily_request_count < self.daily_limit
    }

    /// Counts one call against the daily quota.
    ///
    /// Invoked for every call that reached the API, before the body is
    /// interpreted: a permanent miss or even a 429 still spent quota.
    pub fn record_request(&mut self, _now: DateTime<Utc>) {
        self.state.daily_request_count = self.state.daily_request_count.saturating_add(1);
    }

    /// Enters cooldown in response to a rate-limited outcome.
    pub fn trip_cooldown(&mut self, now: DateTime<Utc>) {
        self.state.cooldown_active = true;
        self.state.cooldown_until = Some(now + self.cooldown);
        log::warn!(
            "rate limited upstream; entering cooldown until {}",
            now + self.cooldown
        );
    }

    /// Administrative override: clears cooldown and zeroes the counter.
    pub fn reset(&mut self, now: DateTime<Utc>) {
        self.state.cooldown_active = false;
        self.state.cooldown_until = None;
        self.state.daily_request_count = 0;
        self.state.daily_counter_reset_at = next_daily_reset(now);
    }

    /// Snapshot for the query surface.
    pub fn status(&self, now: DateTime<Utc>) -> GovernorStatus {
        let minutes_remaining = match (self.state.cooldown_active, self.state.cooldown_until) {
            (true, Some(until)) => (until - now).num_minutes().max(0),
            _ => 0,
        };
        GovernorStatus {
            cooldown_active: self.state.cooldown_active,
            minutes_remaining,
            daily_count: self.state.daily_request_count,
            daily_limit: self.daily_limit,
        }
    }

    /// The persisted form of the current state.
    pub fn state(&self) -> &GovernorState {
        &self.state
    }
}

/// The next UTC midnight strictly after `now`.
fn next_daily_reset(now: DateTime<Utc>) -> DateTime<Utc> {
    let tomorrow = now.date_naive().succ_opt().unwrap_or_else(|| now.date_naive());
    Utc.from_utc_datetime(&tomorrow.and_time(NaiveTime::MIN))
}
