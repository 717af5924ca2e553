//! Resolved-location cache.
//!
//! Durable key→location store. Records are immutable once written: they are
//! only ever replaced (re-resolution after TTL expiry) or evicted (size cap).
//! A record with no coordinates is a *permanent negative* (upstream confirmed
//! there is no data), which is distinct from an identifier that was never
//! attempted.

use std::collections::HashMap;
use std::time::Duration;

use chrono::{DateTime, Duration as ChronoDuration, Utc};
use serde::{Deserialize, Serialize};

/// One resolved (or permanently unresolvable) identifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationRecord {
    /// The network BSSID in canonical form.
    pub bssid: String,
    /// Display name (ESSID) observed alongside the BSSID.
    pub ssid: String,
    /// Latitude; `None` marks a confirmed permanent miss.
    pub lat: Option<f64>,
    /// Longitude; `None` marks a confirmed permanent miss.
    pub lon: Option<f64>,
    /// When the lookup completed.
    pub resolved_at: DateTime<Utc>,
}

impl LocationRecord {
    /// Record for a successful lookup.
    pub fn located(
        bssid: impl Into<String>,
        ssid: impl Into<String>,
        lat: f64,
        lon: f64,
        resolved_at: DateTime<Utc>,
    ) -> Self {
        Self {
            bssid: bssid.into(),
            ssid: ssid.into(),
            lat: Some(lat),
            lon: Some(lon),
            resolved_at,
        }
    }

    /// Record for a confirmed permanent miss, cached so it is never retried.
    pub fn negative(
        bssid: impl Into<String>,
        ssid: impl Into<String>,
        resolved_at: DateTime<Utc>,
    ) -> Self {
        Self {
            bssid: bssid.into(),
            ssid: ssid.into(),
            lat: None,
            lon: None,
            resolved_at,
        }
    }

    /// Whether this record is a permanent negative.
    pub fn is_negative(&self) -> bool {
        self.lat.is_none() || self.lon.is_none()
    }
}

/// In-memory view of the resolved store, TTL-aware and size-bounded.
pub struct ResolvedCache {
    records: HashMap<String, LocationRecord>,
    max_entries: usize,
    ttl: ChronoDuration,
}

impl ResolvedCache {
    /// Creates an empty cache.
    pub fn new(max_entries: usize, ttl: Duration) -> Self {
        Self {
            records: HashMap::new(),
            max_entries,
            ttl: ChronoDuration::seconds(ttl.as_secs() as i64),
        }
    }

    /// Rebuilds a cache from persisted records.
    ///
    /// Entries past the TTL are dropped before becoming visible to lookups;
    /// the cap is then enforced on what remains.
    pub fn from_records(
        records: Vec<LocationRecord>,
        max_entries: usize,
        ttl: Duration,
        now: DateTime<Utc>,
    ) -> Self {
        let mut cache = Self::new(max_entries, ttl);
        let total = records.len();
        for record in records {
            if now - record.resolved_at <= cache.ttl {
                cache.insert(record);
            }
        }
        let dropped = total - cache.records.len();
        if dropped > 0 {
            log::info!("dropped {dropped} expired cache records on load");
        }
        cache
    }

    /// Returns the record for `bssid` if present and unexpired.
    ///
    /// An expired record is treated as a miss so a fresh resolve replaces it.
    pub fn get(&self, bssid: &str, now: DateTime<Utc>) -> Option<&LocationRecord> {
        self.records
            .get(bssid)
            .filter(|record| now - record.resolved_at <= self.ttl)
    }

    /// Inserts (or replaces) a record, evicting the oldest over the cap.
    pub fn insert(&mut self, record: LocationRecord) {
        self.records.insert(record.bssid.clone(), record);
        while self.records.len() > self.max_entries {
            let oldest = self
                .records
                .values()
                .min_by_key(|r| r.resolved_at)
                .map(|r| r.bssid.clone());
            match oldest {
                Some(bssid) => {
                    self.records.remove(&bssid);
                }
                None => break,
            }
        }
    }

    /// Number of records held, expired ones included.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the cache holds no records at all.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// All unexpired records, newest first.
    pub fn list(&self, now: DateTime<Utc>) -> Vec<LocationRecord> {
        let mut records: Vec<LocationRecord> = self
            .records
            .values()
            .filter(|record| now - record.resolved_at <= self.ttl)
            .cloned()
            .collect();
        records.sort_by(|a, b| b.resolved_at.cmp(&a.resolved_at));
        records
    }

    /// Everything currently held, for persistence.
    pub fn snapshot(&self) -> Vec<LocationRecord> {
        self.records.values().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DAY: Duration = Duration::from_secs(24 * 60 * 60);

    fn ttl_30d() -> Duration {
        Duration::from_secs(30 * 24 * 60 * 60)
    }

    #[test]
    fn test_hit_and_miss() {
        let now = Utc::now();
        let mut cache = ResolvedCache::new(10, ttl_30d());
        cache.insert(LocationRecord::located(
            "AA:BB:CC:DD:EE:FF",
            "cafe-wifi",
            51.5,
            -0.1,
            now,
        ));

        let hit = cache.get("AA:BB:CC:DD:EE:FF", now).expect("cached record");
        assert_eq!(hit.lat, Some(51.5));
        assert!(!hit.is_negative());
        assert!(cache.get("00:11:22:33:44:55", now).is_none());
    }

    #[test]
    fn test_negative_record_is_a_hit() {
        let now = Utc::now();
        let mut cache = ResolvedCache::new(10, ttl_30d());
        cache.insert(LocationRecord::negative("AA:BB:CC:DD:EE:01", "ghost", now));

        let hit = cache.get("AA:BB:CC:DD:EE:01", now).expect("negative cached");
        assert!(hit.is_negative());
    }

    #[test]
    fn test_expired_record_is_a_miss() {
        let now = Utc::now();
        let mut cache = ResolvedCache::new(10, ttl_30d());
        let old = now - ChronoDuration::days(31);
        cache.insert(LocationRecord::located(
            "AA:BB:CC:DD:EE:02",
            "old",
            1.0,
            2.0,
            old,
        ));

        assert!(cache.get("AA:BB:CC:DD:EE:02", now).is_none());
        // Still held until replaced or reloaded, just invisible to lookups.
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_expired_records_dropped_on_load() {
        let now = Utc::now();
        let records = vec![
            LocationRecord::located("AA:00:00:00:00:01", "fresh", 1.0, 1.0, now - ChronoDuration::days(1)),
            LocationRecord::located("AA:00:00:00:00:02", "stale", 2.0, 2.0, now - ChronoDuration::days(45)),
        ];
        let cache = ResolvedCache::from_records(records, 10, ttl_30d(), now);
        assert_eq!(cache.len(), 1);
        assert!(cache.get("AA:00:00:00:00:01", now).is_some());
        assert!(cache.get("AA:00:00:00:00:02", now).is_none());
    }

    #[test]
    fn test_eviction_removes_oldest_resolved_at() {
        let now = Utc::now();
        let mut cache = ResolvedCache::new(2, ttl_30d());
        cache.insert(LocationRecord::located(
            "AA:00:00:00:00:01",
            "oldest",
            1.0,
            1.0,
            now - ChronoDuration::seconds(20),
        ));
        cache.insert(LocationRecord::located(
            "AA:00:00:00:00:02",
            "middle",
            2.0,
            2.0,
            now - ChronoDuration::seconds(10),
        ));
        cache.insert(LocationRecord::located(
            "AA:00:00:00:00:03",
            "newest",
            3.0,
            3.0,
            now,
        ));

        assert_eq!(cache.len(), 2);
        assert!(cache.get("AA:00:00:00:00:01", now).is_none());
        assert!(cache.get("AA:00:00:00:00:02", now).is_some());
        assert!(cache.get("AA:00:00:00:00:03", now).is_some());
    }

    #[test]
    fn test_list_is_newest_first_and_skips_expired() {
        let now = Utc::now();
        let mut cache = ResolvedCache::new(10, Duration::from_secs(10 * DAY.as_secs()));
        cache.insert(LocationRecord::located(
            "AA:00:00:00:00:01",
            "older",
            1.0,
            1.0,
            now - ChronoDuration::days(2),
        ));
        cache.insert(LocationRecord::located(
            "AA:00:00:00:00:02",
            "newer",
            2.0,
            2.0,
            now - ChronoDuration::days(1),
        ));
        cache.insert(LocationRecord::located(
            "AA:00:00:00:00:03",
            "expired",
            3.0,
            3.0,
            now - ChronoDuration::days(20),
        ));

        let listed = cache.list(now);
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].bssid, "AA:00:00:00:00:02");
        assert_eq!(listed[1].bssid, "AA:00:00:00:00:01");
    }

    #[test]
    fn test_replacement_keeps_single_record() {
        let now = Utc::now();
        let mut cache = ResolvedCache::new(10, ttl_30d());
        cache.insert(LocationRecord::negative("AA:BB:CC:DD:EE:FF", "net", now));
        cache.insert(LocationRecord::located(
            "AA:BB:CC:DD:EE:FF",
            "net",
            51.5,
            -0.1,
            now,
        ));
        assert_eq!(cache.len(), 1);
        assert!(!cache
            .get("AA:BB:CC:DD:EE:FF", now)
            .expect("record present")
            .is_negative());
    }
}
