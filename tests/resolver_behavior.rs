//! End-to-end resolver behaviour through the public API.

mod helpers;

use std::sync::Arc;
use std::time::Duration;

use helpers::{fast_settings, open_resolver, ScriptedLookup};
use wigle_locator::{Outcome, ResolveStatus, ResolverSettings, StateStore};

#[tokio::test]
async fn test_batch_abort_leaves_rest_of_queue_untouched() {
    let dir = tempfile::tempdir().expect("tempdir");
    let lookup = ScriptedLookup::new(vec![
        Outcome::transient_network("offline"),
        Outcome::transient_network("offline"),
        Outcome::transient_network("offline"),
        Outcome::transient_network("offline"),
        Outcome::transient_network("offline"),
        Outcome::Found { lat: 40.7, lon: -74.0 },
        Outcome::Found { lat: 40.8, lon: -74.1 },
        Outcome::RateLimited,
    ]);
    let resolver = open_resolver(dir.path(), fast_settings(), Arc::clone(&lookup));

    // Park five identifiers via transient intake failures.
    for i in 1..=5 {
        let bssid = format!("AA:BB:CC:DD:EE:0{i}");
        let status = resolver.resolve(&bssid, "net").await;
        assert_eq!(status, ResolveStatus::Queued);
    }
    assert_eq!(resolver.queue_depth(), 5);
    assert_eq!(lookup.calls(), 5);

    // Two succeed, the third hits 429: the pass aborts and the remaining
    // three items keep their place and their retry counts.
    let report = resolver.on_connectivity_available().await;
    assert_eq!(report.attempted, 3);
    assert_eq!(report.resolved, 2);
    assert!(report.aborted);
    assert_eq!(lookup.calls(), 8);
    assert_eq!(resolver.queue_depth(), 3);
    assert!(resolver.governor_status().cooldown_active);

    resolver.close();
    let store = StateStore::open(dir.path()).expect("reopen store");
    let remaining = store.load_queue().expect("load queue");
    let bssids: Vec<&str> = remaining.iter().map(|i| i.bssid.as_str()).collect();
    assert_eq!(
        bssids,
        ["AA:BB:CC:DD:EE:03", "AA:BB:CC:DD:EE:04", "AA:BB:CC:DD:EE:05"]
    );
    assert!(remaining.iter().all(|i| i.retry_count == 0));
}

#[tokio::test]
async fn test_item_dropped_after_exhausting_retries() {
    let dir = tempfile::tempdir().expect("tempdir");
    let settings = ResolverSettings {
        max_retries: 2,
        ..fast_settings()
    };
    let lookup = ScriptedLookup::new(vec![
        Outcome::transient_network("refused"),
        Outcome::transient_network("refused"),
        Outcome::transient_network("refused"),
    ]);
    let resolver = open_resolver(dir.path(), settings, Arc::clone(&lookup));

    let status = resolver.resolve("AA:BB:CC:DD:EE:10", "flaky").await;
    assert_eq!(status, ResolveStatus::Queued);

    // First retry fails, item stays with retry_count 1.
    let report = resolver.drain_queue().await;
    assert_eq!(report.attempted, 1);
    assert_eq!(report.dropped, 0);
    assert_eq!(resolver.queue_depth(), 1);

    // Second retry reaches the cap and the item is discarded.
    let report = resolver.drain_queue().await;
    assert_eq!(report.attempted, 1);
    assert_eq!(report.dropped, 1);
    assert_eq!(resolver.queue_depth(), 0);
    assert!(resolver.list_resolved().is_empty());
    assert_eq!(lookup.calls(), 3);
}

#[tokio::test]
async fn test_concurrent_intake_for_same_identifier_calls_once() {
    let dir = tempfile::tempdir().expect("tempdir");
    let lookup = ScriptedLookup::with_delay(
        vec![Outcome::Found { lat: 51.5, lon: -0.1 }],
        Duration::from_millis(200),
    );
    let resolver = open_resolver(dir.path(), fast_settings(), Arc::clone(&lookup));

    let first = {
        let resolver = Arc::clone(&resolver);
        tokio::spawn(async move { resolver.resolve("AA:BB:CC:DD:EE:20", "cafe").await })
    };
    tokio::time::sleep(Duration::from_millis(50)).await;

    // The direct attempt is still in flight; the duplicate must not add a
    // second call or a queue entry.
    let second = resolver.resolve("AA:BB:CC:DD:EE:20", "cafe").await;
    assert_eq!(second, ResolveStatus::Pending);

    assert_eq!(first.await.expect("join"), ResolveStatus::Resolved);
    assert_eq!(lookup.calls(), 1);
    assert_eq!(resolver.queue_depth(), 0);
    assert_eq!(resolver.list_resolved().len(), 1);
}

#[tokio::test]
async fn test_flush_lifts_cooldown_for_new_lookups() {
    let dir = tempfile::tempdir().expect("tempdir");
    let lookup = ScriptedLookup::new(vec![
        Outcome::RateLimited,
        Outcome::Found { lat: 48.8, lon: 2.3 },
    ]);
    let resolver = open_resolver(dir.path(), fast_settings(), Arc::clone(&lookup));

    let status = resolver.resolve("AA:BB:CC:DD:EE:30", "limited").await;
    assert_eq!(status, ResolveStatus::Queued);
    assert!(resolver.governor_status().cooldown_active);
    assert!(resolver.drain_queue().await.skipped);

    let token = resolver.session_token();
    assert_eq!(resolver.flush(&token), Ok(1));
    assert!(!resolver.governor_status().cooldown_active);

    let status = resolver.resolve("AA:BB:CC:DD:EE:31", "fresh").await;
    assert_eq!(status, ResolveStatus::Resolved);
    assert_eq!(lookup.calls(), 2);
}
